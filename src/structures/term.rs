/*!
(The representation of) terms.

A term is either a constant, a compound of a functor applied to argument terms, or a variable.
Terms are immutable --- substitution builds fresh terms.

Variables take one of two forms, reflecting their use during resolution:

- [Var](Term::Var), an index into the slots of a [Bindings](crate::structures::bindings::Bindings).
  These appear in database patterns (clause heads, call arguments) and are only meaningful relative to an activation of the enclosing clause.
- [Unset](Term::Unset), an unbound value passed from some other scope.
  An unset value carries no identity, and the engine does not support unifying two unset values.

Functors and symbolic constants are interned.
Float constants are wrapped so terms may be used as hash keys.

# Example
```rust
# use burrow::structures::term::Term;
let t = Term::compound("f", vec![Term::int(1), Term::var(0)]);
assert_eq!(t.to_string(), "f(1,_0)");
assert!(!t.is_ground());
```
*/

use std::fmt;
use std::rc::Rc;

use total_float_wrap::TotalF64;

/// An interned string, used for functors and symbolic constants.
pub use string_cache::DefaultAtom as IString;

use crate::types::err::ValueError;

/// The payload of a constant term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    /// An integer constant.
    Integer(i64),

    /// A float constant, wrapped for hashing.
    Float(TotalF64),

    /// A symbolic constant, e.g. `ok` or `red`.
    Symbol(IString),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", x.0),
            Value::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// A term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    /// An atomic constant.
    Constant(Value),

    /// A functor applied to arguments.
    Compound(IString, Rc<[Term]>),

    /// A variable slot index, relative to some clause activation.
    Var(usize),

    /// An unbound value passed from another scope.
    Unset,
}

/// The functor/arity pair identifying a predicate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    /// The functor.
    pub functor: IString,

    /// The number of arguments.
    pub arity: usize,
}

impl Signature {
    pub fn new(functor: &str, arity: usize) -> Self {
        Signature {
            functor: IString::from(functor),
            arity,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.functor, self.arity)
    }
}

/// The numeric value of a term, for `is` and the comparison builtins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(x) => x,
        }
    }

    /// Numeric equality, comparing across integer/float representations.
    pub fn eq_value(self, other: Number) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }

    /// Numeric ordering, comparing across integer/float representations.
    pub fn cmp_value(self, other: Number) -> std::cmp::Ordering {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a.cmp(&b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl From<Number> for Term {
    fn from(n: Number) -> Term {
        match n {
            Number::Integer(i) => Term::int(i),
            Number::Float(x) => Term::float(x),
        }
    }
}

impl Term {
    /// An integer constant.
    pub fn int(i: i64) -> Term {
        Term::Constant(Value::Integer(i))
    }

    /// A float constant.
    pub fn float(x: f64) -> Term {
        Term::Constant(Value::Float(TotalF64::from(x)))
    }

    /// A symbolic constant.
    pub fn symbol(s: &str) -> Term {
        Term::Constant(Value::Symbol(IString::from(s)))
    }

    /// A compound term.
    pub fn compound(functor: &str, args: Vec<Term>) -> Term {
        Term::Compound(IString::from(functor), Rc::from(args))
    }

    /// A variable slot index.
    pub fn var(i: usize) -> Term {
        Term::Var(i)
    }

    /// Whether the term is a variable, in either form.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Var(_) | Term::Unset)
    }

    /// Whether the term contains no variables, recursively.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Constant(_) => true,
            Term::Compound(_, args) => args.iter().all(Term::is_ground),
            Term::Var(_) | Term::Unset => false,
        }
    }

    /// The functor/arity signature of the term, if it has one.
    ///
    /// A symbolic constant is identified with the corresponding nullary predicate.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Term::Compound(functor, args) => Some(Signature {
                functor: functor.clone(),
                arity: args.len(),
            }),
            Term::Constant(Value::Symbol(s)) => Some(Signature {
                functor: s.clone(),
                arity: 0,
            }),
            _ => None,
        }
    }

    /// The arguments of the term.
    pub fn args(&self) -> &[Term] {
        match self {
            Term::Compound(_, args) => args,
            _ => &[],
        }
    }

    /// The term with its arguments replaced.
    ///
    /// A symbolic constant given arguments becomes the corresponding compound.
    pub fn with_args(&self, args: Vec<Term>) -> Term {
        if args.is_empty() {
            return self.clone();
        }
        match self {
            Term::Compound(functor, _) => Term::Compound(functor.clone(), Rc::from(args)),
            Term::Constant(Value::Symbol(s)) => Term::Compound(s.clone(), Rc::from(args)),
            other => other.clone(),
        }
    }

    /// The numeric value of the term.
    ///
    /// Defined for numeric constants and for the arithmetic compounds `+`, `-`, `*`, `/` (binary) and `-` (unary).
    /// Anything else is an error, which the engine surfaces as a program error.
    pub fn value(&self) -> Result<Number, ValueError> {
        match self {
            Term::Constant(Value::Integer(i)) => Ok(Number::Integer(*i)),

            Term::Constant(Value::Float(x)) => Ok(Number::Float(x.0)),

            Term::Constant(Value::Symbol(_)) => Err(ValueError::NonNumeric),

            Term::Compound(functor, args) => match (&**functor, args.len()) {
                ("-", 1) => match args[0].value()? {
                    Number::Integer(i) => Ok(Number::Integer(-i)),
                    Number::Float(x) => Ok(Number::Float(-x)),
                },

                ("+", 2) | ("-", 2) | ("*", 2) | ("/", 2) => {
                    let lhs = args[0].value()?;
                    let rhs = args[1].value()?;
                    arith(functor, lhs, rhs)
                }

                _ => Err(ValueError::NonNumeric),
            },

            Term::Var(_) | Term::Unset => Err(ValueError::Unbound),
        }
    }
}

fn arith(op: &str, lhs: Number, rhs: Number) -> Result<Number, ValueError> {
    use Number::*;
    match (op, lhs, rhs) {
        ("+", Integer(a), Integer(b)) => Ok(Integer(a.wrapping_add(b))),
        ("-", Integer(a), Integer(b)) => Ok(Integer(a.wrapping_sub(b))),
        ("*", Integer(a), Integer(b)) => Ok(Integer(a.wrapping_mul(b))),

        // Division is float division, on integers included.
        ("/", _, _) => {
            if let Integer(0) = rhs {
                return Err(ValueError::DivisionByZero);
            }
            Ok(Float(lhs.as_f64() / rhs.as_f64()))
        }

        ("+", _, _) => Ok(Float(lhs.as_f64() + rhs.as_f64())),
        ("-", _, _) => Ok(Float(lhs.as_f64() - rhs.as_f64())),
        ("*", _, _) => Ok(Float(lhs.as_f64() * rhs.as_f64())),

        _ => Err(ValueError::NonNumeric),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(v) => write!(f, "{v}"),

            Term::Compound(functor, args) => {
                write!(f, "{functor}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }

            Term::Var(i) => write!(f, "_{i}"),

            Term::Unset => write!(f, "_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values() {
        let sum = Term::compound("+", vec![Term::int(2), Term::compound("*", vec![Term::int(3), Term::int(4)])]);
        assert!(matches!(sum.value(), Ok(Number::Integer(14))));

        let div = Term::compound("/", vec![Term::int(3), Term::int(2)]);
        assert!(matches!(div.value(), Ok(Number::Float(x)) if x == 1.5));

        assert_eq!(Term::symbol("a").value(), Err(ValueError::NonNumeric));
        assert_eq!(Term::Unset.value(), Err(ValueError::Unbound));
    }

    #[test]
    fn signatures() {
        let q = Term::compound("q", vec![Term::Unset]);
        assert_eq!(q.signature(), Some(Signature::new("q", 1)));
        assert_eq!(Term::symbol("a").signature(), Some(Signature::new("a", 0)));
        assert_eq!(Term::int(1).signature(), None);
    }
}
