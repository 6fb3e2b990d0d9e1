/*!
The builtin predicates.

Each builtin receives its (instantiated) call arguments, the calling
environment, and a callback process; it emits zero or one result followed
by `complete`.
Results carry the [True](GroundRef::True) sentinel as their ground node ---
builtins are deterministic.

The required set: `true/0`, `fail/0`, `=/2`, `\=/2`, `==/2`, `\==/2`,
`is/2`, and the comparisons `>`, `<`, `=<`, `>=`, `=\=`, `=:=`.
Further builtins may be registered through
[add_builtin](crate::engine::Engine::add_builtin).
*/

use crate::{
    db::GroundRef,
    engine::Engine,
    procedures::{eval::Grounder, process::ProcessKey, unify::unify_value},
    structures::{bindings::Bindings, term::Term},
    types::err::{ErrorKind, GroundingError, UnifyError},
};

/// Registers the default builtin set.
pub(super) fn register_defaults(engine: &mut Engine) {
    engine.add_builtin("true", 0, builtin_true);
    engine.add_builtin("fail", 0, builtin_fail);

    engine.add_builtin("=", 2, builtin_eq);
    engine.add_builtin("\\=", 2, builtin_neq);
    engine.add_builtin("==", 2, builtin_same);
    engine.add_builtin("\\==", 2, builtin_notsame);

    engine.add_builtin("is", 2, builtin_is);

    engine.add_builtin(">", 2, builtin_gt);
    engine.add_builtin("<", 2, builtin_lt);
    engine.add_builtin("=<", 2, builtin_le);
    engine.add_builtin(">=", 2, builtin_ge);
    engine.add_builtin("=\\=", 2, builtin_val_neq);
    engine.add_builtin("=:=", 2, builtin_val_eq);
}

/// `true` --- succeeds once.
fn builtin_true(g: &mut Grounder, _args: &[Term], context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    g.respond(callback, context.slots(), GroundRef::True)?;
    g.conclude(callback)
}

/// `fail` --- never succeeds.
fn builtin_fail(g: &mut Grounder, _args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    g.conclude(callback)
}

/// `A = B` --- unification.
/// Both sides unbound is a program error.
fn builtin_eq(g: &mut Grounder, args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    match unify_value(&args[0], &args[1]) {
        Ok(unified) => {
            let result = [unified.clone(), unified];
            g.respond(callback, &result, GroundRef::True)?;
        }
        Err(UnifyError::Mismatch) => {}
        Err(UnifyError::Variables) => return Err(GroundingError::VariableUnification.into()),
    }
    g.conclude(callback)
}

/// `A \= B` --- succeeds where `=` fails.
/// Both sides unbound fails silently.
fn builtin_neq(g: &mut Grounder, args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    match unify_value(&args[0], &args[1]) {
        Err(UnifyError::Mismatch) => {
            g.respond(callback, args, GroundRef::True)?;
        }
        Ok(_) | Err(UnifyError::Variables) => {}
    }
    g.conclude(callback)
}

/// `A == B` --- syntactic identity.
/// Both sides unbound is a program error.
fn builtin_same(g: &mut Grounder, args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    if args[0].is_variable() && args[1].is_variable() {
        return Err(GroundingError::VariableUnification.into());
    }
    if args[0] == args[1] {
        g.respond(callback, args, GroundRef::True)?;
    }
    g.conclude(callback)
}

/// `A \== B` --- syntactic distinctness.
/// Both sides unbound is a program error.
fn builtin_notsame(g: &mut Grounder, args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    if args[0].is_variable() && args[1].is_variable() {
        return Err(GroundingError::VariableUnification.into());
    }
    if args[0] != args[1] {
        g.respond(callback, args, GroundRef::True)?;
    }
    g.conclude(callback)
}

/// `A is B` --- evaluates `B` and unifies the value with `A`.
fn builtin_is(g: &mut Grounder, args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
    let value = Term::from(args[1].value()?);
    match unify_value(&args[0], &value) {
        Ok(_) => {
            let result = [value, args[1].clone()];
            g.respond(callback, &result, GroundRef::True)?;
        }
        Err(_) => {}
    }
    g.conclude(callback)
}

macro_rules! comparison {
    ($name:ident, $doc:literal, $test:expr) => {
        #[doc = $doc]
        /// Both sides must evaluate numerically.
        fn $name(g: &mut Grounder, args: &[Term], _context: &Bindings, callback: ProcessKey) -> Result<(), ErrorKind> {
            let lhs = args[0].value()?;
            let rhs = args[1].value()?;
            let holds: bool = $test(lhs.cmp_value(rhs), lhs.eq_value(rhs));
            if holds {
                g.respond(callback, args, GroundRef::True)?;
            }
            g.conclude(callback)
        }
    };
}

comparison!(builtin_gt, "`A > B`.", |ord: std::cmp::Ordering, _eq| ord.is_gt());
comparison!(builtin_lt, "`A < B`.", |ord: std::cmp::Ordering, _eq| ord.is_lt());
comparison!(builtin_le, "`A =< B`.", |ord: std::cmp::Ordering, _eq| ord.is_le());
comparison!(builtin_ge, "`A >= B`.", |ord: std::cmp::Ordering, _eq| ord.is_ge());
comparison!(builtin_val_eq, "`A =:= B` --- numeric equality.", |_ord, eq: bool| eq);
comparison!(builtin_val_neq, "`A =\\= B` --- numeric inequality.", |_ord, eq: bool| !eq);
