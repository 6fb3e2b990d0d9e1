/*!
One-sided unification.

Two operations, mirroring their two uses during resolution:

- [unify_value] unifies two fully evaluated values and returns the most specific of the two.
  Used by the builtins, where both sides have already been instantiated.
- [unify] is directional: variable slots on the *target* side are filled (or re-unified) in a supplied environment, while variables on the *source* side merely match anything.
  Used to match call arguments against head patterns, and to translate callee results back into a caller's environment.

Unification of two unbound values is not supported and fails with [Variables](UnifyError::Variables); the engine promotes this to a program error where at least one bound side is required.

Plus the small helpers resolution needs around unification: [instantiate] substitutes an environment into a pattern, and [count_vars] counts variable occurrences in head patterns for the multi-occurrence groundness check of clause results.
*/

use std::collections::HashMap;

use crate::{
    structures::term::Term,
    types::err::UnifyError,
};

/// Unifies two fully evaluated values, returning the most specific unifier.
///
/// Fails with [Variables](UnifyError::Variables) when both sides are unbound, and with [Mismatch](UnifyError::Mismatch) on conflicting structure.
pub fn unify_value(a: &Term, b: &Term) -> Result<Term, UnifyError> {
    match (a, b) {
        _ if a.is_variable() && b.is_variable() => Err(UnifyError::Variables),

        _ if a.is_variable() => Ok(b.clone()),
        _ if b.is_variable() => Ok(a.clone()),

        (Term::Constant(x), Term::Constant(y)) => {
            if x == y {
                Ok(a.clone())
            } else {
                Err(UnifyError::Mismatch)
            }
        }

        (Term::Compound(f, fa), Term::Compound(g, ga)) => {
            if f != g || fa.len() != ga.len() {
                return Err(UnifyError::Mismatch);
            }
            let args = fa
                .iter()
                .zip(ga.iter())
                .map(|(x, y)| unify_value(x, y))
                .collect::<Result<Vec<Term>, UnifyError>>()?;
            Ok(a.with_args(args))
        }

        _ => Err(UnifyError::Mismatch),
    }
}

/// Unifies `source` against `target`, filling target-side variable slots in `context`.
///
/// - A target slot is written on first unification and re-unified against its stored value on any later one.
/// - A target slot without a context, and an unset target, match anything.
/// - An unbound source matches anything.
/// - Two bound terms must agree on functor and arity, and unify pointwise in the same context.
pub fn unify(source: &Term, target: &Term, mut context: Option<&mut [Term]>) -> Result<(), UnifyError> {
    match target {
        Term::Var(index) => match context {
            Some(slots) => {
                let current = slots[*index].clone();
                match current {
                    Term::Unset => {
                        slots[*index] = source.clone();
                        Ok(())
                    }
                    stored => unify(source, &stored, None),
                }
            }
            None => Ok(()),
        },

        Term::Unset => Ok(()),

        Term::Constant(y) => match source {
            Term::Var(_) | Term::Unset => Ok(()),
            Term::Constant(x) if x == y => Ok(()),
            _ => Err(UnifyError::Mismatch),
        },

        Term::Compound(g, ga) => match source {
            Term::Var(_) | Term::Unset => Ok(()),
            Term::Compound(f, fa) if f == g && fa.len() == ga.len() => {
                for (s, t) in fa.iter().zip(ga.iter()) {
                    unify(s, t, context.as_deref_mut())?;
                }
                Ok(())
            }
            _ => Err(UnifyError::Mismatch),
        },
    }
}

/// Substitutes slot values into a pattern.
///
/// Slot indices resolve to their current value --- an unbound slot resolves to [Unset](Term::Unset).
pub fn instantiate(pattern: &Term, slots: &[Term]) -> Term {
    match pattern {
        Term::Var(index) => slots[*index].clone(),
        Term::Compound(_, args) => {
            pattern.with_args(args.iter().map(|a| instantiate(a, slots)).collect())
        }
        other => other.clone(),
    }
}

/// Counts the occurrences of each variable slot in the given patterns, recursively.
pub(crate) fn count_vars(patterns: &[Term]) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    fn walk(term: &Term, counts: &mut HashMap<usize, usize>) {
        match term {
            Term::Var(index) => *counts.entry(*index).or_insert(0) += 1,
            Term::Compound(_, args) => {
                for arg in args.iter() {
                    walk(arg, counts);
                }
            }
            _ => {}
        }
    }
    for pattern in patterns {
        walk(pattern, &mut counts);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_unification() {
        let f_1_x = Term::compound("f", vec![Term::int(1), Term::Unset]);
        let f_y_2 = Term::compound("f", vec![Term::Unset, Term::int(2)]);
        let f_1_2 = Term::compound("f", vec![Term::int(1), Term::int(2)]);

        assert_eq!(unify_value(&f_1_x, &f_y_2), Ok(f_1_2.clone()));
        assert_eq!(unify_value(&f_1_2, &f_1_2), Ok(f_1_2.clone()));
        assert_eq!(unify_value(&f_1_2, &Term::int(1)), Err(UnifyError::Mismatch));
        assert_eq!(unify_value(&Term::Unset, &Term::Unset), Err(UnifyError::Variables));

        // Most-specific unifiers are idempotent.
        let once = unify_value(&f_1_x, &f_y_2).unwrap();
        assert_eq!(unify_value(&f_1_x, &once), Ok(once.clone()));
    }

    #[test]
    fn directional_unification() {
        let mut slots = vec![Term::Unset, Term::Unset];
        let pattern = Term::compound("f", vec![Term::var(0), Term::var(1)]);
        let value = Term::compound("f", vec![Term::int(1), Term::int(2)]);

        assert_eq!(unify(&value, &pattern, Some(&mut slots)), Ok(()));
        assert_eq!(slots, vec![Term::int(1), Term::int(2)]);

        // A second write re-unifies against the stored value.
        assert_eq!(unify(&Term::int(1), &Term::var(0), Some(&mut slots)), Ok(()));
        assert_eq!(
            unify(&Term::int(3), &Term::var(0), Some(&mut slots)),
            Err(UnifyError::Mismatch)
        );
    }

    #[test]
    fn instantiation() {
        let slots = vec![Term::int(1), Term::Unset];
        let pattern = Term::compound("f", vec![Term::var(0), Term::var(1), Term::symbol("a")]);
        assert_eq!(
            instantiate(&pattern, &slots),
            Term::compound("f", vec![Term::int(1), Term::Unset, Term::symbol("a")])
        );
    }

    #[test]
    fn occurrence_counts() {
        let head = vec![
            Term::var(0),
            Term::compound("f", vec![Term::var(0), Term::var(1)]),
        ];
        let counts = count_vars(&head);
        assert_eq!(counts.get(&0), Some(&2));
        assert_eq!(counts.get(&1), Some(&1));
    }
}
