/*!
The variable environment of a clause activation.

A [Bindings] is a fixed-length vector of slots, one per variable of the activated clause, each initially [unset](crate::structures::term::Term::Unset).
A slot is written through [unify](crate::procedures::unify::unify); writing to a slot which already holds a term re-unifies against the stored term instead.

Alongside the slots a bindings carries `define` --- a back-pointer to the process of the innermost enclosing tabled call.
The chain of these pointers is walked to decide whether a call to an already-active tabled predicate closes a cycle.
See [the define procedures](crate::procedures::define).

Bindings are cloned, never shared, across sibling calls.
*/

use std::fmt;

use crate::procedures::process::ProcessKey;
use crate::structures::term::Term;

/// The variable environment of a clause activation.
#[derive(Clone, Debug)]
pub struct Bindings {
    /// One slot per variable, [Unset](Term::Unset) while unbound.
    slots: Vec<Term>,

    /// The innermost enclosing tabled call, if any.
    pub define: Option<ProcessKey>,
}

impl Bindings {
    /// A fresh environment of `size` unbound slots.
    pub fn fresh(size: usize, define: Option<ProcessKey>) -> Self {
        Bindings {
            slots: vec![Term::Unset; size],
            define,
        }
    }

    /// An environment over the given slot values.
    pub fn from_slots(slots: Vec<Term>, define: Option<ProcessKey>) -> Self {
        Bindings { slots, define }
    }

    /// The slot values.
    pub fn slots(&self) -> &[Term] {
        &self.slots
    }

    /// The slot values, mutably.
    pub fn slots_mut(&mut self) -> &mut [Term] {
        &mut self.slots
    }

    /// The number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{slot}")?;
        }
        write!(f, "]")
    }
}
