/*!
Databases for holding information relevant to a query.

- [The clause database](crate::db::program)
  + The compiled form of a logic program, one node per syntactic construct. \
    Consumed read-only during grounding: lookup by predicate returns a define node, and evaluation walks the typed nodes below it.

- [The ground formula](crate::db::formula)
  + The propositional DAG a query grounds to. \
    Appended to during grounding, and handed to a downstream probabilistic evaluator afterwards.
*/

pub mod formula;
mod keys;
pub mod program;
pub use keys::*;
