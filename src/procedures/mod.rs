/*!
The resolution machinery.

Grounding is a push-based dataflow: evaluating a construct instantiates
[process nodes](crate::procedures::process) which exchange `result` and
`complete` messages, driven synchronously by the
[grounder](crate::procedures::eval::Grounder).
[Unification](crate::procedures::unify) decides matching, and
[tabling](crate::procedures::define) shares the work (and the resulting
formula nodes) between every caller of a predicate instantiation.
*/

pub mod define;
pub mod eval;
pub mod process;
pub mod unify;
