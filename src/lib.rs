/*!
A library for grounding probabilistic logic programs.

burrow takes a compiled clause database and a query term and produces the query's *ground program*: a propositional DAG of atoms, conjunctions, disjunctions and negations, together with a name for each query solution.
The DAG is the input to a downstream probabilistic evaluator (weighted model counting and friends), which is out of scope here --- as are parsing and compilation of source text.

Unlike a classical Prolog interpreter the engine collects *every* proof of the query, not just the first.
It does so as a push-based dataflow: evaluating a construct instantiates *process nodes* which exchange `result` and `complete` messages, with tabled predicate calls memoizing their results and replaying them to late-coming callers.
Tabling is also what makes cyclic programs (e.g. transitive closure over a cyclic relation) ground in bounded time: a call re-entered from below is detected through an ancestor walk and its node in the DAG becomes a *mutable* disjunction, extended in place as the proofs closing the cycle arrive.

# Orientation

At a high level a query relates two databases:

- A program is stored in a [clause database](crate::db::program), one node per syntactic construct, consumed read-only.
- The ground program is accumulated in a [formula](crate::db::formula), appended to as proofs are found.

Between the two sit the [procedures](crate::procedures): unification, the process-node machinery, the evaluation dispatch, and tabling.
An [engine](crate::engine) carries the pieces shared between queries --- configuration, builtins, inspection --- and offers the entry points.

Useful starting points:

- [Engine::ground](crate::engine::Engine::ground) for the overall flow of a query.
- [The process protocol](crate::procedures::process) for the message contract everything else leans on.
- [Tabling](crate::procedures::define) for cycle handling, the subtle part.
- [The structures](crate::structures) for terms and variable environments.

# Example

Ground a two-clause program over a pair of probabilistic facts, sharing the atom of `a` between both proofs of `c`:

```rust
use burrow::{config::Config, db::program::ClauseDb, engine::Engine, structures::term::Term};

// 0.3::a.  0.4::b.  c :- a, b.  c :- a.
let mut db = ClauseDb::default();
db.add_fact("a", vec![], Some(Term::float(0.3)));
db.add_fact("b", vec![], Some(Term::float(0.4)));

let call_a = db.add_call("a", vec![]);
let call_b = db.add_call("b", vec![]);
let both = db.add_conj([call_a, call_b]);
db.add_clause("c", vec![], both, 0);

let call_a_again = db.add_call("a", vec![]);
db.add_clause("c", vec![], call_a_again, 0);

let mut engine = Engine::from_config(Config::default());
engine.prepare(&mut db);

let formula = engine.ground(&db, &Term::symbol("c"), None, Some("query")).unwrap();

// One name for the one (argumentless) solution of c.
assert_eq!(formula.names().count(), 1);
assert!(formula.names().next().unwrap().node.id().is_some());
```

# Logs

Calls to [log!](log) are made throughout, under targets listed in [misc::log] --- e.g. `RUST_LOG=tabling …` narrows output to the tabling store with [env_logger](https://docs.rs/env_logger/latest/env_logger/).
No log implementation is provided.
*/

pub mod config;
pub mod db;
pub mod engine;
pub mod misc;
pub mod procedures;
pub mod structures;
pub mod types;
