/*!
The engine --- to which builtins are registered and through which queries are grounded.

An [Engine] owns the pieces shared between queries: the configuration, the builtin registry, and the optional [inspector](crate::engine::inspect).
Per-query state lives in a [Grounder](crate::procedures::eval::Grounder), created and dropped inside [ground](Engine::ground).

A clause database must be [prepared](Engine::prepare) against an engine before queries: preparation fixes each call node's target using the engine's builtin table.

# Example
```rust
# use burrow::{config::Config, db::program::ClauseDb, engine::Engine, structures::term::Term};
let mut db = ClauseDb::default();
db.add_fact("p", vec![Term::int(1)], Some(Term::float(0.4)));
db.add_fact("p", vec![Term::int(2)], Some(Term::float(0.7)));
let body = db.add_call("p", vec![Term::var(0)]);
db.add_clause("q", vec![Term::var(0)], body, 1);

let mut engine = Engine::from_config(Config::default());
engine.prepare(&mut db);

let query = Term::compound("q", vec![Term::Unset]);
let formula = engine.ground(&db, &query, None, Some("q")).unwrap();

let names: Vec<_> = formula.names().collect();
assert_eq!(names.len(), 2);
assert_eq!(names[0].term, Term::compound("q", vec![Term::int(1)]));
assert_eq!(names[1].term, Term::compound("q", vec![Term::int(2)]));
```
*/

mod builtins;
pub mod inspect;

use std::collections::HashMap;

use crate::{
    config::Config,
    db::{formula::GroundFormula, program::ClauseDb, GroundRef},
    engine::inspect::Inspector,
    procedures::{eval::Grounder, process::ProcessKey},
    structures::{
        bindings::Bindings,
        term::{Signature, Term},
    },
    types::err::{ErrorKind, GroundingError},
};

/// The implementation of a builtin predicate.
///
/// Receives the grounder, the instantiated call arguments, the calling environment, and the callback process to [respond](Grounder::respond) and [conclude](Grounder::conclude) through.
/// A builtin emits zero or one result, then `complete`.
pub type BuiltinFn = fn(&mut Grounder<'_>, &[Term], &Bindings, ProcessKey) -> Result<(), ErrorKind>;

/// The grounding engine.
pub struct Engine {
    /// The configuration of the engine.
    pub config: Config,

    /// Registered builtin implementations, in registration order.
    pub(crate) builtins: Vec<BuiltinFn>,

    /// Builtin index by signature --- the table call linking consults.
    builtin_index: HashMap<Signature, usize>,

    /// An optional inspector, notified around each node evaluation.
    pub(crate) inspector: Option<Box<dyn Inspector>>,
}

impl Engine {
    /// An engine over the given configuration.
    ///
    /// The default builtin set is registered unless the configuration says otherwise.
    pub fn from_config(config: Config) -> Self {
        let defaults = config.default_builtins;
        let mut engine = Engine {
            config,
            builtins: Vec::default(),
            builtin_index: HashMap::default(),
            inspector: None,
        };
        if defaults {
            builtins::register_defaults(&mut engine);
        }
        engine
    }

    /// Registers a builtin under `functor/arity`.
    ///
    /// Registration order fixes the index the builtin table hands out; a re-registration of the same signature shadows the earlier one at linking time.
    pub fn add_builtin(&mut self, functor: &str, arity: usize, builtin: BuiltinFn) {
        let index = self.builtins.len();
        self.builtins.push(builtin);
        self.builtin_index.insert(Signature::new(functor, arity), index);
    }

    /// The signature to index map used when a database is prepared.
    pub fn builtin_table(&self) -> &HashMap<Signature, usize> {
        &self.builtin_index
    }

    /// Attaches an inspector.
    pub fn set_inspector(&mut self, inspector: Box<dyn Inspector>) {
        self.inspector = Some(inspector);
    }

    /// Links a database's call nodes against this engine's builtin table.
    pub fn prepare(&self, db: &mut ClauseDb) {
        db.link(&self.builtin_index);
    }

    /// Grounds a query, returning the formula.
    ///
    /// One name is registered per solution --- the query term with the solution's arguments, mapped to its node.
    /// A query without solutions registers a single name mapped to the absent node.
    ///
    /// Passing a formula accumulates this query into it; otherwise a fresh one is built.
    pub fn ground(
        &mut self,
        db: &ClauseDb,
        query: &Term,
        formula: Option<GroundFormula>,
        label: Option<&str>,
    ) -> Result<GroundFormula, ErrorKind> {
        let mut formula = formula.unwrap_or_default();
        let results = self.ground_into(db, query, &mut formula)?;

        if results.is_empty() {
            formula.add_name(query.clone(), GroundRef::False, label);
        } else {
            for (node, args) in results {
                formula.add_name(query.with_args(args), node, label);
            }
        }
        Ok(formula)
    }

    /// Grounds a query and returns only the solution argument tuples.
    pub fn query(&mut self, db: &ClauseDb, query: &Term) -> Result<Vec<Vec<Term>>, ErrorKind> {
        let mut formula = GroundFormula::default();
        let results = self.ground_into(db, query, &mut formula)?;
        Ok(results.into_iter().map(|(_, args)| args).collect())
    }

    fn ground_into(
        &mut self,
        db: &ClauseDb,
        query: &Term,
        formula: &mut GroundFormula,
    ) -> Result<Vec<(GroundRef, Vec<Term>)>, ErrorKind> {
        if !db.is_linked() {
            return Err(GroundingError::UnlinkedDatabase.into());
        }

        let Some(signature) = query.signature() else {
            return Err(GroundingError::NonGroundQuery.into());
        };
        let args = query.args().to_vec();
        if args.iter().any(has_slot) {
            // Slot indices are clause-relative; query variables are unset.
            return Err(GroundingError::NonGroundQuery.into());
        }

        // An unknown query predicate has no solutions, in contrast to an
        // unknown predicate reached through a call.
        let Some(define) = db.find(query) else {
            return Ok(Vec::new());
        };

        let mut grounder = Grounder::new(self, db, formula);
        grounder.solve(define, &signature.functor, args)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::from_config(Config::default())
    }
}

/// Whether the term contains a variable slot index, recursively.
fn has_slot(term: &Term) -> bool {
    match term {
        Term::Var(_) => true,
        Term::Compound(_, args) => args.iter().any(has_slot),
        _ => false,
    }
}
