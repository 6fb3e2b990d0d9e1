/*!
The clause database --- the compiled form of a logic program, one node per syntactic construct.

The engine consumes the database read-only: [find](ClauseDb::find) resolves a term's predicate to its define node, and [node](ClauseDb::node) retrieves typed nodes during evaluation.

Compilation from source text is out of scope, so the database also carries a small programmatic construction API:
facts, clauses and annotated disjunctions attach themselves to the define node of their head predicate (created on demand), and body expressions are assembled from [calls](ClauseDb::add_call), [conjunctions](ClauseDb::add_conj), [disjunctions](ClauseDb::add_disj) and [negations](ClauseDb::add_neg).

Before a query the database must be [linked](ClauseDb::link): every call node's target is fixed to a builtin, to the define node of its predicate, or to the shared empty placeholder for an undefined predicate.
Evaluating the placeholder is how a call to an undefined predicate is detected.

# Example
```rust
# use burrow::db::program::ClauseDb;
# use burrow::structures::term::Term;
let mut db = ClauseDb::default();
db.add_fact("edge", vec![Term::int(1), Term::int(2)], None);

let body = db.add_call("edge", vec![Term::var(0), Term::var(1)]);
db.add_clause("path", vec![Term::var(0), Term::var(1)], body, 2);

let query = Term::compound("path", vec![Term::int(1), Term::Unset]);
assert!(db.find(&query).is_some());
assert!(db.find(&Term::compound("path", vec![Term::Unset])).is_none());
```
*/

use std::collections::HashMap;

use crate::{
    db::keys::{CallTarget, GroupId, NodeId},
    misc::log::targets::{self},
    structures::term::{IString, Signature, Term},
};

/// The empty placeholder node, for calls to undefined predicates.
const EMPTY: NodeId = 0;

/// A fact, probabilistic or deterministic.
#[derive(Clone, Debug)]
pub struct FactNode {
    /// The (ground) argument terms.
    pub args: Vec<Term>,

    /// The probability annotation, if any.
    /// A fact without one is deterministic.
    pub probability: Option<Term>,
}

/// One branch of an annotated disjunction.
#[derive(Clone, Debug)]
pub struct ChoiceNode {
    /// The argument patterns of the branch head.
    pub args: Vec<Term>,

    /// The probability annotation.
    /// May reference head variables, and is instantiated per call.
    pub probability: Term,

    /// The annotated disjunction this branch belongs to.
    pub group: GroupId,

    /// The index of this branch within the group.
    pub choice: usize,
}

/// The define node of a predicate: the meeting point of all its clauses.
#[derive(Clone, Debug, Default)]
pub struct DefineNode {
    /// Clause, fact and choice nodes with this predicate as head, in insertion order.
    pub clauses: Vec<NodeId>,
}

/// A clause head over a body.
#[derive(Clone, Debug)]
pub struct ClauseNode {
    /// The head argument patterns, over the clause's variable slots.
    pub args: Vec<Term>,

    /// The body node.
    pub child: NodeId,

    /// The number of variable slots of the clause.
    pub varcount: usize,
}

/// A call to a predicate or builtin.
#[derive(Clone, Debug)]
pub struct CallNode {
    /// The called functor.
    pub functor: IString,

    /// The argument expressions, over the calling clause's variable slots.
    pub args: Vec<Term>,

    /// Where the call resolves to.
    pub target: CallTarget,
}

/// A node of the clause database.
#[derive(Clone, Debug)]
pub enum ProgramNode {
    /// A fact.
    Fact(FactNode),

    /// One branch of an annotated disjunction.
    Choice(ChoiceNode),

    /// The define node of a predicate.
    Define(DefineNode),

    /// A clause.
    Clause(ClauseNode),

    /// A conjunction of exactly two children.
    Conj([NodeId; 2]),

    /// A disjunction.
    Disj(Vec<NodeId>),

    /// A call.
    Call(CallNode),

    /// A negated (ground) body.
    Neg(NodeId),

    /// The placeholder for an undefined predicate.
    Empty,
}

/// The clause database.
pub struct ClauseDb {
    /// Node storage; ids are indices.
    /// Index 0 is the shared empty placeholder.
    nodes: Vec<ProgramNode>,

    /// Define node of each predicate with at least one clause.
    defines: HashMap<Signature, NodeId>,

    /// Count of allocated annotated-disjunction groups.
    groups: usize,

    /// Whether call targets have been linked since the last mutation.
    linked: bool,
}

impl Default for ClauseDb {
    fn default() -> Self {
        ClauseDb {
            nodes: vec![ProgramNode::Empty],
            defines: HashMap::default(),
            groups: 0,
            linked: false,
        }
    }
}

impl ClauseDb {
    fn push(&mut self, node: ProgramNode) -> NodeId {
        self.linked = false;
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// The define node for a signature, created on demand.
    fn define_for(&mut self, signature: Signature) -> NodeId {
        if let Some(&id) = self.defines.get(&signature) {
            return id;
        }
        let id = self.push(ProgramNode::Define(DefineNode::default()));
        log::debug!(target: targets::DB, "Define {id} created for {signature}.");
        self.defines.insert(signature, id);
        id
    }

    fn attach(&mut self, signature: Signature, clause: NodeId) {
        let define = self.define_for(signature);
        let ProgramNode::Define(node) = &mut self.nodes[define] else {
            panic!("! Define registry out of sync");
        };
        node.clauses.push(clause);
    }

    /// Adds a fact, attached to the define node of its head predicate.
    ///
    /// A fact without a probability annotation is deterministic.
    pub fn add_fact(&mut self, functor: &str, args: Vec<Term>, probability: Option<Term>) -> NodeId {
        let signature = Signature::new(functor, args.len());
        let id = self.push(ProgramNode::Fact(FactNode { args, probability }));
        self.attach(signature, id);
        id
    }

    /// Adds a clause over an assembled body, attached to the define node of its head predicate.
    ///
    /// `varcount` is the number of variable slots the head and body patterns index into.
    pub fn add_clause(&mut self, functor: &str, args: Vec<Term>, body: NodeId, varcount: usize) -> NodeId {
        let signature = Signature::new(functor, args.len());
        let id = self.push(ProgramNode::Clause(ClauseNode {
            args,
            child: body,
            varcount,
        }));
        self.attach(signature, id);
        id
    }

    /// Adds an annotated disjunction: one choice node per branch, each attached to its head predicate, all sharing a fresh group.
    ///
    /// Returns the group id.
    pub fn add_annotated_disjunction(&mut self, branches: Vec<(&str, Vec<Term>, Term)>) -> GroupId {
        let group = self.groups;
        self.groups += 1;
        for (choice, (functor, args, probability)) in branches.into_iter().enumerate() {
            let signature = Signature::new(functor, args.len());
            let id = self.push(ProgramNode::Choice(ChoiceNode {
                args,
                probability,
                group,
                choice,
            }));
            self.attach(signature, id);
        }
        group
    }

    /// Adds a call node.
    /// The target is fixed by [link](ClauseDb::link).
    pub fn add_call(&mut self, functor: &str, args: Vec<Term>) -> NodeId {
        self.push(ProgramNode::Call(CallNode {
            functor: IString::from(functor),
            args,
            target: CallTarget::Unlinked,
        }))
    }

    /// Adds a two-child conjunction.
    pub fn add_conj(&mut self, children: [NodeId; 2]) -> NodeId {
        self.push(ProgramNode::Conj(children))
    }

    /// Adds a disjunction.
    pub fn add_disj(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(ProgramNode::Disj(children))
    }

    /// Adds a negation.
    pub fn add_neg(&mut self, child: NodeId) -> NodeId {
        self.push(ProgramNode::Neg(child))
    }

    /// The define node for the predicate of `term`, if the predicate has clauses.
    pub fn find(&self, term: &Term) -> Option<NodeId> {
        self.defines.get(&term.signature()?).copied()
    }

    /// The node stored under `id`.
    pub fn node(&self, id: NodeId) -> &ProgramNode {
        &self.nodes[id]
    }

    /// The number of nodes, the empty placeholder included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The placeholder is always present.
        self.nodes.len() <= 1
    }

    /// Whether call targets are linked.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Fixes the target of every call node: builtins by signature, defined predicates by define node, anything else to the empty placeholder.
    ///
    /// Idempotent; must be re-run after mutation.
    /// Usually reached through [prepare](crate::engine::Engine::prepare).
    pub fn link(&mut self, builtins: &HashMap<Signature, usize>) {
        for id in 0..self.nodes.len() {
            let ProgramNode::Call(call) = &self.nodes[id] else {
                continue;
            };
            let signature = Signature {
                functor: call.functor.clone(),
                arity: call.args.len(),
            };
            let target = if let Some(&index) = builtins.get(&signature) {
                CallTarget::Builtin(index)
            } else if let Some(&define) = self.defines.get(&signature) {
                CallTarget::Node(define)
            } else {
                log::debug!(target: targets::DB, "Call {id} to undefined {signature}.");
                CallTarget::Node(EMPTY)
            };
            let ProgramNode::Call(call) = &mut self.nodes[id] else {
                unreachable!()
            };
            call.target = target;
        }
        self.linked = true;
    }

    /// The clauses of a define node whose heads are candidates for the given call arguments.
    ///
    /// First-level indexing only: a clause is a candidate unless some ground call argument's top symbol conflicts with the corresponding ground head pattern's top symbol.
    pub fn matching_clauses(&self, define: &DefineNode, args: &[Term]) -> Vec<NodeId> {
        define
            .clauses
            .iter()
            .copied()
            .filter(|&id| {
                let head = match &self.nodes[id] {
                    ProgramNode::Fact(f) => &f.args,
                    ProgramNode::Clause(c) => &c.args,
                    ProgramNode::Choice(c) => &c.args,
                    _ => return true,
                };
                !head.iter().zip(args).any(|(h, a)| top_conflict(h, a))
            })
            .collect()
    }
}

/// Whether two terms are certain not to unify, judged by their top symbols only.
fn top_conflict(pattern: &Term, call: &Term) -> bool {
    match (pattern, call) {
        (Term::Constant(a), Term::Constant(b)) => a != b,
        (Term::Compound(f, fa), Term::Compound(g, ga)) => f != g || fa.len() != ga.len(),
        (Term::Constant(_), Term::Compound(..)) | (Term::Compound(..), Term::Constant(_)) => true,
        _ => false,
    }
}
