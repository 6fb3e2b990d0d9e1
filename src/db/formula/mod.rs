/*!
The ground formula --- the propositional DAG a query grounds to.

An append-only store of `atom`, `and`, `or` and `not` nodes referenced by [GroundRef], together with the query names registered for each solution.
Deterministic constants are never allocated: subformulas which simplify to true or false collapse to the [True](GroundRef::True)/[False](GroundRef::False) sentinels, and absorption is applied on construction.
Frozen `and`/`or` nodes and `not` nodes are structurally hashed (children as a multiset), so identical subformulas share one node.

The one mutable entity is an `or` node created with `readonly = false`.
Such a node may receive further disjuncts through [add_disjunct](GroundFormula::add_disjunct) after creation, is identity-based (never hashed), and is how a logical cycle becomes a single node of an otherwise append-only store: the owning tabled call publishes the node first and inserts the disjuncts closing the cycle later.

# Example
```rust
# use burrow::db::formula::{AtomKey, GroundFormula};
# use burrow::db::GroundRef;
# use burrow::structures::term::Term;
let mut formula = GroundFormula::default();

let a = formula.add_atom(AtomKey::Fact(3), Some(Term::float(0.5)), None);
let b = formula.add_atom(AtomKey::Fact(4), Some(Term::float(0.2)), None);

let ab = formula.add_and([a, b]);
assert_eq!(ab, formula.add_and([b, a]));

assert_eq!(formula.add_and([a, GroundRef::False]), GroundRef::False);
assert_eq!(formula.add_or([a, GroundRef::True], true), GroundRef::True);
```
*/

mod graph;

use std::collections::HashMap;
use std::fmt;

use crate::{
    db::keys::{GroundId, GroundRef, GroupId, NodeId},
    misc::log::targets::{self},
    structures::term::Term,
    types::err::{self},
};

/// The identity of an atom node.
///
/// Probabilities take no part in identity: the same fact grounds to the same atom however often it is reached.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AtomKey {
    /// A probabilistic fact, by clause database node.
    Fact(NodeId),

    /// One branch of an annotated disjunction, instantiated with the given arguments.
    Choice {
        group: GroupId,
        args: Vec<Term>,
        choice: usize,
    },
}

/// The group tag of a choice atom: the annotated disjunction and the arguments it was instantiated with.
///
/// The downstream evaluator imposes the sum-to-one constraint across atoms sharing a tag.
pub type GroupKey = (GroupId, Vec<Term>);

/// A node of the ground formula.
#[derive(Clone, Debug)]
pub enum GroundNode {
    /// A probabilistic atom.
    Atom {
        key: AtomKey,
        probability: Term,
        group: Option<GroupKey>,
    },

    /// A conjunction.
    And { children: Vec<GroundRef> },

    /// A disjunction.
    /// While `readonly` is false the node may receive further disjuncts.
    Or {
        children: Vec<GroundRef>,
        readonly: bool,
    },

    /// A negation.
    Not { child: GroundId },
}

/// A registered query name: one solution of a query, or its absence.
#[derive(Clone, Debug)]
pub struct QueryName {
    /// The query term with the solution's arguments substituted in.
    pub term: Term,

    /// The node the solution grounds to.
    /// [False](GroundRef::False) records that the query has no solution.
    pub node: GroundRef,

    /// The label passed to `ground`, if any.
    pub label: Option<String>,
}

/// The identity under which frozen nodes are shared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum NodeKey {
    Atom(AtomKey),
    And(Vec<GroundId>),
    Or(Vec<GroundId>),
    Not(GroundId),
}

/// The ground formula.
#[derive(Default, Debug)]
pub struct GroundFormula {
    /// Node storage; ids are indices.
    nodes: Vec<GroundNode>,

    /// Structural index over frozen nodes.
    index: HashMap<NodeKey, GroundId>,

    /// Registered query names, in registration order.
    names: Vec<QueryName>,
}

impl GroundFormula {
    fn push(&mut self, node: GroundNode) -> GroundId {
        let id = self.nodes.len();
        log::trace!(target: targets::FORMULA, "Node {id}: {node:?}.");
        self.nodes.push(node);
        id
    }

    fn shared(&mut self, key: NodeKey, node: GroundNode) -> GroundRef {
        if let Some(&id) = self.index.get(&key) {
            return GroundRef::Node(id);
        }
        let id = self.push(node);
        self.index.insert(key, id);
        GroundRef::Node(id)
    }

    /// Adds (or finds) an atom.
    ///
    /// An atom without a probability is deterministically true and collapses to the sentinel.
    pub fn add_atom(&mut self, key: AtomKey, probability: Option<Term>, group: Option<GroupKey>) -> GroundRef {
        let Some(probability) = probability else {
            return GroundRef::True;
        };
        self.shared(
            NodeKey::Atom(key.clone()),
            GroundNode::Atom {
                key,
                probability,
                group,
            },
        )
    }

    /// Adds (or finds) a conjunction.
    ///
    /// True children are filtered, a false child collapses the node, an empty conjunction is true, and a single child passes through.
    pub fn add_and(&mut self, children: impl IntoIterator<Item = GroundRef>) -> GroundRef {
        let mut kids: Vec<GroundId> = Vec::new();
        for child in children {
            match child {
                GroundRef::True => {}
                GroundRef::False => return GroundRef::False,
                GroundRef::Node(id) => kids.push(id),
            }
        }
        match kids[..] {
            [] => GroundRef::True,
            [only] => GroundRef::Node(only),
            _ => {
                let mut key = kids.clone();
                key.sort_unstable();
                let children = kids.into_iter().map(GroundRef::Node).collect();
                self.shared(NodeKey::And(key), GroundNode::And { children })
            }
        }
    }

    /// Adds (or finds) a disjunction.
    ///
    /// With `readonly` the rules are dual to [add_and](GroundFormula::add_and) and the node is shared.
    /// Without, the children are stored verbatim and the node is allocated fresh: a mutable node's identity is its id, and its child set is still growing.
    pub fn add_or(&mut self, children: impl IntoIterator<Item = GroundRef>, readonly: bool) -> GroundRef {
        if !readonly {
            let id = self.push(GroundNode::Or {
                children: children.into_iter().collect(),
                readonly: false,
            });
            return GroundRef::Node(id);
        }
        let mut kids: Vec<GroundId> = Vec::new();
        for child in children {
            match child {
                GroundRef::True => return GroundRef::True,
                GroundRef::False => {}
                GroundRef::Node(id) => kids.push(id),
            }
        }
        match kids[..] {
            [] => GroundRef::False,
            [only] => GroundRef::Node(only),
            _ => {
                let mut key = kids.clone();
                key.sort_unstable();
                let children = kids.into_iter().map(GroundRef::Node).collect();
                self.shared(
                    NodeKey::Or(key),
                    GroundNode::Or {
                        children,
                        readonly: true,
                    },
                )
            }
        }
    }

    /// Adds (or finds) a negation.
    pub fn add_not(&mut self, child: GroundRef) -> GroundRef {
        match child {
            GroundRef::True => GroundRef::False,
            GroundRef::False => GroundRef::True,
            GroundRef::Node(id) => self.shared(NodeKey::Not(id), GroundNode::Not { child: id }),
        }
    }

    /// Appends a disjunct to a mutable `or` node.
    pub fn add_disjunct(&mut self, or: GroundId, child: GroundRef) -> Result<(), err::FormulaError> {
        match self.nodes.get_mut(or) {
            Some(GroundNode::Or {
                children,
                readonly: false,
            }) => {
                log::trace!(target: targets::FORMULA, "Node {or} gains disjunct {child}.");
                children.push(child);
                Ok(())
            }

            Some(GroundNode::Or { readonly: true, .. }) => Err(err::FormulaError::FrozenDisjunct),

            _ => Err(err::FormulaError::MissingNode),
        }
    }

    /// Registers a query name.
    pub fn add_name(&mut self, term: Term, node: GroundRef, label: Option<&str>) {
        log::debug!(target: targets::FORMULA, "Name {term} -> {node}.");
        self.names.push(QueryName {
            term,
            node,
            label: label.map(str::to_owned),
        });
    }

    /// The node stored under `id`.
    pub fn node(&self, id: GroundId) -> &GroundNode {
        &self.nodes[id]
    }

    /// An iterator over all nodes, with their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (GroundId, &GroundNode)> {
        self.nodes.iter().enumerate()
    }

    /// An iterator over the registered query names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &QueryName> {
        self.names.iter()
    }

    /// The number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for GroundFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                GroundNode::Atom { key, probability, .. } => {
                    writeln!(f, "{id}: atom {key:?} ({probability})")?
                }

                GroundNode::And { children } => {
                    writeln!(f, "{id}: and {}", render(children))?
                }

                GroundNode::Or { children, readonly } => {
                    let tag = if *readonly { "or" } else { "or*" };
                    writeln!(f, "{id}: {tag} {}", render(children))?
                }

                GroundNode::Not { child } => writeln!(f, "{id}: not {child}")?,
            }
        }
        for name in &self.names {
            writeln!(f, "{} -> {}", name.term, name.node)?;
        }
        Ok(())
    }
}

fn render(children: &[GroundRef]) -> String {
    let parts: Vec<String> = children.iter().map(GroundRef::to_string).collect();
    format!("({})", parts.join(","))
}
