/*!
Process nodes and the `result`/`complete` message protocol.

Evaluating a goal instantiates a network of process nodes, one per syntactic construct under evaluation, connected producer to listener.
A producer emits two kinds of message:

- `result(bindings, ground node)` --- one proof of the producer's goal;
- `complete` --- no further results will follow.

The protocol guarantees: each result is delivered exactly once per (producer, listener) pair, exactly one `complete` is delivered, and `complete` is the last message.
A listener attached late to a [tabled call](DefineProcess) first receives every past result in original order, then a `complete` if the call has completed.

Delivery is synchronous: an emission drives every downstream handler to completion before returning, so there is no queue and no suspension.
The process kinds are a closed sum held in a slotmap arena on the [Grounder](crate::procedures::eval::Grounder); the receive handlers live there, as they thread the whole evaluation state.
*/

use slotmap::new_key_type;

use crate::{
    db::{GroundRef, NodeId},
    structures::term::Term,
};

new_key_type! {
    /// A key into the process arena of a query.
    pub struct ProcessKey;
}

/// Which messages a listener subscribed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subscribe {
    /// Results and completion.
    All,

    /// Results only.
    Results,
}

impl Subscribe {
    pub fn results(self) -> bool {
        true
    }

    pub fn completion(self) -> bool {
        matches!(self, Subscribe::All)
    }
}

/// State common to every process kind: its listeners, and whether it has completed.
#[derive(Default)]
pub(crate) struct ProcessCore {
    /// Listeners, in subscription order.
    pub listeners: Vec<(ProcessKey, Subscribe)>,

    /// Set once `complete` has been sent; gates re-sending.
    pub is_complete: bool,
}

impl ProcessCore {
    pub fn with_listener(listener: ProcessKey, events: Subscribe) -> Self {
        ProcessCore {
            listeners: vec![(listener, events)],
            is_complete: false,
        }
    }
}

/// A counted fan-in over sibling branches.
///
/// Forwards every result, and completes once each of the `remaining` producers has completed.
pub(crate) struct OrProcess {
    pub core: ProcessCore,

    /// Producers yet to complete.
    pub remaining: usize,
}

/// Negation over a (ground) body.
///
/// Buffers the ground node of every result; on `complete` emits at most one result, the negated disjunction of the buffer.
pub(crate) struct NotProcess {
    pub core: ProcessCore,

    /// The environment the negation was evaluated in, echoed as the result bindings.
    pub saved: Vec<Term>,

    /// Ground nodes of the body's results.
    pub collected: Vec<GroundRef>,
}

/// Links the two children of a conjunction: each result of the first child starts an evaluation of the second.
///
/// Takes no listeners --- its parent is fixed at creation.
/// `complete` from the first child is forwarded to the parent immediately; this relies on the second-child evaluations being synchronous, which the single-threaded schedule guarantees.
pub(crate) struct LinkProcess {
    /// The second child, evaluated once per result of the first.
    pub second: NodeId,

    /// Where results and completion land.
    pub parent: ProcessKey,

    /// The enclosing tabled call, threaded into second-child environments.
    pub define: Option<ProcessKey>,
}

/// Joins one first-child proof with each second-child proof of a conjunction.
pub(crate) struct AndProcess {
    pub core: ProcessCore,

    /// The ground node of the first child's proof.
    pub first: GroundRef,
}

/// Translates clause body results into head instantiations.
pub(crate) struct BodyReturnProcess {
    pub core: ProcessCore,

    /// The head argument patterns.
    pub head_args: Vec<Term>,

    /// Occurrence count per head variable, for the multi-occurrence groundness check.
    pub head_counts: std::collections::HashMap<usize, usize>,
}

/// Translates callee results back into the caller's environment.
pub(crate) struct CallReturnProcess {
    pub core: ProcessCore,

    /// The call's argument expressions, over the caller's slots.
    pub patterns: Vec<Term>,

    /// The caller's slots at call time.
    pub slots: Vec<Term>,
}

/// A tabled call: the meeting point of every caller of one predicate instantiation.
///
/// Owns result memoization, late-listener replay, and the buffered/unbuffered modes cycle handling switches between.
/// See [the define procedures](crate::procedures::define).
pub(crate) struct DefineProcess {
    pub core: ProcessCore,

    /// The define node evaluated.
    pub node: NodeId,

    /// The call arguments.
    pub args: Vec<Term>,

    /// The enclosing tabled call at creation --- the ancestor chain cycle detection walks.
    pub parent: Option<ProcessKey>,

    /// Whether a cycle through this call has been detected.
    pub cyclic: bool,

    /// Memoized results in first-seen order: one ground node per distinct result tuple.
    pub results: Vec<(Vec<Term>, GroundRef)>,

    /// Buffered results while acyclic: every contributing ground node per tuple.
    pub buffer: Vec<(Vec<Term>, Vec<GroundRef>)>,

    /// Cycle relays registered on this call, to be completed when it completes.
    pub cycle_children: Vec<ProcessKey>,
}

impl DefineProcess {
    pub fn new(node: NodeId, args: Vec<Term>, parent: Option<ProcessKey>) -> Self {
        DefineProcess {
            core: ProcessCore::default(),
            node,
            args,
            parent,
            cyclic: false,
            results: Vec::new(),
            buffer: Vec::new(),
            cycle_children: Vec::new(),
        }
    }
}

/// The relay installed between a cycle parent and the caller which closed the cycle.
///
/// Forwards everything; completed explicitly by its parent, as its only producer is the parent itself.
pub(crate) struct CycleRelayProcess {
    pub core: ProcessCore,

    /// The cycle parent.
    #[allow(dead_code)]
    pub parent: ProcessKey,
}

/// Collects the results of the root goal.
pub(crate) struct CollectorProcess {
    pub core: ProcessCore,

    /// `(ground node, argument tuple)` per result, in arrival order.
    pub results: Vec<(GroundRef, Vec<Term>)>,
}

/// A process node.
pub(crate) enum Process {
    Or(OrProcess),
    Not(NotProcess),
    Link(LinkProcess),
    And(AndProcess),
    BodyReturn(BodyReturnProcess),
    CallReturn(CallReturnProcess),
    Define(DefineProcess),
    CycleRelay(CycleRelayProcess),
    Collector(CollectorProcess),
}

impl Process {
    pub fn core(&self) -> &ProcessCore {
        match self {
            Process::Or(p) => &p.core,
            Process::Not(p) => &p.core,
            Process::And(p) => &p.core,
            Process::BodyReturn(p) => &p.core,
            Process::CallReturn(p) => &p.core,
            Process::Define(p) => &p.core,
            Process::CycleRelay(p) => &p.core,
            Process::Collector(p) => &p.core,
            Process::Link(_) => panic!("! Link processes take no listeners"),
        }
    }

    pub fn core_mut(&mut self) -> &mut ProcessCore {
        match self {
            Process::Or(p) => &mut p.core,
            Process::Not(p) => &mut p.core,
            Process::And(p) => &mut p.core,
            Process::BodyReturn(p) => &mut p.core,
            Process::CallReturn(p) => &mut p.core,
            Process::Define(p) => &mut p.core,
            Process::CycleRelay(p) => &mut p.core,
            Process::Collector(p) => &mut p.core,
            Process::Link(_) => panic!("! Link processes take no listeners"),
        }
    }

    /// A short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Process::Or(_) => "or",
            Process::Not(_) => "not",
            Process::Link(_) => "link",
            Process::And(_) => "and",
            Process::BodyReturn(_) => "body-return",
            Process::CallReturn(_) => "call-return",
            Process::Define(_) => "define",
            Process::CycleRelay(_) => "cycle-relay",
            Process::Collector(_) => "collector",
        }
    }
}
