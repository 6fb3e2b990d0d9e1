/*!
The grounder: evaluation dispatch and message delivery.

A [Grounder] is the state of one query: the process arena, the table of
active/completed tabled calls, the formula under construction, and the
resolution depth.
Evaluating a database node instantiates the process network for that
construct and drives it by ordinary (synchronous, recursive) calls ---
[send_result](Grounder::send_result) and
[send_complete](Grounder::send_complete) *are* the event loop.

# Receive handlers

Each process kind's receive handlers live here (the tabled-call handlers in
[define](crate::procedures::define)), as they thread the whole evaluation
state:

- a fan-in forwards results and counts completions;
- a link starts a second-conjunct evaluation per first-conjunct result;
- a join allocates the `and` node pairing two conjunct proofs;
- the return processes translate results across environment boundaries
  (body to head, callee to caller);
- a negation buffers ground nodes until its body completes.

# Depth

Recursion depth equals logical proof depth.
An explicit counter bounds it with the configured limit, surfacing
[UnboundProgram](GroundingError::UnboundProgram) rather than exhausting the
host stack.
*/

use slotmap::SlotMap;

use std::collections::HashMap;

use crate::{
    db::{
        formula::{AtomKey, GroundFormula},
        program::{CallNode, ChoiceNode, ClauseDb, ClauseNode, FactNode, ProgramNode},
        CallTarget, GroundRef, NodeId,
    },
    engine::{inspect::Step, Engine},
    misc::log::targets::{self},
    procedures::{
        process::{
            AndProcess, BodyReturnProcess, CallReturnProcess, CollectorProcess, LinkProcess,
            NotProcess, OrProcess, Process, ProcessCore, ProcessKey, Subscribe,
        },
        unify::{count_vars, instantiate, unify},
    },
    structures::{
        bindings::Bindings,
        term::{IString, Term},
    },
    types::err::{ErrorKind, GroundingError},
};

/// The key of a tabled call: the define node and the call argument tuple.
pub(crate) type TableKey = (NodeId, Vec<Term>);

/// The state of one query.
///
/// Builtins receive a grounder to [respond](Grounder::respond) and
/// [conclude](Grounder::conclude) through; everything else is crate-internal.
pub struct Grounder<'a> {
    pub(crate) engine: &'a mut Engine,
    pub(crate) db: &'a ClauseDb,
    pub(crate) formula: &'a mut GroundFormula,

    /// The process arena.
    pub(crate) processes: SlotMap<ProcessKey, Process>,

    /// Tabled calls, active and completed, for the lifetime of the query.
    pub(crate) tables: HashMap<TableKey, ProcessKey>,

    /// Current evaluation depth.
    pub(crate) depth: usize,
}

impl<'a> Grounder<'a> {
    pub(crate) fn new(engine: &'a mut Engine, db: &'a ClauseDb, formula: &'a mut GroundFormula) -> Self {
        Grounder {
            engine,
            db,
            formula,
            processes: SlotMap::with_key(),
            tables: HashMap::default(),
            depth: 0,
        }
    }

    /// The formula under construction.
    pub fn formula(&mut self) -> &mut GroundFormula {
        self.formula
    }

    /// Emits a result to a callback process.
    /// For use by builtin implementations.
    pub fn respond(&mut self, callback: ProcessKey, result: &[Term], node: GroundRef) -> Result<(), ErrorKind> {
        self.send_result(callback, result, node)
    }

    /// Emits `complete` to a callback process.
    /// For use by builtin implementations.
    pub fn conclude(&mut self, callback: ProcessKey) -> Result<(), ErrorKind> {
        self.send_complete(callback)
    }

    // Message delivery.

    /// Delivers a result message to `target`, driving its receive handler.
    pub(crate) fn send_result(&mut self, target: ProcessKey, result: &[Term], node: GroundRef) -> Result<(), ErrorKind> {
        let Some(process) = self.processes.get_mut(target) else {
            return Ok(());
        };
        log::trace!(target: targets::MESSAGE, "{} {target:?} receives result ({node}).", process.kind());

        match process {
            // Fan-ins and relays forward results verbatim.
            Process::Or(_) | Process::CycleRelay(_) => self.notify_listeners(target, result, node),

            Process::Collector(p) => {
                p.results.push((node, result.to_vec()));
                Ok(())
            }

            Process::Not(p) => {
                // The bindings are ignored: a negated body must be ground for
                // the negation to be meaningful.
                if node != GroundRef::False {
                    p.collected.push(node);
                }
                Ok(())
            }

            Process::Link(p) => {
                let second = p.second;
                let parent = p.parent;
                let define = p.define;
                self.inspect_exit(second, result);
                let join = self.processes.insert(Process::And(AndProcess {
                    core: ProcessCore::with_listener(parent, Subscribe::Results),
                    first: node,
                }));
                self.eval(second, Bindings::from_slots(result.to_vec(), define), join)
            }

            Process::And(p) => {
                let first = p.first;
                let joined = self.formula.add_and([first, node]);
                self.notify_listeners(target, result, joined)
            }

            Process::BodyReturn(p) => {
                for (index, value) in result.iter().enumerate() {
                    if !value.is_ground() && p.head_counts.get(&index).copied().unwrap_or(0) > 1 {
                        return Err(GroundingError::VariableUnification.into());
                    }
                }
                let output: Vec<Term> = p.head_args.iter().map(|arg| instantiate(arg, result)).collect();
                self.notify_listeners(target, &output, node)
            }

            Process::CallReturn(p) => {
                let mut output = p.slots.clone();
                for (pattern, value) in p.patterns.iter().zip(result) {
                    if unify(value, pattern, Some(&mut output)).is_err() {
                        // The callee's result does not fit the caller's
                        // arguments, e.g. distinct values for one shared
                        // variable. The branch fails.
                        return Ok(());
                    }
                }
                self.notify_listeners(target, &output, node)
            }

            Process::Define(_) => self.define_result(target, result, node),
        }
    }

    /// Delivers a `complete` message to `target`, driving its receive handler.
    pub(crate) fn send_complete(&mut self, target: ProcessKey) -> Result<(), ErrorKind> {
        let Some(process) = self.processes.get_mut(target) else {
            return Ok(());
        };
        log::trace!(target: targets::MESSAGE, "{} {target:?} receives complete.", process.kind());

        match process {
            Process::Or(p) => {
                p.remaining = p.remaining.saturating_sub(1);
                if p.remaining == 0 {
                    self.notify_complete(target)?;
                }
                Ok(())
            }

            Process::Link(p) => {
                // Forwarded immediately: any second-conjunct evaluation this
                // link started has already run to completion under the
                // synchronous schedule.
                let parent = p.parent;
                self.send_complete(parent)
            }

            Process::Not(p) => {
                let saved = std::mem::take(&mut p.saved);
                let collected = std::mem::take(&mut p.collected);
                if collected.is_empty() {
                    // The body had no proof at all: the negation holds
                    // deterministically.
                    self.send_to_result_listeners(target, &saved, GroundRef::True)?;
                } else {
                    let body = self.formula.add_or(collected, true);
                    let negated = self.formula.add_not(body);
                    if negated != GroundRef::False {
                        self.send_to_result_listeners(target, &saved, negated)?;
                    }
                }
                self.notify_complete(target)
            }

            Process::Define(_) => {
                self.define_flush(target, false)?;
                self.notify_complete(target)
            }

            Process::And(_)
            | Process::BodyReturn(_)
            | Process::CallReturn(_)
            | Process::CycleRelay(_)
            | Process::Collector(_) => self.notify_complete(target),
        }
    }

    /// Sends a result from `source` to each of its result listeners.
    pub(crate) fn notify_listeners(&mut self, source: ProcessKey, result: &[Term], node: GroundRef) -> Result<(), ErrorKind> {
        self.send_to_result_listeners(source, result, node)
    }

    fn send_to_result_listeners(&mut self, source: ProcessKey, result: &[Term], node: GroundRef) -> Result<(), ErrorKind> {
        let listeners = match self.processes.get(source) {
            Some(process) => process.core().listeners.clone(),
            None => return Ok(()),
        };
        for (listener, events) in listeners {
            if events.results() {
                self.send_result(listener, result, node)?;
            }
        }
        Ok(())
    }

    /// Marks `source` complete and sends `complete` to each completion listener.
    /// Idempotent: only the first call delivers.
    pub(crate) fn notify_complete(&mut self, source: ProcessKey) -> Result<(), ErrorKind> {
        let listeners = match self.processes.get_mut(source) {
            Some(process) => {
                let core = process.core_mut();
                if core.is_complete {
                    return Ok(());
                }
                core.is_complete = true;
                core.listeners.clone()
            }
            None => return Ok(()),
        };
        for (listener, events) in listeners {
            if events.completion() {
                self.send_complete(listener)?;
            }
        }
        Ok(())
    }

    /// Attaches a listener to `source`.
    ///
    /// Listeners attached to a tabled call catch up immediately: every past
    /// result is replayed in original order, followed by `complete` if the
    /// call has completed.
    pub(crate) fn subscribe(&mut self, source: ProcessKey, listener: ProcessKey, events: Subscribe) -> Result<(), ErrorKind> {
        let replay = match self.processes.get_mut(source) {
            Some(process) => {
                log::trace!(target: targets::MESSAGE, "{} {source:?} connects {listener:?}.", process.kind());
                process.core_mut().listeners.push((listener, events));
                match process {
                    Process::Define(p) => Some((p.results.clone(), p.core.is_complete)),
                    _ => None,
                }
            }
            None => None,
        };

        if let Some((results, complete)) = replay {
            if events.results() {
                for (result, node) in results {
                    self.send_result(listener, &result, node)?;
                }
            }
            if complete && events.completion() {
                self.send_complete(listener)?;
            }
        }
        Ok(())
    }

    // Evaluation.

    /// Evaluates a database node under an environment, reporting to `parent`.
    pub(crate) fn eval(&mut self, node: NodeId, context: Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        self.depth += 1;
        let outcome = self.eval_guarded(node, context, parent);
        self.depth -= 1;
        outcome
    }

    fn eval_guarded(&mut self, node: NodeId, context: Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        if self.depth > self.engine.config.depth_limit {
            log::warn!(target: targets::EVAL, "Depth limit {} exceeded.", self.engine.config.depth_limit);
            return Err(GroundingError::UnboundProgram.into());
        }

        match self.inspect_enter(node, context.slots()) {
            Step::Continue => {}
            Step::Fail => return self.send_complete(parent),
            Step::Abort => return Err(GroundingError::Abort.into()),
        }

        let db = self.db;
        log::trace!(target: targets::EVAL, "Eval node {node} in {context}.");

        match db.node(node) {
            ProgramNode::Empty => return Err(GroundingError::Undefined.into()),
            ProgramNode::Fact(fact) => self.eval_fact(node, fact, &context, parent)?,
            ProgramNode::Choice(choice) => self.eval_choice(choice, &context, parent)?,
            ProgramNode::Define(_) => self.eval_define(node, &context, parent)?,
            ProgramNode::Clause(clause) => self.eval_clause(clause, &context, parent)?,
            ProgramNode::Conj(children) => self.eval_conj(*children, &context, parent)?,
            ProgramNode::Disj(children) => self.eval_disj(children, &context, parent)?,
            ProgramNode::Call(call) => self.eval_call(call, &context, parent)?,
            ProgramNode::Neg(child) => self.eval_neg(*child, &context, parent)?,
        }

        self.inspect_exit(node, context.slots());
        Ok(())
    }

    /// Unifies the fact against the call arguments; on success emits the
    /// fact's own (ground) arguments with a fresh atom.
    fn eval_fact(&mut self, node: NodeId, fact: &FactNode, context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let matched = fact
            .args
            .iter()
            .zip(context.slots())
            .all(|(pattern, call)| unify(pattern, call, None).is_ok());

        if matched {
            let atom = self.formula.add_atom(AtomKey::Fact(node), fact.probability.clone(), None);
            let result = fact.args.clone();
            self.send_result(parent, &result, atom)?;
        }
        self.send_complete(parent)
    }

    /// Emits one result carrying the branch's choice atom, tagged with its
    /// group so the evaluator can impose the sum-to-one constraint.
    fn eval_choice(&mut self, choice: &ChoiceNode, context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let result: Vec<Term> = context.slots().to_vec();
        let probability = instantiate(&choice.probability, context.slots());
        let atom = self.formula.add_atom(
            AtomKey::Choice {
                group: choice.group,
                args: result.clone(),
                choice: choice.choice,
            },
            Some(probability),
            Some((choice.group, result.clone())),
        );
        self.send_result(parent, &result, atom)?;
        self.send_complete(parent)
    }

    /// Unifies call arguments into a fresh environment for the clause head,
    /// then evaluates the body behind a body-return translation.
    fn eval_clause(&mut self, clause: &ClauseNode, context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let mut frame = Bindings::fresh(clause.varcount, context.define);

        for (head, call) in clause.args.iter().zip(context.slots()) {
            // A caller-side slot index carries no value here.
            let call = match call {
                Term::Var(_) => &Term::Unset,
                bound => bound,
            };
            if unify(call, head, Some(frame.slots_mut())).is_err() {
                // Head and call do not unify: the clause contributes nothing.
                return self.send_complete(parent);
            }
        }

        let translate = self.processes.insert(Process::BodyReturn(BodyReturnProcess {
            core: ProcessCore::with_listener(parent, Subscribe::All),
            head_args: clause.args.clone(),
            head_counts: count_vars(&clause.args),
        }));
        self.eval(clause.child, frame, translate)
    }

    /// Evaluates the first conjunct into a link which starts the second per result.
    fn eval_conj(&mut self, children: [NodeId; 2], context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let link = self.processes.insert(Process::Link(LinkProcess {
            second: children[1],
            parent,
            define: context.define,
        }));
        self.eval(children[0], context.clone(), link)
    }

    /// Evaluates every disjunct into a counted fan-in.
    fn eval_disj(&mut self, children: &[NodeId], context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let fan = self.processes.insert(Process::Or(OrProcess {
            core: ProcessCore::with_listener(parent, Subscribe::All),
            remaining: children.len(),
        }));
        if children.is_empty() {
            return self.notify_complete(fan);
        }
        for &child in children {
            self.eval(child, context.clone(), fan)?;
        }
        Ok(())
    }

    /// Evaluates a negated body into a buffering process.
    fn eval_neg(&mut self, child: NodeId, context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let negation = self.processes.insert(Process::Not(NotProcess {
            core: ProcessCore::with_listener(parent, Subscribe::All),
            saved: context.slots().to_vec(),
            collected: Vec::new(),
        }));
        self.eval(child, context.clone(), negation)
    }

    /// Instantiates the call arguments and dispatches to a builtin or to the
    /// called predicate, behind a call-return translation.
    pub(crate) fn eval_call(&mut self, call: &CallNode, context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let call_args: Vec<Term> = call.args.iter().map(|arg| instantiate(arg, context.slots())).collect();

        let translate = self.processes.insert(Process::CallReturn(CallReturnProcess {
            core: ProcessCore::with_listener(parent, Subscribe::All),
            patterns: call.args.clone(),
            slots: context.slots().to_vec(),
        }));

        match call.target {
            CallTarget::Builtin(index) => {
                let builtin = self.engine.builtins[index];
                builtin(self, &call_args, context, translate)
            }

            CallTarget::Node(node) => {
                match self.eval(node, Bindings::from_slots(call_args, context.define), translate) {
                    Err(ErrorKind::Grounding(GroundingError::Undefined)) => {
                        let signature = format!("{}/{}", call.functor, call.args.len());
                        Err(GroundingError::UnknownClause(signature).into())
                    }
                    outcome => outcome,
                }
            }

            CallTarget::Unlinked => Err(GroundingError::UnlinkedDatabase.into()),
        }
    }

    /// Evaluates the root goal and collects its results.
    pub(crate) fn solve(&mut self, define: NodeId, functor: &IString, args: Vec<Term>) -> Result<Vec<(GroundRef, Vec<Term>)>, ErrorKind> {
        let collector = self.processes.insert(Process::Collector(CollectorProcess {
            core: ProcessCore::default(),
            results: Vec::new(),
        }));

        let call = CallNode {
            functor: functor.clone(),
            args: (0..args.len()).map(Term::var).collect(),
            target: CallTarget::Node(define),
        };
        let context = Bindings::from_slots(args, None);
        self.eval_call(&call, &context, collector)?;

        match self.processes.remove(collector) {
            Some(Process::Collector(c)) => Ok(c.results),
            _ => Ok(Vec::new()),
        }
    }

    // Inspection.

    fn inspect_enter(&mut self, node: NodeId, args: &[Term]) -> Step {
        match self.engine.inspector.as_deref_mut() {
            Some(inspector) => inspector.enter(self.depth, node, args),
            None => Step::Continue,
        }
    }

    pub(crate) fn inspect_exit(&mut self, node: NodeId, args: &[Term]) {
        if let Some(inspector) = self.engine.inspector.as_deref_mut() {
            inspector.exit(self.depth, node, args);
        }
    }
}
