/*!
Tabled calls: memoization, late listeners, and cycle handling.

Every call to a predicate instantiation meets at one [DefineProcess], keyed
by `(define node, argument tuple)` and cached for the lifetime of the query.
The first caller creates and executes the process; later callers merely
subscribe, and are caught up by replay.
Two distinct calls with the same key therefore share one process, and each
distinct result tuple maps to exactly one node of the formula --- this is
what makes the ground program a DAG rather than a proof tree.

# Buffered and unbuffered modes

While no cycle has been detected results are *buffered*: each distinct
result tuple holds the list of ground nodes contributing to it, and the
buffer is flushed when the call completes.
A tuple with one contribution is published as-is; one with several becomes a
frozen `or`.
This yields minimal formulas in the common acyclic case.

Detecting a cycle flips the call (and every tabled call between it and the
cycling caller) to *unbuffered* mode: the buffer is flushed immediately, but
published under **mutable** `or` nodes, and later contributions to an
already-published tuple extend its node in place through
[add_disjunct](crate::db::formula::GroundFormula::add_disjunct).
Listeners observe the node id, never the child set, so results can flow
around the cycle before the cycle's proofs are closed.

# Cycle detection

Environments carry a back-pointer to their enclosing tabled call, and these
pointers chain through [parent](crate::procedures::process::DefineProcess::parent).
A repeated call whose caller has the original call on its ancestor chain
closes a cycle: a relay process is installed which listens to the cycle
parent and forwards to the caller, and every call on the chain is marked
cyclic.
The cycle parent completes each registered relay when its own execution
finishes --- the relay's only producer is the parent itself, so nothing else
would ever complete it.
*/

use crate::{
    db::{program::ProgramNode, GroundRef, NodeId},
    misc::log::targets::{self},
    procedures::{
        eval::Grounder,
        process::{
            CycleRelayProcess, DefineProcess, OrProcess, Process, ProcessCore, ProcessKey,
            Subscribe,
        },
    },
    structures::{bindings::Bindings, term::Term},
    types::err::{ErrorKind, FormulaError},
};

impl Grounder<'_> {
    /// Evaluates a call to a tabled predicate.
    ///
    /// The first call for a key allocates and executes a [DefineProcess];
    /// repeat calls subscribe to it, or install a cycle relay when the
    /// caller sits below the call on the ancestor chain.
    pub(crate) fn eval_define(&mut self, node: NodeId, context: &Bindings, parent: ProcessKey) -> Result<(), ErrorKind> {
        let key = (node, context.slots().to_vec());

        if let Some(&process) = self.tables.get(&key) {
            match context.define {
                Some(caller) if self.has_ancestor(caller, process) => {
                    self.close_cycle(process, caller, parent)
                }
                _ => self.subscribe(process, parent, Subscribe::All),
            }
        } else {
            let process = self.processes.insert(Process::Define(DefineProcess::new(
                node,
                context.slots().to_vec(),
                context.define,
            )));
            log::debug!(target: targets::TABLING, "Table {process:?} for node {node} over {context}.");
            self.tables.insert(key, process);
            self.subscribe(process, parent, Subscribe::All)?;
            self.execute_define(process)
        }
    }

    /// Resolves the matching clauses and evaluates each behind a counted
    /// fan-in; when the fan-in completes, so does the call.
    ///
    /// Any cycle relays registered during execution are completed at the
    /// end.
    fn execute_define(&mut self, process: ProcessKey) -> Result<(), ErrorKind> {
        let (node, args) = match self.processes.get(process) {
            Some(Process::Define(p)) => (p.node, p.args.clone()),
            _ => return Ok(()),
        };

        let ProgramNode::Define(define) = self.db.node(node) else {
            panic!("! Tabled a non-define node");
        };
        let children = self.db.matching_clauses(define, &args);

        let fan = self.processes.insert(Process::Or(OrProcess {
            core: ProcessCore::with_listener(process, Subscribe::All),
            remaining: children.len(),
        }));
        if children.is_empty() {
            self.notify_complete(fan)?;
        }
        for child in children {
            self.eval(child, Bindings::from_slots(args.clone(), Some(process)), fan)?;
        }

        let relays = match self.processes.get(process) {
            Some(Process::Define(p)) => p.cycle_children.clone(),
            _ => Vec::new(),
        };
        for relay in relays {
            self.send_complete(relay)?;
        }
        Ok(())
    }

    /// Whether `target` appears on the ancestor chain starting at `from`.
    fn has_ancestor(&self, from: ProcessKey, target: ProcessKey) -> bool {
        let mut current = Some(from);
        while let Some(key) = current {
            if key == target {
                return true;
            }
            current = match self.processes.get(key) {
                Some(Process::Define(p)) => p.parent,
                _ => None,
            };
        }
        false
    }

    /// Installs a cycle relay between `parent` (the cycle parent) and the
    /// caller which closed the cycle, marking the chain in between cyclic.
    fn close_cycle(&mut self, parent: ProcessKey, caller: ProcessKey, listener: ProcessKey) -> Result<(), ErrorKind> {
        log::debug!(target: targets::TABLING, "Cycle: {caller:?} re-enters {parent:?}.");

        let mut current = caller;
        while current != parent {
            self.mark_cyclic(current)?;
            current = match self.processes.get(current) {
                Some(Process::Define(p)) => match p.parent {
                    Some(next) => next,
                    None => break,
                },
                _ => break,
            };
        }
        self.mark_cyclic(parent)?;

        let relay = self.processes.insert(Process::CycleRelay(CycleRelayProcess {
            core: ProcessCore::with_listener(listener, Subscribe::All),
            parent,
        }));
        if let Some(Process::Define(p)) = self.processes.get_mut(parent) {
            p.cycle_children.push(relay);
        }
        // Replays the parent's past results through the relay.
        self.subscribe(parent, relay, Subscribe::All)
    }

    /// Switches a tabled call to unbuffered mode, flushing anything buffered
    /// under mutable nodes.
    /// Idempotent.
    fn mark_cyclic(&mut self, process: ProcessKey) -> Result<(), ErrorKind> {
        match self.processes.get_mut(process) {
            Some(Process::Define(p)) if !p.cyclic => {
                p.cyclic = true;
            }
            _ => return Ok(()),
        }
        log::debug!(target: targets::TABLING, "Table {process:?} goes unbuffered.");
        self.define_flush(process, true)
    }

    /// The result receive handler of a tabled call.
    pub(crate) fn define_result(&mut self, process: ProcessKey, result: &[Term], node: GroundRef) -> Result<(), ErrorKind> {
        let cyclic = match self.processes.get(process) {
            Some(Process::Define(p)) => p.cyclic,
            _ => return Ok(()),
        };
        if cyclic {
            self.define_result_unbuffered(process, result, node)
        } else {
            if let Some(Process::Define(p)) = self.processes.get_mut(process) {
                match p.buffer.iter_mut().find(|(tuple, _)| tuple.as_slice() == result) {
                    Some((_, nodes)) => nodes.push(node),
                    None => p.buffer.push((result.to_vec(), vec![node])),
                }
            }
            Ok(())
        }
    }

    /// In unbuffered mode a fresh tuple is published at once under a mutable
    /// `or`; a repeat tuple extends its published node in place and emits
    /// nothing.
    fn define_result_unbuffered(&mut self, process: ProcessKey, result: &[Term], node: GroundRef) -> Result<(), ErrorKind> {
        let published = match self.processes.get(process) {
            Some(Process::Define(p)) => p
                .results
                .iter()
                .find(|(tuple, _)| tuple.as_slice() == result)
                .map(|(_, node)| *node),
            _ => return Ok(()),
        };

        match published {
            Some(GroundRef::Node(or)) => {
                self.formula.add_disjunct(or, node)?;
                Ok(())
            }

            // Unbuffered results are always published under mutable nodes.
            Some(_) => Err(FormulaError::FrozenDisjunct.into()),

            None => {
                let define_node = match self.processes.get(process) {
                    Some(Process::Define(p)) => p.node,
                    _ => return Ok(()),
                };
                self.inspect_exit(define_node, result);

                let published = self.formula.add_or([node], false);
                if let Some(Process::Define(p)) = self.processes.get_mut(process) {
                    p.results.push((result.to_vec(), published));
                }
                self.notify_listeners(process, result, published)
            }
        }
    }

    /// Flushes the buffer: each tuple is memoized and published.
    ///
    /// Reached on completion (frozen nodes, `cycle = false`) and on the
    /// transition to unbuffered mode (mutable nodes, `cycle = true`).
    pub(crate) fn define_flush(&mut self, process: ProcessKey, cycle: bool) -> Result<(), ErrorKind> {
        let buffer = match self.processes.get_mut(process) {
            Some(Process::Define(p)) => std::mem::take(&mut p.buffer),
            _ => return Ok(()),
        };

        for (tuple, nodes) in buffer {
            let published = if nodes.len() > 1 || cycle {
                self.formula.add_or(nodes, !cycle)
            } else {
                nodes[0]
            };
            if let Some(Process::Define(p)) = self.processes.get_mut(process) {
                p.results.push((tuple.clone(), published));
            }
            self.notify_listeners(process, &tuple, published)?;
        }
        Ok(())
    }
}
