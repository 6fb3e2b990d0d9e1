/*!
Inspection of a query as it runs.

An [Inspector] is notified as evaluation enters and leaves each database
node, with the current depth and call arguments.
The `enter` hook steers evaluation through its returned [Step]: a debugger
front-end can skip a node (behaving as resolution failure there) or abort
the query as a whole.

An inspector is attached to the [engine](crate::engine::Engine); the
default is none, and the hooks cost a check on an option.
*/

use crate::{db::NodeId, structures::term::Term};

/// How evaluation proceeds at an inspected node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Evaluate the node.
    Continue,

    /// Skip the node, as if resolution failed there: the node completes
    /// without results.
    Fail,

    /// Terminate the query with an
    /// [Abort](crate::types::err::GroundingError::Abort) error.
    Abort,
}

/// Hooks around the evaluation of each database node.
pub trait Inspector {
    /// Called before a node is evaluated.
    fn enter(&mut self, depth: usize, node: NodeId, args: &[Term]) -> Step {
        let _ = (depth, node, args);
        Step::Continue
    }

    /// Called after a node is evaluated, and when a tabled call publishes a
    /// fresh result.
    fn exit(&mut self, depth: usize, node: NodeId, args: &[Term]) {
        let _ = (depth, node, args);
    }
}
