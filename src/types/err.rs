/*!
Error types used in the library.

- Some of these are internally expected --- e.g. unification errors are used to control the flow of resolution, and silent failure of a branch is the common case.
- Others are external --- e.g. a query over a program which calls an undefined predicate returns an `UnknownClause` error naming the predicate.

A resolution branch which merely fails to produce a proof is never an error.
Branch failure is expressed as the absence of results, see [the procedures](crate::procedures).
*/

/// A union of varied error kinds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// An error while grounding a query.
    Grounding(GroundingError),

    /// An error in the ground formula.
    Formula(FormulaError),
}

/// Errors while grounding a query.
///
/// Each of these terminates the query as a whole, in contrast to the silent failure of a resolution branch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroundingError {
    /// An internal marker for a call which expanded to the empty placeholder node.
    ///
    /// Rewritten to [UnknownClause](GroundingError::UnknownClause) where the calling predicate is known, and so never returned from a query.
    Undefined,

    /// A call to a predicate with no clauses, as `"name/arity"`.
    UnknownClause(String),

    /// An attempt to unify two unbound variables.
    VariableUnification,

    /// A query term containing variable slot indices.
    ///
    /// Slot indices are only meaningful relative to a clause activation.
    /// Query variables are written as unset values.
    NonGroundQuery,

    /// The resolution depth limit was exceeded.
    ///
    /// As proofs are collected exhaustively, a program without a finite grounding exhausts any depth limit.
    UnboundProgram,

    /// The query was terminated by the [inspector](crate::engine::inspect).
    Abort,

    /// A query was made against a database whose call nodes have not been linked.
    ///
    /// See [prepare](crate::engine::Engine::prepare).
    UnlinkedDatabase,

    /// An error while evaluating the numeric value of a term.
    Value(ValueError),
}

impl From<GroundingError> for ErrorKind {
    fn from(e: GroundingError) -> Self {
        ErrorKind::Grounding(e)
    }
}

/// Errors in the ground formula.
///
/// These indicate misuse of the formula, and are unexpected during grounding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormulaError {
    /// An attempt to extend a read-only disjunction.
    ///
    /// Only `or` nodes created as mutable accept further disjuncts.
    FrozenDisjunct,

    /// A node id with no corresponding node.
    MissingNode,
}

impl From<FormulaError> for ErrorKind {
    fn from(e: FormulaError) -> Self {
        ErrorKind::Formula(e)
    }
}

/// Errors during unification.
///
/// These are internal --- a unification mismatch is the ordinary failure of a resolution branch, and is never surfaced.
/// [Variables](UnifyError::Variables) is promoted to [VariableUnification](GroundingError::VariableUnification) at the points where the engine requires at least one side to be bound.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnifyError {
    /// The terms have conflicting structure.
    Mismatch,

    /// Both terms are unbound variables.
    Variables,
}

/// Errors while evaluating the numeric value of a term.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueError {
    /// The term contains an unbound variable.
    Unbound,

    /// The term is not a numeric constant or arithmetic compound.
    NonNumeric,

    /// Integer division by zero.
    DivisionByZero,
}

impl From<ValueError> for GroundingError {
    fn from(e: ValueError) -> Self {
        GroundingError::Value(e)
    }
}

impl From<ValueError> for ErrorKind {
    fn from(e: ValueError) -> Self {
        ErrorKind::Grounding(GroundingError::Value(e))
    }
}
