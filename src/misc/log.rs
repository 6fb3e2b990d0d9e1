/*!
Log targets.

Grounding a query produces a lot of traffic --- node evaluations, message
deliveries, table updates --- so each area of the library logs under its own
target, letting output be narrowed to the part under investigation
(e.g. `RUST_LOG=tabling` with an env_logger-style implementation).

Only the [log] facade is used; picking an implementation is left to the
application.
*/

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Logs related to [evaluation dispatch](crate::procedures)
    pub const EVAL: &str = "eval";

    /// Logs related to [tabled predicates](crate::procedures::define)
    pub const TABLING: &str = "tabling";

    /// Logs related to the [ground formula](crate::db::formula)
    pub const FORMULA: &str = "formula";

    /// Logs of `result`/`complete` traffic between [process nodes](crate::procedures::process)
    pub const MESSAGE: &str = "message";

    /// Logs related to the [clause database](crate::db::program)
    pub const DB: &str = "db";
}
