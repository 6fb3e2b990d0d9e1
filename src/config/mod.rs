/*!
Configuration of an engine.

All configuration is fixed at engine construction, through [from_config](crate::engine::Engine::from_config).
*/

/// The primary configuration structure.
#[derive(Clone, Debug)]
pub struct Config {
    /// The resolution depth limit.
    ///
    /// Depth equals logical proof depth under the synchronous schedule, so
    /// the limit bounds the host stack too.
    /// Exceeding it surfaces
    /// [UnboundProgram](crate::types::err::GroundingError::UnboundProgram).
    pub depth_limit: usize,

    /// Whether the default builtin set is registered on construction.
    ///
    /// Without it, calls such as `=/2` resolve like ordinary (undefined)
    /// predicates.
    pub default_builtins: bool,
}

impl Default for Config {
    /// Defaults are sized for programs with proofs of moderate depth; raise
    /// the depth limit for deeply recursive programs.
    fn default() -> Self {
        Config {
            depth_limit: 4096,
            default_builtins: true,
        }
    }
}
