//! Error types for the demo engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the demo session.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: infiltration_core::ConfigError,
    },

    /// A session operation the demo depends on was rejected.
    #[error("game error: {source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: infiltration_rules::GameError,
    },

    /// The `demo` section of the config file could not be read.
    #[error("demo config error: {message}")]
    Demo {
        /// Description of the failure.
        message: String,
    },

    /// The session clock task panicked or was cancelled.
    #[error("clock task failed: {message}")]
    ClockTask {
        /// Description of the join failure.
        message: String,
    },
}
