//! Error types for evaluation, configuration and dispatch

/// Error from the evaluation path
#[derive(Debug, thiserror::Error)]
pub enum VelocityError {
    /// The category has no configured limits. No ceiling is ever assumed.
    #[error("no velocity limits configured for category '{category}'")]
    ConfigNotFound {
        /// Category that was looked up
        category: Box<str>,
    },
    /// Category resolution failed; callers fall back to the default category
    #[error("category resolver unavailable: {0}")]
    ResolverUnavailable(Box<str>),
    /// The configuration provider itself failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl VelocityError {
    /// Check if this error is a missing category configuration
    pub fn is_config_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. })
    }
}

/// Error from configuration loading or lookup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Backing source could not be reached
    #[error("configuration source error: {0}")]
    Source(Box<str>),
    /// Malformed TOML document
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Well-formed but rejected by validation
    #[error("invalid configuration: {0}")]
    Invalid(Box<str>),
}

/// Error from an action dispatcher. Logged, never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The dispatcher reported an error
    #[error("dispatch failed: {0}")]
    Failed(Box<str>),
    /// No answer within the configured deadline, in milliseconds
    #[error("dispatch timed out after {0}ms")]
    TimedOut(u64),
}
