/// Failure to build a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidGrid { width: usize, height: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure to load or validate a [`crate::SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
