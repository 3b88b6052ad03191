use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while constructing a manager or its worker pool.
///
/// Submission and retrieval never fail; only construction does.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start worker pool: {0}")]
    Runtime(#[source] std::io::Error),
}
