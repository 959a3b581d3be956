use thiserror::Error;

/// Unified error type for sslterm.
///
/// Reconciliation itself never produces one of these: blocking and
/// "not ready yet" states are modelled as actions. Errors only come from
/// the edges (loading config, reading the hook context, persisting flags).
#[derive(Error, Debug)]
pub enum SslTermError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid setting {key}: {value:?}")]
    InvalidSetting { key: String, value: String },

    #[error("State error: {0}")]
    State(String),

    #[error("Hook context error: {0}")]
    Context(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SslTermError {
    /// Process exit code used by the agent binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            SslTermError::Config(_) | SslTermError::InvalidSetting { .. } => 78,
            SslTermError::Context(_) | SslTermError::Yaml(_) | SslTermError::Serde(_) => 65,
            SslTermError::State(_) | SslTermError::Io(_) => 74,
        }
    }
}
