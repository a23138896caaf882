use connectors::sql::base::error::SessionError;
use model::execution::target::TargetIssue;
use planner::error::EncodingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Failed to connect to the error sink: {source}")]
    Connection {
        #[source]
        source: SessionError,
    },

    #[error("Failed to write error batch: {message}")]
    Execution {
        message: String,
        #[source]
        source: SessionError,
    },

    #[error("Failed to encode error batch: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Error limit reached: {total} errors accepted, limit is {limit}")]
    Capacity { total: u64, limit: u64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the configuration file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse the configuration as JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid sink target: {0}")]
    Target(#[source] TargetIssue),

    #[error("Invalid error table schema: {0}")]
    Schema(#[from] EncodingError),

    #[error("Invalid setting '{name}': {reason}")]
    Setting { name: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Error limit reached: {total} errors accepted, limit is {limit}")]
    Capacity { total: u64, limit: u64 },

    #[error("Error queue is sealed")]
    Sealed,
}

impl HubError {
    pub fn is_capacity(&self) -> bool {
        matches!(self, HubError::Capacity { .. })
    }
}

impl From<SessionError> for HubError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Connection { .. } => HubError::Connection { source: err },
            SessionError::Execution { .. } => HubError::Execution {
                message: execution_message(&err),
                source: err,
            },
            SessionError::InvalidState { .. } => HubError::InvalidState(err.to_string()),
        }
    }
}

impl From<QueueError> for HubError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Capacity { total, limit } => HubError::Capacity { total, limit },
            QueueError::Sealed => HubError::InvalidState("error hub is closed".to_string()),
        }
    }
}

fn execution_message(err: &SessionError) -> String {
    match err {
        SessionError::Execution { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
