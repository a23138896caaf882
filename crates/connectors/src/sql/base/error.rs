use crate::sql::base::session::SessionState;
use thiserror::Error;

/// Errors coming back from a live connection.
#[derive(Debug, Error)]
pub enum DbError {
    /// MySQL driver error, including server-side statement rejections.
    #[error("MySQL error: {0}")]
    MySqlError(#[from] mysql_async::Error),

    /// Writing rows failed at the application level.
    #[error("Write error: {0}")]
    Write(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors happening while establishing a connection.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("MySQL connection failed: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("Invalid sink target: {0}")]
    InvalidTarget(String),

    /// The store could not be reached or refused the handshake.
    #[error("Connection refused: {0}")]
    Refused(String),
}

/// Errors surfaced by [`SinkSession`](crate::sql::base::session::SinkSession).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to open sink connection to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: ConnectorError,
    },

    #[error("Statement execution failed: {message}")]
    Execution {
        message: String,
        #[source]
        source: DbError,
    },

    #[error("Cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}
