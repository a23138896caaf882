use crate::sql::base::{
    connection::{SinkConnection, SinkConnector},
    error::SessionError,
};
use model::execution::target::SinkTarget;
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

/// Owns at most one connection to the destination store.
///
/// `Unopened -> Open -> Closed`, and `Closed -> Open` again on a new
/// [`open`](Self::open). Statements can only be executed while open.
pub struct SinkSession {
    connector: Arc<dyn SinkConnector>,
    conn: Option<Box<dyn SinkConnection>>,
    state: SessionState,
    last_error: Option<String>,
}

impl SinkSession {
    pub fn new(connector: Arc<dyn SinkConnector>) -> Self {
        Self {
            connector,
            conn: None,
            state: SessionState::Unopened,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Diagnostic text of the most recent failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Connects to `target`. A no-op when the session is already open.
    pub async fn open(&mut self, target: &SinkTarget) -> Result<(), SessionError> {
        if self.is_open() {
            return Ok(());
        }

        match self.connector.connect(target).await {
            Ok(conn) => {
                self.conn = Some(conn);
                self.state = SessionState::Open;
                info!(
                    driver = self.connector.name(),
                    host = %target.host,
                    port = target.port,
                    database = %target.database,
                    "Sink session opened"
                );
                Ok(())
            }
            Err(source) => {
                self.last_error = Some(source.to_string());
                Err(SessionError::Connection {
                    target: format!("{}:{}/{}", target.host, target.port, target.database),
                    source,
                })
            }
        }
    }

    pub async fn execute(&mut self, statement: &str) -> Result<u64, SessionError> {
        let state = self.state;
        let Some(conn) = self.conn.as_mut() else {
            return Err(SessionError::InvalidState {
                operation: "execute",
                state,
            });
        };

        match conn.execute(statement).await {
            Ok(affected) => {
                debug!(affected, bytes = statement.len(), "Statement executed");
                Ok(affected)
            }
            Err(source) => {
                let message = source.to_string();
                self.last_error = Some(message.clone());
                Err(SessionError::Execution { message, source })
            }
        }
    }

    /// Releases the connection. Safe to call in any state.
    pub async fn close(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if let Err(e) = conn.disconnect().await {
            warn!(error = %e, "Failed to disconnect sink session cleanly");
            self.last_error = Some(e.to_string());
        }
        self.state = SessionState::Closed;
        info!(driver = self.connector.name(), "Sink session closed");
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unopened => write!(f, "unopened"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}
