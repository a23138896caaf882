use crate::sql::base::error::{ConnectorError, DbError};
use async_trait::async_trait;
use model::execution::target::SinkTarget;

/// One open connection to the destination store.
#[async_trait]
pub trait SinkConnection: Send {
    /// Runs a single statement and returns the number of affected rows.
    async fn execute(&mut self, statement: &str) -> Result<u64, DbError>;

    /// Releases the connection. Calling it twice must be harmless.
    async fn disconnect(&mut self) -> Result<(), DbError>;
}

/// Opens connections to the destination store.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    async fn connect(&self, target: &SinkTarget) -> Result<Box<dyn SinkConnection>, ConnectorError>;

    /// Short driver name for diagnostics, e.g. "mysql".
    fn name(&self) -> &'static str;
}
