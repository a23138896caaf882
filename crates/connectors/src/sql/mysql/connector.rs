use crate::sql::base::{
    connection::{SinkConnection, SinkConnector},
    error::{ConnectorError, DbError},
};
use async_trait::async_trait;
use model::execution::target::SinkTarget;
use mysql_async::{Conn, OptsBuilder, prelude::Queryable};
use tracing::{debug, error};

/// Opens one plain `mysql_async` connection per session, without a pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    fn opts(target: &SinkTarget) -> OptsBuilder {
        let password = (!target.password.is_empty()).then(|| target.password.clone());
        OptsBuilder::default()
            .ip_or_hostname(target.host.clone())
            .tcp_port(target.port)
            .user(Some(target.user.clone()))
            .pass(password)
            .db_name(Some(target.database.clone()))
    }
}

#[async_trait]
impl SinkConnector for MySqlConnector {
    async fn connect(&self, target: &SinkTarget) -> Result<Box<dyn SinkConnection>, ConnectorError> {
        target
            .validate()
            .map_err(|issue| ConnectorError::InvalidTarget(issue.to_string()))?;

        debug!(host = %target.host, port = target.port, "Connecting to MySQL");
        let conn = Conn::new(Self::opts(target)).await.map_err(|e| {
            error!(host = %target.host, port = target.port, error = %e, "MySQL connection failed");
            ConnectorError::MySql(e)
        })?;

        Ok(Box::new(MySqlConnection { conn: Some(conn) }))
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}

pub struct MySqlConnection {
    conn: Option<Conn>,
}

#[async_trait]
impl SinkConnection for MySqlConnection {
    async fn execute(&mut self, statement: &str) -> Result<u64, DbError> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| DbError::Unknown("connection already released".to_string()))?;

        conn.query_drop(statement).await?;
        Ok(conn.affected_rows())
    }

    async fn disconnect(&mut self) -> Result<(), DbError> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await?;
        }
        Ok(())
    }
}
