#![allow(dead_code)]

use async_trait::async_trait;
use connectors::sql::base::{
    connection::{SinkConnection, SinkConnector},
    error::{ConnectorError, DbError},
};
use error_hub::{ErrorHub, HubSettings};
use model::{execution::target::SinkTarget, records::error_record::ErrorRecord};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Message prefix of every record built by [`record`].
const RECORD_MARKER: &str = "'bad row ";

/// Shared view of everything the fake sink has seen.
#[derive(Default)]
pub struct Recorder {
    statements: Mutex<Vec<String>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub open_connections: AtomicUsize,
    pub fail_connect: AtomicBool,
    pub fail_execute: AtomicBool,
    /// Milliseconds each statement takes.
    pub execute_delay_ms: AtomicU64,
}

impl Recorder {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn open_connections(&self) -> usize {
        self.open_connections.load(Ordering::SeqCst)
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_execute(&self, fail: bool) {
        self.fail_execute.store(fail, Ordering::SeqCst);
    }

    pub fn set_execute_delay(&self, delay: Duration) {
        self.execute_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

pub struct RecordingConnector(pub Arc<Recorder>);

struct RecordingConnection {
    recorder: Arc<Recorder>,
    released: bool,
}

#[async_trait]
impl SinkConnector for RecordingConnector {
    async fn connect(&self, _target: &SinkTarget) -> Result<Box<dyn SinkConnection>, ConnectorError> {
        if self.0.fail_connect.load(Ordering::SeqCst) {
            return Err(ConnectorError::Refused(
                "Can't connect to MySQL server".to_string(),
            ));
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        self.0.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingConnection {
            recorder: self.0.clone(),
            released: false,
        }))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[async_trait]
impl SinkConnection for RecordingConnection {
    async fn execute(&mut self, statement: &str) -> Result<u64, DbError> {
        let delay = self.recorder.execute_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.recorder.fail_execute.load(Ordering::SeqCst) {
            return Err(DbError::Write("Lost connection to MySQL server during query".to_string()));
        }
        self.recorder
            .statements
            .lock()
            .unwrap()
            .push(statement.to_string());
        Ok(row_count(statement) as u64)
    }

    async fn disconnect(&mut self) -> Result<(), DbError> {
        if !self.released {
            self.released = true;
            self.recorder.disconnects.fetch_add(1, Ordering::SeqCst);
            self.recorder.open_connections.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub fn target() -> SinkTarget {
    SinkTarget::new("10.0.0.5", 9030, "loader", "s3cret", "load_errors", "error_log")
}

pub fn hub(settings: HubSettings) -> (Arc<ErrorHub>, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let connector = Arc::new(RecordingConnector(recorder.clone()));
    let hub = ErrorHub::new(target(), settings, connector).unwrap();
    (Arc::new(hub), recorder)
}

pub fn record(i: u64) -> ErrorRecord {
    ErrorRecord::for_job(7, format!("bad row {i}")).with_line(i)
}

/// Number of rows built from [`record`] in an INSERT statement.
pub fn row_count(statement: &str) -> usize {
    statement.matches(RECORD_MARKER).count()
}
