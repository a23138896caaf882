use crate::{
    error::{ConfigError, HubError, QueueError},
    metrics::{HubMetrics, MetricsSnapshot},
    queue::ErrorQueue,
    settings::{HubConfig, HubSettings},
};
use async_trait::async_trait;
use connectors::sql::{
    base::{connection::SinkConnector, session::SinkSession},
    mysql::connector::MySqlConnector,
};
use model::{execution::target::SinkTarget, records::error_record::ErrorRecord};
use planner::query::BatchBuilder;
use std::{
    fmt::Write as _,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub mod null;

/// What a load job needs from an error sink.
#[async_trait]
pub trait LoadErrorHub: Send + Sync {
    async fn prepare(&self) -> Result<(), HubError>;

    async fn export_error(&self, record: ErrorRecord) -> Result<(), HubError>;

    async fn close(&self) -> Result<(), HubError>;

    async fn debug_string(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
enum FlushTrigger {
    Threshold,
    Close,
}

impl FlushTrigger {
    fn as_str(self) -> &'static str {
        match self {
            FlushTrigger::Threshold => "threshold",
            FlushTrigger::Close => "close",
        }
    }
}

/// State touched only while flushing, behind its own lock.
struct Flusher {
    session: SinkSession,
    builder: BatchBuilder,
}

/// Collects failed-row records from concurrent producers and writes them
/// to a relational table in bounded batches.
///
/// Delivery is at most once: a batch that fails to build or write is
/// reported to the caller that triggered the flush and then dropped.
pub struct ErrorHub {
    target: SinkTarget,
    settings: HubSettings,
    driver: &'static str,
    queue: ErrorQueue,
    flusher: Mutex<Flusher>,
    metrics: HubMetrics,
    closed: AtomicBool,
    limit_logged: AtomicBool,
}

impl ErrorHub {
    pub fn new(
        target: SinkTarget,
        settings: HubSettings,
        connector: Arc<dyn SinkConnector>,
    ) -> Result<Self, HubError> {
        settings.validate()?;
        let builder = BatchBuilder::new(
            settings.schema.clone(),
            settings.encoding_policy,
            settings.max_line_size,
        )
        .map_err(ConfigError::Schema)?;

        Ok(Self {
            driver: connector.name(),
            queue: ErrorQueue::new(settings.max_error_num),
            flusher: Mutex::new(Flusher {
                session: SinkSession::new(connector),
                builder,
            }),
            metrics: HubMetrics::new(),
            closed: AtomicBool::new(false),
            limit_logged: AtomicBool::new(false),
            target,
            settings,
        })
    }

    /// Hub writing through a plain MySQL connection.
    pub fn mysql(target: SinkTarget, settings: HubSettings) -> Result<Self, HubError> {
        Self::new(target, settings, Arc::new(MySqlConnector::new()))
    }

    /// Builds a hub from loaded configuration; settings are validated by `new`.
    pub fn from_config(config: HubConfig, connector: Arc<dyn SinkConnector>) -> Result<Self, HubError> {
        config.target.validate().map_err(ConfigError::Target)?;
        Self::new(config.target, config.settings, connector)
    }

    pub async fn depth(&self) -> usize {
        self.queue.depth().await
    }

    pub async fn total_error_num(&self) -> u64 {
        self.queue.total().await
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Validates the target and opens the sink session.
    ///
    /// Calling it again while the session is open does nothing. Skipping it
    /// is allowed too: the first flush opens the session on demand.
    pub async fn prepare(&self) -> Result<(), HubError> {
        self.target.validate().map_err(ConfigError::Target)?;

        // close sets the flag under the same lock
        let mut flusher = self.flusher.lock().await;
        if self.is_closed() {
            return Err(HubError::InvalidState(
                "cannot prepare a closed error hub".to_string(),
            ));
        }
        flusher.session.open(&self.target).await?;
        debug!(table = %self.target.table, "Error hub prepared");
        Ok(())
    }

    /// Queues one record, flushing synchronously when the batch threshold
    /// is reached.
    pub async fn export_error(&self, record: ErrorRecord) -> Result<(), HubError> {
        if self.is_closed() {
            return Err(HubError::InvalidState(
                "cannot export to a closed error hub".to_string(),
            ));
        }

        let depth = match self.queue.enqueue(record).await {
            Ok(depth) => depth,
            Err(QueueError::Capacity { total, limit }) => {
                self.metrics.increment_rejected(1);
                if !self.limit_logged.swap(true, Ordering::SeqCst) {
                    warn!(
                        total,
                        limit,
                        table = %self.target.table,
                        "Error limit reached; further error records are rejected"
                    );
                }
                return Err(HubError::Capacity { total, limit });
            }
            Err(e) => return Err(e.into()),
        };

        debug!(depth, "Error record queued");
        if depth >= self.settings.batch_threshold {
            self.flush_threshold().await?;
        }
        Ok(())
    }

    /// Flushes everything still queued, then releases the connection.
    ///
    /// Every batch is attempted even after an earlier one failed; the first
    /// failure is returned. Later calls are no-ops.
    pub async fn close(&self) -> Result<(), HubError> {
        // a second close blocks here until the first has finished flushing
        let mut flusher = self.flusher.lock().await;
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let pending = self.queue.seal().await;
        let mut first_error = None;

        loop {
            let batch = self.queue.drain_up_to(self.settings.batch_threshold).await;
            if batch.is_empty() {
                break;
            }
            if let Err(e) = self.write_batch(&mut flusher, &batch, FlushTrigger::Close).await {
                first_error.get_or_insert(e);
            }
        }

        flusher.session.close().await;

        let total = self.queue.total().await;
        let snapshot = self.metrics.snapshot();
        info!(
            table = %self.target.qualified_table(),
            pending,
            total,
            records_flushed = snapshot.records_flushed,
            records_lost = snapshot.records_lost,
            "Error hub closed"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// One-line diagnostic summary. Never includes the password.
    pub async fn debug_string(&self) -> String {
        let (depth, total) = self.queue.counters().await;
        let snapshot = self.metrics.snapshot();

        let mut out = format!(
            "ErrorHub(driver={}, host={}, port={}, database={}, table={}, depth={}, total={}, limit={}, batch_threshold={}, flushed={}, lost={}",
            self.driver,
            self.target.host,
            self.target.port,
            self.target.database,
            self.target.table,
            depth,
            total,
            self.settings.max_error_num,
            self.settings.batch_threshold,
            snapshot.records_flushed,
            snapshot.records_lost,
        );

        // a flush in progress holds the lock; report that instead of waiting
        match self.flusher.try_lock() {
            Ok(flusher) => {
                let _ = write!(out, ", session={}", flusher.session.state());
                if let Some(last) = flusher.session.last_error() {
                    let _ = write!(out, ", last_error={last}");
                }
            }
            Err(_) => out.push_str(", session=flushing"),
        }
        out.push(')');
        out
    }

    async fn flush_threshold(&self) -> Result<(), HubError> {
        let mut flusher = self.flusher.lock().await;

        // another producer may have flushed while we waited
        if self.queue.depth().await < self.settings.batch_threshold {
            return Ok(());
        }

        let batch = self.queue.drain_up_to(self.settings.batch_threshold).await;
        if batch.is_empty() {
            return Ok(());
        }
        self.write_batch(&mut flusher, &batch, FlushTrigger::Threshold)
            .await
            .map(|_| ())
    }

    /// Builds and writes one drained batch. Returns the rows written.
    async fn write_batch(
        &self,
        flusher: &mut Flusher,
        batch: &[ErrorRecord],
        trigger: FlushTrigger,
    ) -> Result<usize, HubError> {
        let started = Instant::now();
        let lost = batch.len() as u64;

        let rendered = match flusher.builder.build(&self.target.table, batch) {
            Ok(rendered) => rendered,
            Err(e) => {
                self.metrics.record_failed_batch(lost);
                error!(
                    trigger = trigger.as_str(),
                    records = batch.len(),
                    error = %e,
                    "Failed to encode error batch; batch dropped"
                );
                return Err(e.into());
            }
        };

        for skipped in &rendered.skipped {
            warn!(
                trigger = trigger.as_str(),
                index = skipped.index,
                error = %skipped.error,
                "Error record skipped during encoding"
            );
        }
        self.metrics.increment_skipped(rendered.skipped.len() as u64);

        if !flusher.session.is_open() {
            if let Err(e) = flusher.session.open(&self.target).await {
                self.metrics.record_failed_batch(rendered.rows as u64);
                error!(
                    trigger = trigger.as_str(),
                    records = rendered.rows,
                    host = %self.target.host,
                    error = %e,
                    "Failed to open error sink; batch dropped"
                );
                return Err(e.into());
            }
        }

        match flusher.session.execute(&rendered.sql).await {
            Ok(affected) => {
                self.metrics.record_flush(rendered.rows as u64);
                info!(
                    trigger = trigger.as_str(),
                    table = %self.target.table,
                    rows = rendered.rows,
                    affected,
                    skipped = rendered.skipped.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Flushed error batch"
                );
                Ok(rendered.rows)
            }
            Err(e) => {
                self.metrics.record_failed_batch(rendered.rows as u64);
                error!(
                    trigger = trigger.as_str(),
                    table = %self.target.table,
                    records = rendered.rows,
                    error = %e,
                    "Failed to write error batch; batch dropped"
                );
                // reconnect on the next flush
                flusher.session.close().await;
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl LoadErrorHub for ErrorHub {
    async fn prepare(&self) -> Result<(), HubError> {
        ErrorHub::prepare(self).await
    }

    async fn export_error(&self, record: ErrorRecord) -> Result<(), HubError> {
        ErrorHub::export_error(self, record).await
    }

    async fn close(&self) -> Result<(), HubError> {
        ErrorHub::close(self).await
    }

    async fn debug_string(&self) -> String {
        ErrorHub::debug_string(self).await
    }
}

impl Drop for ErrorHub {
    fn drop(&mut self) {
        let pending = self.queue.pending_mut();
        if pending > 0 {
            warn!(
                pending,
                table = %self.target.table,
                "Error hub dropped without close; pending error records are lost"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::sql::base::{connection::SinkConnection, error::ConnectorError};
    use tracing_test::traced_test;

    struct OfflineConnector;

    #[async_trait]
    impl SinkConnector for OfflineConnector {
        async fn connect(&self, _target: &SinkTarget) -> Result<Box<dyn SinkConnection>, ConnectorError> {
            Err(ConnectorError::Refused("offline".to_string()))
        }

        fn name(&self) -> &'static str {
            "offline"
        }
    }

    fn hub() -> ErrorHub {
        let target = SinkTarget::new("localhost", 3306, "loader", "", "load_errors", "error_log");
        ErrorHub::new(target, HubSettings::default(), Arc::new(OfflineConnector)).unwrap()
    }

    #[traced_test]
    #[tokio::test]
    async fn test_drop_with_pending_records_warns() {
        let hub = hub();
        hub.export_error(ErrorRecord::for_job(1, "bad row")).await.unwrap();
        hub.export_error(ErrorRecord::for_job(1, "worse row")).await.unwrap();
        drop(hub);

        assert!(logs_contain("pending error records are lost"));
        assert!(logs_contain("pending=2"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_drop_after_close_is_quiet() {
        let hub = hub();
        hub.close().await.unwrap();
        drop(hub);

        assert!(!logs_contain("pending error records are lost"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_from_config_warns_once_for_low_limit() {
        let target = SinkTarget::new("localhost", 3306, "loader", "", "load_errors", "error_log");
        let config = HubConfig::new(target, HubSettings::default());
        let _hub = ErrorHub::from_config(config, Arc::new(OfflineConnector)).unwrap();

        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("records are flushed on close only"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one warning, saw {n}")),
            }
        });
    }
}
