use super::LoadErrorHub;
use crate::error::HubError;
use async_trait::async_trait;
use model::records::error_record::ErrorRecord;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Hub for jobs configured without an error table: counts records and
/// persists nothing.
#[derive(Debug, Default)]
pub struct NullErrorHub {
    total: AtomicU64,
    closed: AtomicBool,
}

impl NullErrorHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_error_num(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LoadErrorHub for NullErrorHub {
    async fn prepare(&self) -> Result<(), HubError> {
        Ok(())
    }

    async fn export_error(&self, record: ErrorRecord) -> Result<(), HubError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HubError::InvalidState(
                "cannot export to a closed error hub".to_string(),
            ));
        }
        trace!(message = %record.message, "Discarding error record");
        self.total.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&self) -> Result<(), HubError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn debug_string(&self) -> String {
        format!("NullErrorHub(total={})", self.total_error_num())
    }
}
