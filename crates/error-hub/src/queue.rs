use crate::error::QueueError;
use model::records::error_record::ErrorRecord;
use std::collections::VecDeque;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct QueueState {
    records: VecDeque<ErrorRecord>,
    /// Records ever accepted, flushed or not. Never decremented.
    total: u64,
    sealed: bool,
}

/// FIFO of error records waiting to be flushed, capped by a lifetime limit.
///
/// The lock only guards the in-memory state and is never held across I/O.
#[derive(Debug)]
pub struct ErrorQueue {
    state: Mutex<QueueState>,
    max_error_num: u64,
}

impl ErrorQueue {
    pub fn new(max_error_num: u64) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_error_num,
        }
    }

    /// Appends `record` and returns the new depth.
    pub async fn enqueue(&self, record: ErrorRecord) -> Result<usize, QueueError> {
        let mut state = self.state.lock().await;
        if state.sealed {
            return Err(QueueError::Sealed);
        }
        if state.total >= self.max_error_num {
            return Err(QueueError::Capacity {
                total: state.total,
                limit: self.max_error_num,
            });
        }

        state.records.push_back(record);
        state.total += 1;
        Ok(state.records.len())
    }

    /// Removes and returns up to `n` of the oldest records.
    pub async fn drain_up_to(&self, n: usize) -> Vec<ErrorRecord> {
        let mut state = self.state.lock().await;
        let count = n.min(state.records.len());
        state.records.drain(..count).collect()
    }

    pub async fn depth(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn total(&self) -> u64 {
        self.state.lock().await.total
    }

    /// Depth and total read under one lock.
    pub async fn counters(&self) -> (usize, u64) {
        let state = self.state.lock().await;
        (state.records.len(), state.total)
    }

    /// Stops accepting records; returns how many are still pending.
    pub async fn seal(&self) -> usize {
        let mut state = self.state.lock().await;
        state.sealed = true;
        state.records.len()
    }

    /// Pending count without awaiting, for use from `Drop`.
    pub(crate) fn pending_mut(&mut self) -> usize {
        self.state.get_mut().records.len()
    }
}
