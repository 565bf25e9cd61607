//! Bounded FIFO history of relayed messages.

use std::collections::VecDeque;

use super::MessageRecord;

/// Maximum number of records retained in memory.
pub const HISTORY_CAPACITY: usize = 100;

/// Number of trailing records replayed to a newly connected session.
pub const SESSION_REPLAY_LEN: usize = 50;

/// Insertion-ordered buffer of the most recent [`MessageRecord`]s.
///
/// When full, the oldest record is evicted first. Not persisted; the
/// buffer lives and dies with the process.
#[derive(Debug)]
pub struct HistoryBuffer {
    records: VecDeque<MessageRecord>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Creates an empty buffer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Creates an empty buffer with a custom capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest when at capacity.
    pub fn push(&mut self, record: MessageRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Returns the trailing `n` records in original relative order.
    #[must_use]
    pub fn tail(&self, n: usize) -> Vec<MessageRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }

    /// Returns the number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
