//! Chunk accumulator: holds records between flushes.

use crate::record::TransactionRecord;

/// Default number of pages between flushes.
pub const DEFAULT_CHUNK_PAGES: usize = 50;

/// Ordered records waiting to be written.
pub type Batch = Vec<TransactionRecord>;

/// When a batch goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Flush after this many pages since the previous flush. At least 1.
    pub chunk_pages: usize,
    /// Also flush at the first page boundary where the batch holds at least
    /// this many records. Checked per page, so a batch can end up larger.
    pub flush_after_records: Option<usize>,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            chunk_pages: DEFAULT_CHUNK_PAGES,
            flush_after_records: None,
        }
    }
}

impl FlushPolicy {
    pub fn with_chunk_pages(chunk_pages: usize) -> Self {
        Self {
            chunk_pages: chunk_pages.max(1),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    policy: FlushPolicy,
    batch: Batch,
}

impl ChunkAccumulator {
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            policy,
            batch: Vec::new(),
        }
    }

    pub fn add(&mut self, record: TransactionRecord) {
        self.batch.push(record);
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// True once `pages_since_flush` reaches the page threshold, once the
    /// record threshold is reached, or on the final page when anything is
    /// pending.
    pub fn should_flush(&self, pages_since_flush: usize, is_final_page: bool) -> bool {
        if pages_since_flush >= self.policy.chunk_pages.max(1) {
            return true;
        }
        if is_final_page && !self.batch.is_empty() {
            return true;
        }
        matches!(self.policy.flush_after_records, Some(cap) if self.batch.len() >= cap)
    }

    /// Hand the pending batch to the caller and start over empty.
    pub fn take_and_clear(&mut self) -> Batch {
        std::mem::take(&mut self.batch)
    }
}
