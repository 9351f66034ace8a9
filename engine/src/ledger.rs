//! Failure accumulation.

use crate::model::DocumentInfo;

/// Append-only record of documents that failed during a job.
#[derive(Debug, Default, Clone)]
pub struct FailureLedger {
    failed: Vec<DocumentInfo>,
}

impl FailureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failed document. No deduplication is performed.
    pub fn record(&mut self, doc: DocumentInfo) {
        self.failed.push(doc);
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failed documents in the order they were recorded.
    pub fn failed_files(&self) -> &[DocumentInfo] {
        &self.failed
    }
}
