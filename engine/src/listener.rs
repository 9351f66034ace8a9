//! Job observer contract.
//!
//! This module defines the JobListener trait, which decouples a job from
//! whatever owns and schedules it (a worker thread, a service, a test).

use serde::Serialize;

use crate::job::Job;
use crate::model::OpType;

/// Snapshot of a running job's progress, handed to `on_progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub job_id: String,
    pub op_type: OpType,
    /// Source documents handled so far (succeeded, failed, or skipped)
    pub completed: usize,
    pub total: usize,
    pub failed: usize,
}

impl JobProgress {
    /// Completion in whole percent; an empty job counts as complete.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.completed * 100) / self.total) as u32
    }
}

/// Trait for observing a job's lifecycle.
///
/// Every run delivers exactly one `on_start` followed by exactly one
/// `on_finished`, however the operation ends. `on_progress` is only called by
/// operations that report progress (copy and move), always between the two.
///
/// All methods are called synchronously on the job's worker thread.
pub trait JobListener: Send + Sync {
    fn on_start(&self, job: &Job);

    fn on_finished(&self, job: &Job);

    fn on_progress(&self, progress: &JobProgress);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_handles_empty_and_partial_jobs() {
        let mut progress = JobProgress {
            job_id: "j".to_string(),
            op_type: OpType::Copy,
            completed: 0,
            total: 0,
            failed: 0,
        };
        assert_eq!(progress.percent(), 100);

        progress.total = 3;
        progress.completed = 1;
        assert_eq!(progress.percent(), 33);
    }
}
