//! Routing cancel requests to jobs by id.
//!
//! A cancel action in a notification only carries the job id. The owner of
//! running jobs registers each job's cancellation token here and resolves
//! incoming requests against it.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, error};

use crate::cancel::CancellationToken;
use crate::job::Job;

/// Thread-safe map of job id to cancellation token.
#[derive(Debug, Default)]
pub struct CancelRegistry {
    tokens: RwLock<HashMap<String, CancellationToken>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `job` cancelable by id. Replaces any token registered for the same id.
    pub fn register(&self, job: &Job) {
        match self.tokens.write() {
            Ok(mut tokens) => {
                tokens.insert(job.id().to_string(), job.cancellation_token());
            }
            Err(e) => error!("RwLock poisoned registering job: {e}"),
        }
    }

    /// Cancel the job registered as `id`. Returns false if no such job is known.
    pub fn cancel(&self, id: &str) -> bool {
        match self.tokens.read() {
            Ok(tokens) => match tokens.get(id) {
                Some(token) => {
                    token.cancel();
                    debug!(job_id = %id, "cancel requested");
                    true
                }
                None => {
                    debug!(job_id = %id, "cancel requested for unknown job");
                    false
                }
            },
            Err(e) => {
                error!("RwLock poisoned reading jobs: {e}");
                false
            }
        }
    }

    /// Forget the job registered as `id`. Returns false if it was not registered.
    pub fn remove(&self, id: &str) -> bool {
        match self.tokens.write() {
            Ok(mut tokens) => tokens.remove(id).is_some(),
            Err(e) => {
                error!("RwLock poisoned removing job: {e}");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
