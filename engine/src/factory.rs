//! Job construction.

use std::sync::Arc;

use crate::client::EndpointResolver;
use crate::error::JobError;
use crate::job::Job;
use crate::listener::JobListener;
use crate::model::{DocumentInfo, DocumentStack, OpType};
use crate::operations::{CopyOperation, DeleteOperation, MoveOperation};

/// Builds the copy, move and delete job variants.
///
/// Holds no state; owners that want to substitute jobs in tests can wrap it.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobFactory;

impl JobFactory {
    pub fn new() -> Self {
        JobFactory
    }

    pub fn create_copy(
        &self,
        env: Arc<dyn EndpointResolver>,
        listener: Arc<dyn JobListener>,
        id: impl Into<String>,
        stack: DocumentStack,
        srcs: Vec<DocumentInfo>,
    ) -> Result<Job, JobError> {
        Job::new(env, listener, id, stack, Box::new(CopyOperation::new(srcs)))
    }

    pub fn create_move(
        &self,
        env: Arc<dyn EndpointResolver>,
        listener: Arc<dyn JobListener>,
        id: impl Into<String>,
        stack: DocumentStack,
        srcs: Vec<DocumentInfo>,
        src_parent: DocumentInfo,
    ) -> Result<Job, JobError> {
        Job::new(
            env,
            listener,
            id,
            stack,
            Box::new(MoveOperation::new(srcs, src_parent)),
        )
    }

    pub fn create_delete(
        &self,
        env: Arc<dyn EndpointResolver>,
        listener: Arc<dyn JobListener>,
        id: impl Into<String>,
        stack: DocumentStack,
        srcs: Vec<DocumentInfo>,
        src_parent: DocumentInfo,
    ) -> Result<Job, JobError> {
        Job::new(
            env,
            listener,
            id,
            stack,
            Box::new(DeleteOperation::new(srcs, src_parent)),
        )
    }

    /// Select the variant by operation type.
    ///
    /// # Errors
    /// `InvalidOperation` for `OpType::Unknown`; `MissingSourceParent` when a
    /// move or delete is requested without `src_parent`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        op_type: OpType,
        env: Arc<dyn EndpointResolver>,
        listener: Arc<dyn JobListener>,
        id: impl Into<String>,
        stack: DocumentStack,
        srcs: Vec<DocumentInfo>,
        src_parent: Option<DocumentInfo>,
    ) -> Result<Job, JobError> {
        match (op_type, src_parent) {
            (OpType::Unknown, _) => Err(JobError::InvalidOperation),
            (OpType::Copy, _) => self.create_copy(env, listener, id, stack, srcs),
            (OpType::Move, Some(parent)) => {
                self.create_move(env, listener, id, stack, srcs, parent)
            }
            (OpType::Delete, Some(parent)) => {
                self.create_delete(env, listener, id, stack, srcs, parent)
            }
            (operation, None) => Err(JobError::MissingSourceParent { operation }),
        }
    }
}
