//! Error types for the job engine.
//!
//! `JobError` covers structural failures: a job that cannot be built, run, or
//! whose operation body gave up. `RemoteError` covers failures talking to an
//! endpoint. Per-document failures are not errors; they are recorded in the
//! job's failure ledger.

use std::io;
use thiserror::Error;

use crate::model::{JobState, OpType};

/// Failures reported by an endpoint or its client handle.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No endpoint is registered for the authority
    #[error("unknown authority: {authority}")]
    UnknownAuthority { authority: String },

    /// The handle was used after being released
    #[error("client for {authority} has been released")]
    Released { authority: String },

    /// The endpoint does not implement the request
    #[error("{operation} is not supported by {authority}")]
    Unsupported {
        authority: String,
        operation: &'static str,
    },

    /// The uri does not name a document of this endpoint
    #[error("invalid document uri for {authority}: {uri}")]
    InvalidUri { authority: String, uri: String },

    /// The endpoint failed while serving the request
    #[error("endpoint i/o failed for {uri}")]
    Io {
        uri: String,
        #[source]
        source: io::Error,
    },
}

impl RemoteError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Io { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Job-level errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Construction with the `Unknown` operation sentinel
    #[error("operation type must not be unknown")]
    InvalidOperation,

    /// `run` called on a job that already ran
    #[error("job {id} cannot run from state {state}")]
    InvalidState { id: String, state: JobState },

    /// Move or delete requested without the sources' parent directory
    #[error("{operation} requires the source parent directory")]
    MissingSourceParent { operation: OpType },

    /// Copy or move without a destination in the document stack
    #[error("no destination directory in the document stack")]
    NoDestination,

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A panic escaped the operation body
    #[error("operation panicked: {0}")]
    Panicked(String),
}
