//! # FileOps Engine - Document Job Library
//!
//! A headless engine for copy, move and delete jobs over document endpoints.
//! Designed as the foundation for multiple front ends (CLI, services, automation).
//!
//! ## Overview
//!
//! A job runs once, on a worker thread of the caller's choosing. It features:
//! - A `Created -> Running -> Finished` lifecycle with start/finish callbacks
//! - Cooperative cancellation that is safe to request from any thread
//! - One cached client per endpoint authority, released on cleanup
//! - A failure ledger of documents that could not be processed
//! - Progress, failure and warning payloads for presentation layers
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use engine::{DocumentStack, Job, JobFactory, JobListener, JobProgress, LocalResolver};
//!
//! struct Printer;
//!
//! impl JobListener for Printer {
//!     fn on_start(&self, job: &Job) {
//!         println!("{} started", job);
//!     }
//!     fn on_finished(&self, job: &Job) {
//!         println!("{} finished, {} failed", job, job.failed_files().len());
//!     }
//!     fn on_progress(&self, progress: &JobProgress) {
//!         println!("{}%", progress.percent());
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = LocalResolver::new().with_root("local", "/srv/files");
//! let srcs = vec![resolver.document("local", "inbox/report.pdf")?];
//! let mut stack = DocumentStack::default();
//! stack.push(resolver.document("local", "archive")?);
//!
//! let mut job = JobFactory::new().create_copy(
//!     Arc::new(resolver),
//!     Arc::new(Printer),
//!     "job-1",
//!     stack,
//!     srcs,
//! )?;
//! job.run()?;
//! job.cleanup();
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Documents, stacks, operation types and job states
//! - **error**: Error types and handling
//! - **cancel**: Shared cancellation flag
//! - **ledger**: Per-job record of failed documents
//! - **client**: Endpoint client trait and the per-job client cache
//! - **listener**: Lifecycle and progress callbacks
//! - **notification**: Presentation payloads
//! - **job**: The job lifecycle and operation seam
//! - **operations**: Copy, move and delete bodies
//! - **factory**: Job construction by operation type
//! - **registry**: Cancel routing by job id
//! - **local**: Local filesystem endpoint
//! - **fs_ops**: Low-level filesystem operations

pub mod model;
pub mod error;
pub mod cancel;
pub mod ledger;
pub mod client;
pub mod listener;
pub mod notification;
pub mod job;
pub mod operations;
pub mod factory;
pub mod registry;
pub mod fs_ops;
pub mod local;

#[cfg(test)]
mod testing;

// Re-export main types
pub use model::{build_document_uri, DocumentFlags, DocumentInfo, DocumentStack, JobState, OpType};
pub use error::{JobError, RemoteError};
pub use cancel::CancellationToken;
pub use ledger::FailureLedger;
pub use client::{ClientCache, DocumentClient, EndpointResolver};
pub use listener::{JobListener, JobProgress};
pub use notification::{
    CancelIntent, Category, DialogType, Icon, NavigateIntent, Notification, NotificationAction,
    PluralTemplate, ProgressBar,
};
pub use job::{Job, JobContext, Operation, ProgressLabels};
pub use operations::{CopyOperation, DeleteOperation, MoveOperation};
pub use factory::JobFactory;
pub use registry::CancelRegistry;
pub use local::{LocalClient, LocalResolver};
