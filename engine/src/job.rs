//! Job lifecycle.
//!
//! A `Job` wraps one bulk document operation (an `Operation`) with everything
//! the operation needs and every guarantee its owner relies on:
//! - a cancellation flag that can be set from any thread
//! - a failure ledger for per-document failures
//! - a cache of endpoint clients, released by `cleanup`
//! - a listener that always sees exactly one start and one finish
//!
//! The owner calls `run` on a worker thread, then `cleanup` once `on_finished`
//! has been delivered and the job's results consumed.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::client::{ClientCache, DocumentClient, EndpointResolver};
use crate::error::{JobError, RemoteError};
use crate::ledger::FailureLedger;
use crate::listener::{JobListener, JobProgress};
use crate::model::{DocumentInfo, DocumentStack, JobState, OpType};
use crate::notification::{
    CancelIntent, Category, DialogType, Icon, NavigateIntent, Notification, PluralTemplate,
    TOUCH_FOR_DETAILS,
};

/// Labels for a variant's ongoing progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLabels {
    pub title: String,
    pub icon: Icon,
    pub action_title: String,
    pub action_icon: Icon,
}

/// The operation-specific part of a job.
///
/// `execute` does the work. It must poll `JobContext::is_canceled` between
/// units of work and stop issuing new ones once it returns true, leaving work
/// already committed in a consistent state. Per-document failures go to
/// `JobContext::on_file_failed`; returning `Err` means the operation as a
/// whole gave up.
///
/// The notification methods read job state and never change it.
pub trait Operation: Send {
    fn op_type(&self) -> OpType;

    fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError>;

    fn progress_labels(&self) -> ProgressLabels;

    fn setup_notification(&self, job: &Job) -> Notification;

    fn failure_notification(&self, job: &Job) -> Notification;

    /// `None` when the operation finished without warnings.
    fn warning_notification(&self, job: &Job) -> Option<Notification> {
        let _ = job;
        None
    }

    /// Determinate progress payload; `None` for operations without progress.
    fn progress_notification(&self, job: &Job, progress: &JobProgress) -> Option<Notification> {
        let _ = (job, progress);
        None
    }

    /// Warning conditions are defined entirely by each operation.
    fn has_warnings(&self) -> bool {
        false
    }
}

/// What an operation body sees of its job while executing.
pub struct JobContext<'a> {
    id: &'a str,
    op_type: OpType,
    stack: &'a DocumentStack,
    token: &'a CancellationToken,
    clients: &'a mut ClientCache,
    failures: &'a mut FailureLedger,
    listener: &'a dyn JobListener,
}

impl<'a> JobContext<'a> {
    pub fn id(&self) -> &str {
        self.id
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn stack(&self) -> &DocumentStack {
        self.stack
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }

    /// Client for the document's authority, acquired on first use.
    pub fn get_client(
        &mut self,
        doc: &DocumentInfo,
    ) -> Result<Arc<dyn DocumentClient>, RemoteError> {
        self.clients.get_client(doc)
    }

    pub fn on_file_failed(&mut self, doc: &DocumentInfo) {
        record_failure(self.id, self.failures, doc);
    }

    pub fn failures(&self) -> &FailureLedger {
        &*self.failures
    }

    /// Delete a document, reporting failure as `false` instead of an error.
    pub fn delete_document(&mut self, doc: &DocumentInfo) -> bool {
        delete_with(self.clients, doc)
    }

    /// Tell the listener how far the operation got.
    pub fn report_progress(&self, completed: usize, total: usize) {
        let progress = JobProgress {
            job_id: self.id.to_string(),
            op_type: self.op_type,
            completed,
            total,
            failed: self.failures.len(),
        };
        self.listener.on_progress(&progress);
    }
}

/// A cancelable unit of bulk document work.
pub struct Job {
    id: String,
    op_type: OpType,
    stack: DocumentStack,
    listener: Arc<dyn JobListener>,
    state: JobState,
    token: CancellationToken,
    failures: FailureLedger,
    clients: ClientCache,
    operation: Box<dyn Operation>,
    progress_builder: Notification,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a job in the `Created` state.
    ///
    /// # Arguments
    /// * `resolver` - Source of endpoint clients for this job
    /// * `listener` - Observer notified of start, progress and finish
    /// * `id` - Caller-chosen identifier, unique among in-flight jobs
    /// * `stack` - Where the user is taken when a notification is touched
    /// * `operation` - The operation body
    ///
    /// # Errors
    /// Returns `JobError::InvalidOperation` if the operation reports
    /// `OpType::Unknown`.
    pub fn new(
        resolver: Arc<dyn EndpointResolver>,
        listener: Arc<dyn JobListener>,
        id: impl Into<String>,
        stack: DocumentStack,
        operation: Box<dyn Operation>,
    ) -> Result<Self, JobError> {
        let op_type = operation.op_type();
        if !op_type.is_known() {
            return Err(JobError::InvalidOperation);
        }

        let id = id.into();
        let labels = operation.progress_labels();
        let progress_builder = progress_template(&id, &stack, labels);

        Ok(Job {
            id,
            op_type,
            stack,
            listener,
            state: JobState::Created,
            token: CancellationToken::new(),
            failures: FailureLedger::new(),
            clients: ClientCache::new(resolver),
            operation,
            progress_builder,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        })
    }

    /// Run the operation to completion.
    ///
    /// Notifies `on_start`, executes the operation, and then notifies
    /// `on_finished` no matter how the operation ended. Errors and panics
    /// escaping the operation are logged and contained.
    ///
    /// # Errors
    /// Returns `JobError::InvalidState` if the job is not in `Created` state;
    /// in that case nothing else happens.
    pub fn run(&mut self) -> Result<(), JobError> {
        if self.state != JobState::Created {
            return Err(JobError::InvalidState {
                id: self.id.clone(),
                state: self.state,
            });
        }

        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        info!(job_id = %self.id, operation = %self.op_type, "job started");

        let listener = Arc::clone(&self.listener);
        listener.on_start(self);

        if let Err(e) = self.execute_contained() {
            // An unmanaged failure still ends in an orderly finish so the
            // owner can release the job.
            error!(job_id = %self.id, error = %e, "operation failed due to an error");
        }

        self.state = JobState::Finished;
        self.finished_at = Some(Utc::now());
        info!(
            job_id = %self.id,
            failures = self.failures.len(),
            canceled = self.is_canceled(),
            "job finished"
        );
        listener.on_finished(self);

        Ok(())
    }

    fn execute_contained(&mut self) -> Result<(), JobError> {
        let Job {
            id,
            op_type,
            stack,
            listener,
            token,
            failures,
            clients,
            operation,
            ..
        } = self;

        let mut ctx = JobContext {
            id: id.as_str(),
            op_type: *op_type,
            stack,
            token,
            clients,
            failures,
            listener: &**listener,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| operation.execute(&mut ctx))) {
            Ok(result) => result,
            Err(payload) => Err(JobError::Panicked(panic_message(payload))),
        }
    }

    /// Release every endpoint client the job acquired.
    ///
    /// Idempotent. Call once the job has finished and its results have been
    /// consumed. Returns the number of clients released.
    pub fn cleanup(&mut self) -> usize {
        if self.state == JobState::Running {
            warn!(job_id = %self.id, "cleanup called while job is running");
        }
        let released = self.clients.release_all();
        debug!(job_id = %self.id, released, "job cleaned up");
        released
    }

    /// Request cancellation. Safe from any thread and in any state.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }

    /// A handle that cancels this job from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn get_client(
        &mut self,
        doc: &DocumentInfo,
    ) -> Result<Arc<dyn DocumentClient>, RemoteError> {
        self.clients.get_client(doc)
    }

    pub fn delete_document(&mut self, doc: &DocumentInfo) -> bool {
        delete_with(&mut self.clients, doc)
    }

    pub fn on_file_failed(&mut self, doc: &DocumentInfo) {
        record_failure(&self.id, &mut self.failures, doc);
    }

    pub fn has_failures(&self) -> bool {
        self.failures.has_failures()
    }

    pub fn has_warnings(&self) -> bool {
        self.operation.has_warnings()
    }

    pub fn failed_files(&self) -> &[DocumentInfo] {
        self.failures.failed_files()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn stack(&self) -> &DocumentStack {
        &self.stack
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    // Presentation

    pub fn setup_notification(&self) -> Notification {
        self.operation.setup_notification(self)
    }

    pub fn failure_notification(&self) -> Notification {
        self.operation.failure_notification(self)
    }

    pub fn warning_notification(&self) -> Option<Notification> {
        self.operation.warning_notification(self)
    }

    pub fn progress_notification(&self, progress: &JobProgress) -> Option<Notification> {
        self.operation.progress_notification(self, progress)
    }

    /// The ongoing-progress template created when the job was constructed.
    pub fn progress_builder(&self) -> &Notification {
        &self.progress_builder
    }

    pub fn create_progress_builder(
        &self,
        title: impl Into<String>,
        icon: Icon,
        action_title: impl Into<String>,
        action_icon: Icon,
    ) -> Notification {
        progress_template(
            &self.id,
            &self.stack,
            ProgressLabels {
                title: title.into(),
                icon,
                action_title: action_title.into(),
                action_icon,
            },
        )
    }

    /// Progress template with an indeterminate bar and `content` as text.
    pub fn setup_notification_with(&self, content: impl Into<String>) -> Notification {
        self.progress_builder
            .clone()
            .progress(0, 0, true)
            .content_text(content)
    }

    /// Error notification titled with the failure count, opening the list of
    /// failed documents when touched.
    pub fn failure_notification_with(&self, title: &PluralTemplate, icon: Icon) -> Notification {
        let failed = self.failures.failed_files().to_vec();
        let intent = self
            .build_navigate_intent()
            .with_dialog(DialogType::Failure, self.op_type, failed);

        Notification::new(title.format(self.failures.len()), icon, Category::Error)
            .content_text(TOUCH_FOR_DETAILS)
            .content_intent(intent)
            .auto_cancel(true)
    }

    pub fn build_navigate_intent(&self) -> NavigateIntent {
        NavigateIntent::browse(self.stack.clone())
    }

    pub fn create_cancel_intent(&self) -> CancelIntent {
        CancelIntent {
            job_id: self.id.clone(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job{{id={}}}", self.id)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("op_type", &self.op_type)
            .field("state", &self.state)
            .field("canceled", &self.is_canceled())
            .field("failures", &self.failures.len())
            .field("clients", &self.clients)
            .finish()
    }
}

fn progress_template(id: &str, stack: &DocumentStack, labels: ProgressLabels) -> Notification {
    Notification::new(labels.title, labels.icon, Category::Progress)
        .content_intent(NavigateIntent::browse(stack.clone()))
        .ongoing(true)
        .action(
            labels.action_icon,
            labels.action_title,
            CancelIntent {
                job_id: id.to_string(),
            },
        )
}

fn record_failure(job_id: &str, failures: &mut FailureLedger, doc: &DocumentInfo) {
    warn!(%job_id, uri = %doc.derived_uri, "document failed");
    failures.record(doc.clone());
}

fn delete_with(clients: &mut ClientCache, doc: &DocumentInfo) -> bool {
    let result = clients
        .get_client(doc)
        .and_then(|client| client.delete_document(&doc.derived_uri));

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(uri = %doc.derived_uri, error = %e, "failed to delete document");
            false
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
