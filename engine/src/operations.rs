//! Copy, move and delete operations.
//!
//! Each operation walks its source documents in order, checks for
//! cancellation before every document, and records per-document failures in
//! the job's ledger instead of giving up. The actual transfer is done by the
//! endpoint clients.

use tracing::{debug, info, warn};

use crate::error::{JobError, RemoteError};
use crate::job::{Job, JobContext, Operation, ProgressLabels};
use crate::listener::JobProgress;
use crate::model::{DocumentInfo, OpType};
use crate::notification::{
    Category, DialogType, Icon, Notification, PluralTemplate, TOUCH_FOR_DETAILS,
};

const COPY_FAILURE: PluralTemplate =
    PluralTemplate::new("Couldn't copy {count} file", "Couldn't copy {count} files");
const COPY_WARNING: PluralTemplate = PluralTemplate::new(
    "{count} virtual file wasn't copied",
    "{count} virtual files weren't copied",
);
const MOVE_FAILURE: PluralTemplate =
    PluralTemplate::new("Couldn't move {count} file", "Couldn't move {count} files");
const MOVE_WARNING: PluralTemplate = PluralTemplate::new(
    "{count} file was copied but not removed",
    "{count} files were copied but not removed",
);
const DELETE_FAILURE: PluralTemplate =
    PluralTemplate::new("Couldn't delete {count} file", "Couldn't delete {count} files");

/// Warning notification listing `documents`, or `None` if there are none.
fn warning_with(
    job: &Job,
    template: &PluralTemplate,
    documents: &[DocumentInfo],
) -> Option<Notification> {
    if documents.is_empty() {
        return None;
    }
    let intent = job
        .build_navigate_intent()
        .with_dialog(DialogType::Warning, job.op_type(), documents.to_vec());

    Some(
        Notification::new(template.format(documents.len()), Icon::Warning, Category::Status)
            .content_text(TOUCH_FOR_DETAILS)
            .content_intent(intent)
            .auto_cancel(true),
    )
}

/// Determinate progress built on the job's progress template.
fn progress_with(job: &Job, progress: &JobProgress) -> Notification {
    job.progress_builder()
        .clone()
        .progress(progress.total as u64, progress.completed as u64, false)
        .content_text(format!(
            "{}% - {} of {}",
            progress.percent(),
            progress.completed,
            progress.total
        ))
}

fn destination(ctx: &JobContext<'_>) -> Result<DocumentInfo, JobError> {
    ctx.stack().peek().cloned().ok_or(JobError::NoDestination)
}

fn copy_one(
    ctx: &mut JobContext<'_>,
    src: &DocumentInfo,
    dest: &DocumentInfo,
) -> Result<DocumentInfo, RemoteError> {
    let client = ctx.get_client(src)?;
    client.copy_document(src, dest)
}

/// Copies source documents into the destination at the top of the stack.
///
/// Virtual documents have no bytes to copy; they are skipped and reported as
/// warnings rather than failures.
#[derive(Debug, Clone)]
pub struct CopyOperation {
    srcs: Vec<DocumentInfo>,
    skipped: Vec<DocumentInfo>,
}

impl CopyOperation {
    pub fn new(srcs: Vec<DocumentInfo>) -> Self {
        CopyOperation {
            srcs,
            skipped: Vec::new(),
        }
    }

    pub fn sources(&self) -> &[DocumentInfo] {
        &self.srcs
    }

    pub fn skipped(&self) -> &[DocumentInfo] {
        &self.skipped
    }
}

impl Operation for CopyOperation {
    fn op_type(&self) -> OpType {
        OpType::Copy
    }

    fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        let dest = destination(ctx)?;
        let total = self.srcs.len();

        for (index, src) in self.srcs.iter().enumerate() {
            if ctx.is_canceled() {
                info!(job_id = %ctx.id(), remaining = total - index, "copy canceled");
                break;
            }

            if src.flags.is_virtual {
                debug!(uri = %src.derived_uri, "skipping virtual document");
                self.skipped.push(src.clone());
            } else if let Err(e) = copy_one(ctx, src, &dest) {
                warn!(uri = %src.derived_uri, error = %e, "copy failed");
                ctx.on_file_failed(src);
            }

            ctx.report_progress(index + 1, total);
        }

        Ok(())
    }

    fn progress_labels(&self) -> ProgressLabels {
        ProgressLabels {
            title: "Copying files".to_string(),
            icon: Icon::Copy,
            action_title: "Cancel".to_string(),
            action_icon: Icon::Cancel,
        }
    }

    fn setup_notification(&self, job: &Job) -> Notification {
        job.setup_notification_with("Preparing to copy...")
    }

    fn failure_notification(&self, job: &Job) -> Notification {
        job.failure_notification_with(&COPY_FAILURE, Icon::Error)
    }

    fn warning_notification(&self, job: &Job) -> Option<Notification> {
        warning_with(job, &COPY_WARNING, &self.skipped)
    }

    fn progress_notification(&self, job: &Job, progress: &JobProgress) -> Option<Notification> {
        Some(progress_with(job, progress))
    }

    fn has_warnings(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Moves source documents out of `src_parent` into the destination at the top
/// of the stack.
///
/// Uses the endpoint's native move when source and destination share an
/// authority; otherwise copies and then deletes the source. Sources that
/// cannot be deleted stay behind and are reported as warnings.
#[derive(Debug, Clone)]
pub struct MoveOperation {
    srcs: Vec<DocumentInfo>,
    src_parent: DocumentInfo,
    not_removed: Vec<DocumentInfo>,
}

enum MoveOutcome {
    Moved,
    CopiedNotRemoved,
    Failed,
}

impl MoveOperation {
    pub fn new(srcs: Vec<DocumentInfo>, src_parent: DocumentInfo) -> Self {
        MoveOperation {
            srcs,
            src_parent,
            not_removed: Vec::new(),
        }
    }

    pub fn sources(&self) -> &[DocumentInfo] {
        &self.srcs
    }

    pub fn src_parent(&self) -> &DocumentInfo {
        &self.src_parent
    }

    pub fn not_removed(&self) -> &[DocumentInfo] {
        &self.not_removed
    }

    fn move_one(
        ctx: &mut JobContext<'_>,
        src: &DocumentInfo,
        src_parent: &DocumentInfo,
        dest: &DocumentInfo,
    ) -> MoveOutcome {
        if src.authority == dest.authority && src.flags.supports_move {
            let moved = ctx
                .get_client(src)
                .and_then(|client| client.move_document(src, src_parent, dest));
            match moved {
                Ok(_) => return MoveOutcome::Moved,
                Err(RemoteError::Unsupported { .. }) => {
                    debug!(uri = %src.derived_uri, "native move unsupported; copying instead");
                }
                Err(e) => {
                    warn!(uri = %src.derived_uri, error = %e, "move failed");
                    return MoveOutcome::Failed;
                }
            }
        }

        if let Err(e) = copy_one(ctx, src, dest) {
            warn!(uri = %src.derived_uri, error = %e, "copy for move failed");
            return MoveOutcome::Failed;
        }

        if !src.flags.supports_delete {
            return MoveOutcome::CopiedNotRemoved;
        }

        if ctx.delete_document(src) {
            MoveOutcome::Moved
        } else {
            MoveOutcome::Failed
        }
    }
}

impl Operation for MoveOperation {
    fn op_type(&self) -> OpType {
        OpType::Move
    }

    fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        let dest = destination(ctx)?;
        let total = self.srcs.len();

        for (index, src) in self.srcs.iter().enumerate() {
            if ctx.is_canceled() {
                info!(job_id = %ctx.id(), remaining = total - index, "move canceled");
                break;
            }

            match Self::move_one(ctx, src, &self.src_parent, &dest) {
                MoveOutcome::Moved => {}
                MoveOutcome::CopiedNotRemoved => self.not_removed.push(src.clone()),
                MoveOutcome::Failed => ctx.on_file_failed(src),
            }

            ctx.report_progress(index + 1, total);
        }

        Ok(())
    }

    fn progress_labels(&self) -> ProgressLabels {
        ProgressLabels {
            title: "Moving files".to_string(),
            icon: Icon::Move,
            action_title: "Cancel".to_string(),
            action_icon: Icon::Cancel,
        }
    }

    fn setup_notification(&self, job: &Job) -> Notification {
        job.setup_notification_with("Preparing to move...")
    }

    fn failure_notification(&self, job: &Job) -> Notification {
        job.failure_notification_with(&MOVE_FAILURE, Icon::Error)
    }

    fn warning_notification(&self, job: &Job) -> Option<Notification> {
        warning_with(job, &MOVE_WARNING, &self.not_removed)
    }

    fn progress_notification(&self, job: &Job, progress: &JobProgress) -> Option<Notification> {
        Some(progress_with(job, progress))
    }

    fn has_warnings(&self) -> bool {
        !self.not_removed.is_empty()
    }
}

/// Deletes source documents. Reports no progress and has no warnings.
#[derive(Debug, Clone)]
pub struct DeleteOperation {
    srcs: Vec<DocumentInfo>,
    src_parent: DocumentInfo,
}

impl DeleteOperation {
    pub fn new(srcs: Vec<DocumentInfo>, src_parent: DocumentInfo) -> Self {
        DeleteOperation { srcs, src_parent }
    }

    pub fn sources(&self) -> &[DocumentInfo] {
        &self.srcs
    }

    pub fn src_parent(&self) -> &DocumentInfo {
        &self.src_parent
    }
}

impl Operation for DeleteOperation {
    fn op_type(&self) -> OpType {
        OpType::Delete
    }

    fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        debug!(
            job_id = %ctx.id(),
            parent = %self.src_parent.derived_uri,
            count = self.srcs.len(),
            "deleting documents"
        );

        for (index, src) in self.srcs.iter().enumerate() {
            if ctx.is_canceled() {
                info!(job_id = %ctx.id(), remaining = self.srcs.len() - index, "delete canceled");
                break;
            }

            if !ctx.delete_document(src) {
                ctx.on_file_failed(src);
            }
        }

        Ok(())
    }

    fn progress_labels(&self) -> ProgressLabels {
        ProgressLabels {
            title: "Deleting files".to_string(),
            icon: Icon::Delete,
            action_title: "Cancel".to_string(),
            action_icon: Icon::Cancel,
        }
    }

    fn setup_notification(&self, job: &Job) -> Notification {
        job.setup_notification_with("Preparing to delete...")
    }

    fn failure_notification(&self, job: &Job) -> Notification {
        job.failure_notification_with(&DELETE_FAILURE, Icon::Error)
    }
}
