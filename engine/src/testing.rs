//! Recording fakes shared by the unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::client::{DocumentClient, EndpointResolver};
use crate::error::{JobError, RemoteError};
use crate::job::{Job, JobContext, Operation, ProgressLabels};
use crate::listener::{JobListener, JobProgress};
use crate::model::{DocumentInfo, OpType};
use crate::notification::{Icon, Notification, PluralTemplate};

pub fn doc(authority: &str, id: &str) -> DocumentInfo {
    DocumentInfo::new(authority, id, id, "text/plain")
}

pub fn dir(authority: &str, id: &str) -> DocumentInfo {
    DocumentInfo::new(authority, id, id, DocumentInfo::DIRECTORY_MIME_TYPE)
}

fn io_failure(uri: &str) -> RemoteError {
    RemoteError::Io {
        uri: uri.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
    }
}

#[derive(Default)]
struct FakeState {
    acquired: Vec<String>,
    released: Vec<String>,
    operations: Vec<String>,
    deleted: Vec<String>,
    failing_authorities: HashSet<String>,
    failing_releases: HashSet<String>,
    failing_deletes: HashSet<String>,
    failing_copies: HashSet<String>,
}

/// Resolver handing out in-memory clients and recording everything they do.
#[derive(Default)]
pub struct FakeResolver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_authority(&self, authority: &str) {
        self.state.lock().unwrap().failing_authorities.insert(authority.to_string());
    }

    pub fn fail_release(&self, authority: &str) {
        self.state.lock().unwrap().failing_releases.insert(authority.to_string());
    }

    pub fn fail_delete(&self, uri: &str) {
        self.state.lock().unwrap().failing_deletes.insert(uri.to_string());
    }

    pub fn fail_copy(&self, uri: &str) {
        self.state.lock().unwrap().failing_copies.insert(uri.to_string());
    }

    pub fn acquired(&self) -> Vec<String> {
        self.state.lock().unwrap().acquired.clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.state.lock().unwrap().released.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    /// Copy and move requests in issue order, as `copy:<uri>` / `move:<uri>`.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().unwrap().operations.clone()
    }
}

impl EndpointResolver for FakeResolver {
    fn acquire(&self, authority: &str) -> Result<Arc<dyn DocumentClient>, RemoteError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_authorities.contains(authority) {
            return Err(RemoteError::UnknownAuthority {
                authority: authority.to_string(),
            });
        }
        state.acquired.push(authority.to_string());
        Ok(Arc::new(FakeClient {
            authority: authority.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeClient {
    authority: String,
    state: Arc<Mutex<FakeState>>,
}

impl DocumentClient for FakeClient {
    fn authority(&self) -> &str {
        &self.authority
    }

    fn copy_document(
        &self,
        src: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<DocumentInfo, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(format!("copy:{}", src.derived_uri));
        if state.failing_copies.contains(&src.derived_uri) {
            return Err(io_failure(&src.derived_uri));
        }
        let id = format!("{}/{}", target_parent.document_id, src.display_name);
        Ok(DocumentInfo::new(
            target_parent.authority.clone(),
            id,
            src.display_name.clone(),
            src.mime_type.clone(),
        ))
    }

    fn move_document(
        &self,
        src: &DocumentInfo,
        _src_parent: &DocumentInfo,
        target_parent: &DocumentInfo,
    ) -> Result<DocumentInfo, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.operations.push(format!("move:{}", src.derived_uri));
        let id = format!("{}/{}", target_parent.document_id, src.display_name);
        Ok(DocumentInfo::new(
            target_parent.authority.clone(),
            id,
            src.display_name.clone(),
            src.mime_type.clone(),
        ))
    }

    fn delete_document(&self, uri: &str) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(uri) {
            return Err(io_failure(uri));
        }
        state.deleted.push(uri.to_string());
        Ok(())
    }

    fn release(&self) -> Result<(), RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.released.push(self.authority.clone());
        if state.failing_releases.contains(&self.authority) {
            return Err(io_failure(&self.authority));
        }
        Ok(())
    }
}

/// Listener recording every callback as a short string.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl JobListener for RecordingListener {
    fn on_start(&self, job: &Job) {
        self.push(&format!("start:{}", job.state()));
    }

    fn on_finished(&self, job: &Job) {
        self.push(&format!("finished:{}", job.state()));
    }

    fn on_progress(&self, progress: &JobProgress) {
        self.push(&format!("progress:{}/{}", progress.completed, progress.total));
    }
}

type Body = Box<dyn FnMut(&mut JobContext<'_>) -> Result<(), JobError> + Send>;

/// Operation whose body is supplied by the test.
pub struct ScriptedOperation {
    op_type: OpType,
    body: Body,
}

impl ScriptedOperation {
    pub fn new<F>(op_type: OpType, body: F) -> Self
    where
        F: FnMut(&mut JobContext<'_>) -> Result<(), JobError> + Send + 'static,
    {
        ScriptedOperation {
            op_type,
            body: Box::new(body),
        }
    }
}

impl Operation for ScriptedOperation {
    fn op_type(&self) -> OpType {
        self.op_type
    }

    fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        (self.body)(ctx)
    }

    fn progress_labels(&self) -> ProgressLabels {
        ProgressLabels {
            title: "Working".to_string(),
            icon: Icon::Copy,
            action_title: "Cancel".to_string(),
            action_icon: Icon::Cancel,
        }
    }

    fn setup_notification(&self, job: &Job) -> Notification {
        job.setup_notification_with("Preparing...")
    }

    fn failure_notification(&self, job: &Job) -> Notification {
        job.failure_notification_with(
            &PluralTemplate::new("{count} failure", "{count} failures"),
            Icon::Error,
        )
    }
}
