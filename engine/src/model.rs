//! Core data model for document jobs.
//!
//! This module defines the values a job works on:
//! - OpType: which bulk operation a job performs
//! - DocumentInfo: a reference to a single document at some endpoint
//! - DocumentStack: the navigation context a job returns the user to
//! - JobState: the lifecycle of a job

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The operation performed by a job.
///
/// `Unknown` is a sentinel for unparsed or missing input. A job can never be
/// constructed with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Unknown,
    Copy,
    Move,
    Delete,
}

impl OpType {
    pub fn is_known(&self) -> bool {
        !matches!(self, OpType::Unknown)
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpType::Unknown => write!(f, "unknown"),
            OpType::Copy => write!(f, "copy"),
            OpType::Move => write!(f, "move"),
            OpType::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for OpType {
    type Err = std::convert::Infallible;

    /// Unrecognized names map to `Unknown`, which job construction rejects.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "copy" => OpType::Copy,
            "move" => OpType::Move,
            "delete" => OpType::Delete,
            _ => OpType::Unknown,
        })
    }
}

/// Capabilities and kind of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFlags {
    pub supports_delete: bool,
    pub supports_move: bool,
    /// Virtual documents have no byte representation and cannot be copied.
    pub is_virtual: bool,
    pub is_directory: bool,
}

/// A reference to a document hosted by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Endpoint identifier; selects the client used to operate on the document
    pub authority: String,

    /// Identifier of the document within its endpoint
    pub document_id: String,

    pub display_name: String,

    pub mime_type: String,

    /// Size in bytes (0 for directories)
    pub size: u64,

    /// Fully qualified uri, `content://{authority}/document/{document_id}`
    pub derived_uri: String,

    pub flags: DocumentFlags,
}

impl DocumentInfo {
    pub const DIRECTORY_MIME_TYPE: &'static str = "vnd.android.document/directory";

    /// Build a document reference, deriving its uri from authority and id.
    pub fn new(
        authority: impl Into<String>,
        document_id: impl Into<String>,
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        let authority = authority.into();
        let document_id = document_id.into();
        let mime_type = mime_type.into();
        let derived_uri = build_document_uri(&authority, &document_id);
        let is_directory = mime_type == Self::DIRECTORY_MIME_TYPE;

        DocumentInfo {
            authority,
            document_id,
            display_name: display_name.into(),
            mime_type,
            size: 0,
            derived_uri,
            flags: DocumentFlags {
                supports_delete: true,
                supports_move: true,
                is_virtual: false,
                is_directory,
            },
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_flags(mut self, flags: DocumentFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_directory(&self) -> bool {
        self.flags.is_directory
    }
}

impl fmt::Display for DocumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.derived_uri)
    }
}

pub fn build_document_uri(authority: &str, document_id: &str) -> String {
    format!("content://{}/document/{}", authority, document_id)
}

/// Navigation context of a job: the chain of directories the user was in.
///
/// The last entry is where the job delivers its results, and where the user
/// is taken when a notification is touched. The engine never interprets the
/// stack beyond `peek`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStack {
    /// Root the stack was opened from, if any
    pub root: Option<String>,
    entries: Vec<DocumentInfo>,
}

impl DocumentStack {
    pub fn new(root: Option<String>, entries: Vec<DocumentInfo>) -> Self {
        DocumentStack { root, entries }
    }

    pub fn push(&mut self, doc: DocumentInfo) {
        self.entries.push(doc);
    }

    /// The innermost directory of the stack.
    pub fn peek(&self) -> Option<&DocumentInfo> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[DocumentInfo] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lifecycle state of a job. No state is re-enterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Constructed, `run` not yet called
    Created,
    /// Operation body executing
    Running,
    /// `on_finished` delivered; terminal
    Finished,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Created => write!(f, "Created"),
            JobState::Running => write!(f, "Running"),
            JobState::Finished => write!(f, "Finished"),
        }
    }
}
