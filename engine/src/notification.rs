//! Presentation payloads.
//!
//! Jobs describe their progress, failures and warnings as plain values that a
//! presentation layer renders however it likes. Payloads embed two kinds of
//! actions: a navigate intent back to the job's document stack, and a cancel
//! intent carrying the job id so a user action can be routed back to the job.

use serde::Serialize;

use crate::model::{DocumentInfo, DocumentStack, OpType};

pub const TOUCH_FOR_DETAILS: &str = "Touch to view details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Copy,
    Move,
    Delete,
    Cancel,
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Progress,
    Error,
    Status,
}

/// Which detail view a navigate intent opens on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogType {
    Failure,
    Warning,
}

/// Title text that depends on a count, e.g. "Couldn't copy 1 file".
///
/// `{count}` in either form is replaced by the count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralTemplate {
    pub one: &'static str,
    pub other: &'static str,
}

impl PluralTemplate {
    pub const fn new(one: &'static str, other: &'static str) -> Self {
        PluralTemplate { one, other }
    }

    pub fn format(&self, count: usize) -> String {
        let template = if count == 1 { self.one } else { self.other };
        template.replace("{count}", &count.to_string())
    }
}

/// Takes the user back to the job's destination, optionally opening a dialog
/// listing documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigateIntent {
    pub stack: DocumentStack,
    pub dialog_type: Option<DialogType>,
    pub operation: Option<OpType>,
    pub documents: Vec<DocumentInfo>,
}

impl NavigateIntent {
    pub fn browse(stack: DocumentStack) -> Self {
        NavigateIntent {
            stack,
            dialog_type: None,
            operation: None,
            documents: Vec::new(),
        }
    }

    pub fn with_dialog(
        mut self,
        dialog_type: DialogType,
        operation: OpType,
        documents: Vec<DocumentInfo>,
    ) -> Self {
        self.dialog_type = Some(dialog_type);
        self.operation = Some(operation);
        self.documents = documents;
        self
    }
}

/// Requests cancellation of the job with `job_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelIntent {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub icon: Icon,
    pub title: String,
    pub intent: CancelIntent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressBar {
    pub max: u64,
    pub current: u64,
    pub indeterminate: bool,
}

/// A user-visible notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub content_text: Option<String>,
    pub category: Category,
    pub icon: Icon,
    /// Ongoing notifications cannot be dismissed while the job runs
    pub ongoing: bool,
    /// Dismiss the notification once touched
    pub auto_cancel: bool,
    pub progress: Option<ProgressBar>,
    pub content_intent: Option<NavigateIntent>,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn new(title: impl Into<String>, icon: Icon, category: Category) -> Self {
        Notification {
            title: title.into(),
            content_text: None,
            category,
            icon,
            ongoing: false,
            auto_cancel: false,
            progress: None,
            content_intent: None,
            actions: Vec::new(),
        }
    }

    pub fn content_text(mut self, text: impl Into<String>) -> Self {
        self.content_text = Some(text.into());
        self
    }

    pub fn content_intent(mut self, intent: NavigateIntent) -> Self {
        self.content_intent = Some(intent);
        self
    }

    pub fn ongoing(mut self, ongoing: bool) -> Self {
        self.ongoing = ongoing;
        self
    }

    pub fn auto_cancel(mut self, auto_cancel: bool) -> Self {
        self.auto_cancel = auto_cancel;
        self
    }

    pub fn progress(mut self, max: u64, current: u64, indeterminate: bool) -> Self {
        self.progress = Some(ProgressBar {
            max,
            current,
            indeterminate,
        });
        self
    }

    pub fn action(mut self, icon: Icon, title: impl Into<String>, intent: CancelIntent) -> Self {
        self.actions.push(NotificationAction {
            icon,
            title: title.into(),
            intent,
        });
        self
    }

    /// Job id of the first cancel action, if the notification carries one.
    pub fn cancel_target(&self) -> Option<&str> {
        self.actions.first().map(|a| a.intent.job_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_template_picks_form_by_count() {
        let template =
            PluralTemplate::new("Couldn't copy {count} file", "Couldn't copy {count} files");
        assert_eq!(template.format(1), "Couldn't copy 1 file");
        assert_eq!(template.format(0), "Couldn't copy 0 files");
        assert_eq!(template.format(4), "Couldn't copy 4 files");
    }

    #[test]
    fn test_builder_sets_fields() {
        let notification = Notification::new("Copying", Icon::Copy, Category::Progress)
            .ongoing(true)
            .progress(0, 0, true)
            .content_text("Preparing...")
            .action(
                Icon::Cancel,
                "Cancel",
                CancelIntent {
                    job_id: "job-1".to_string(),
                },
            );

        assert!(notification.ongoing);
        assert_eq!(notification.content_text.as_deref(), Some("Preparing..."));
        assert_eq!(notification.cancel_target(), Some("job-1"));
        assert!(notification.progress.map(|p| p.indeterminate).unwrap_or(false));
    }
}
