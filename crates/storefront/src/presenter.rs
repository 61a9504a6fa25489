//! Side effects a screen asks its host UI to perform.
//!
//! Screens never draw anything. They report notifications, back-navigation
//! and confirmation prompts through a [`Presenter`], which a front end (the
//! terminal client, a GUI shell, a test recorder) implements.

use async_trait::async_trait;

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A blocking notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: "Success".to_owned(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error".to_owned(),
            message: message.into(),
        }
    }

    /// Shown when a non-administrator opens a management screen.
    #[must_use]
    pub fn access_denied() -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Access denied".to_owned(),
            message: "You must be an administrator to open this page".to_owned(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error)
    }
}

/// A yes/no question asked before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmPrompt {
    /// Prompt for deleting a named item.
    #[must_use]
    pub fn delete(item_name: &str) -> Self {
        Self {
            title: "Confirm deletion".to_owned(),
            message: format!("Are you sure you want to delete \"{item_name}\"?"),
            confirm_label: "Delete".to_owned(),
            cancel_label: "Cancel".to_owned(),
        }
    }
}

/// Host UI operations available to screens.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Show a notification.
    fn notify(&self, notice: Notice);

    /// Leave the current screen.
    fn go_back(&self);

    /// Ask the user to confirm; `true` means proceed.
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}
