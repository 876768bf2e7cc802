//! Transient user-facing notices.
//!
//! A notice is the outcome of a user action (item added, checkout result)
//! surfaced briefly to the UI. Absence of a notice is modeled as
//! `Option<Notice>` rather than an empty-string sentinel.

use serde::{Deserialize, Serialize};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient notification shown after a user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    /// Create a success notice.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// Create an error notice.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    /// Whether this notice reports a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.kind, NoticeKind::Success)
    }
}
