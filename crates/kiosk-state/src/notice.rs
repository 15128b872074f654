//! User-facing messages shown under the active flow's controls.

use serde::{Deserialize, Serialize};

/// Severity of a [`Notice`], drives the styling of the message line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Server-provided information.
    Info,
    /// A request is in flight; show the loading indicator.
    Progress,
    /// The transaction completed.
    Success,
    /// Local validation rejected the input.
    Warning,
    /// A request failed.
    Error,
}

/// A message line for the kiosk screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text as displayed.
    pub text: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Info, text)
    }

    /// Loading notice.
    pub fn progress(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Progress, text)
    }

    /// Completion notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Success, text)
    }

    /// Validation warning.
    pub fn warning(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Warning, text)
    }

    /// Request failure.
    pub fn error(text: impl Into<String>) -> Self {
        Self::with_level(NoticeLevel::Error, text)
    }

    fn with_level(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}
