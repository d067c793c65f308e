//! User-facing alert and confirmation surface
//!
//! Alerts are fire-and-forget; confirmations block until the user answers.

use serde::Serialize;

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// Informational notice
    #[inline]
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Error notice
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Where alerts and confirmation prompts go
#[cfg_attr(test, mockall::automock)]
pub trait UserSurface: Send + Sync {
    /// Show a notice
    fn alert(&self, notice: &Notice);

    /// Ask a yes/no question before a destructive action
    fn confirm(&self, prompt: &str) -> bool;
}

/// Surface that logs notices and answers prompts with a fixed value
#[derive(Debug, Clone, Copy)]
pub struct TracingSurface {
    auto_confirm: bool,
}

impl TracingSurface {
    /// Create surface; `auto_confirm` answers every prompt
    #[inline]
    #[must_use]
    pub fn new(auto_confirm: bool) -> Self {
        Self { auto_confirm }
    }
}

impl Default for TracingSurface {
    fn default() -> Self {
        Self::new(true)
    }
}

impl UserSurface for TracingSurface {
    fn alert(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::error!(message = %notice.message, "notice"),
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        tracing::info!(prompt, answer = self.auto_confirm, "confirmation");
        self.auto_confirm
    }
}
