//! Notification contract between the pipeline and the UI layer.
//!
//! Messages are i18n keys (or plain text); rendering and translation are
//! out of scope here, the pipeline only carries them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// A notification to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text or i18n key (e.g. `notification.deleted`).
    pub message: String,
    pub level: NotificationLevel,
    /// Interpolation arguments (e.g. `smart_count` for plural forms).
    #[serde(default)]
    pub message_args: Map<String, Value>,
    /// Whether the notification offers an undo/cancel affordance.
    #[serde(default)]
    pub cancellable: bool,
    /// Auto-hide delay in milliseconds, if any.
    #[serde(default)]
    pub auto_hide_duration: Option<u64>,
    #[serde(default)]
    pub undoable: bool,
}

impl Notification {
    pub fn info(message: &str) -> Self {
        Self::new(message, NotificationLevel::Info)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(message, NotificationLevel::Warning)
    }

    fn new(message: &str, level: NotificationLevel) -> Self {
        Notification {
            message: message.to_string(),
            level,
            message_args: Map::new(),
            cancellable: false,
            auto_hide_duration: None,
            undoable: false,
        }
    }

    /// Set the `smart_count` interpolation argument used for pluralization.
    pub fn smart_count(mut self, count: u64) -> Self {
        self.message_args
            .insert("smart_count".to_string(), Value::from(count));
        self
    }

    pub fn cancellable(mut self) -> Self {
        self.cancellable = true;
        self.undoable = true;
        self
    }

    pub fn auto_hide(mut self, duration_ms: u64) -> Self {
        self.auto_hide_duration = Some(duration_ms);
        self
    }
}
