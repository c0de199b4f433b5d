use serde::{Deserialize, Serialize};

/// Runtime configuration for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend API. Empty means no HTTP backend (the
    /// caller supplies its own provider).
    #[serde(default)]
    pub api_url: String,

    /// Length of the undo window in milliseconds: how long an optimistic
    /// mutation waits for a cancel signal before committing.
    #[serde(default = "default_undo_delay_ms")]
    pub undo_delay_ms: u64,

    /// Default page size for list views.
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Auto-hide delay for non-cancellable notifications, milliseconds.
    #[serde(default = "default_notification_auto_hide_ms")]
    pub notification_auto_hide_ms: u64,
}

fn default_undo_delay_ms() -> u64 {
    4000
}

fn default_per_page() -> u32 {
    10
}

fn default_notification_auto_hide_ms() -> u64 {
    4000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: String::new(),
            undo_delay_ms: default_undo_delay_ms(),
            default_per_page: default_per_page(),
            notification_auto_hide_ms: default_notification_auto_hide_ms(),
        }
    }
}
