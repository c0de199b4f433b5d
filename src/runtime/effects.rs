//! UI side-effect events.
//!
//! The runtime never calls back into the UI; it broadcasts [`UiEffect`]
//! events interpreted by whatever layer renders notifications, owns the
//! router, or re-fetches on refresh. Effects originate from the
//! declarative descriptors carried on intents, never from callbacks.

use tokio::sync::broadcast;

use crate::intent::RedirectTo;
use crate::notification::Notification;
use crate::record::Identifier;

/// An event for the UI layer.
#[derive(Debug, Clone)]
pub enum UiEffect {
    Notify(Notification),
    HideNotification,
    /// Navigate to this path.
    Redirect(String),
    /// Re-fetch whatever the current views display.
    Refresh,
}

/// Resolve a redirect descriptor against the view's base path and the
/// affected record id.
pub fn resolve_redirect(redirect: &RedirectTo, base_path: &str, id: Option<&Identifier>) -> String {
    match redirect {
        RedirectTo::List => base_path.to_string(),
        RedirectTo::Create => format!("{}/create", base_path),
        RedirectTo::Edit => match id {
            Some(id) => format!("{}/{}", base_path, id),
            None => base_path.to_string(),
        },
        RedirectTo::Show => match id {
            Some(id) => format!("{}/{}/show", base_path, id),
            None => base_path.to_string(),
        },
        RedirectTo::Path(path) => path.clone(),
    }
}

/// Fan-out channel for UI effects.
#[derive(Clone)]
pub(crate) struct EffectExecutor {
    tx: broadcast::Sender<UiEffect>,
}

impl EffectExecutor {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        EffectExecutor { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<UiEffect> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, effect: UiEffect) {
        // No subscribers is fine; effects are fire-and-forget.
        let _ = self.tx.send(effect);
    }
}
