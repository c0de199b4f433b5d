//! Typed intent contracts.
//!
//! An intent describes a desired fetch or mutation, not yet applied to the
//! backend. Intents are immutable once dispatched; retries and redispatch
//! after an undo window build a fresh intent.

use serde_json::{Map, Value};

use crate::notification::{Notification, NotificationLevel};
use crate::provider::ListQuery;
use crate::record::{Identifier, Record};

/// The kind of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    UpdateMany,
    DeleteMany,
}

impl MutationKind {
    pub fn is_delete(&self) -> bool {
        matches!(self, MutationKind::Delete | MutationKind::DeleteMany)
    }

    pub fn is_update(&self) -> bool {
        matches!(self, MutationKind::Update | MutationKind::UpdateMany)
    }

    /// Stable tag for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::UpdateMany => "update_many",
            MutationKind::DeleteMany => "delete_many",
        }
    }
}

/// Where to navigate after a mutation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTo {
    List,
    Edit,
    Show,
    Create,
    /// Literal path, used as-is.
    Path(String),
}

/// Declarative notification descriptor attached to an intent.
///
/// Interpreted by the side-effect executor; never a callback.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEffect {
    pub message: String,
    pub level: NotificationLevel,
    pub smart_count: u64,
}

impl NotificationEffect {
    pub fn info(message: &str, smart_count: u64) -> Self {
        NotificationEffect {
            message: message.to_string(),
            level: NotificationLevel::Info,
            smart_count,
        }
    }

    pub fn warning(message: &str) -> Self {
        NotificationEffect {
            message: message.to_string(),
            level: NotificationLevel::Warning,
            smart_count: 1,
        }
    }

    /// Materialize the descriptor into a displayable notification.
    pub fn to_notification(&self) -> Notification {
        let base = match self.level {
            NotificationLevel::Info => Notification::info(&self.message),
            NotificationLevel::Warning => Notification::warning(&self.message),
        };
        base.smart_count(self.smart_count)
    }
}

/// Declarative side effects to run when a mutation settles one way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SideEffects {
    pub notification: Option<NotificationEffect>,
    pub redirect_to: Option<RedirectTo>,
    pub refresh: bool,
}

/// Metadata carried by every mutation intent.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentMeta {
    pub base_path: String,
    pub on_success: SideEffects,
    pub on_failure: SideEffects,
    /// Set on the optimistic variant dispatched by the orchestrator.
    pub optimistic: bool,
    pub undoable: bool,
    pub cancellable: bool,
}

impl IntentMeta {
    pub fn new(base_path: &str) -> Self {
        IntentMeta {
            base_path: base_path.to_string(),
            on_success: SideEffects::default(),
            on_failure: SideEffects::default(),
            optimistic: false,
            undoable: false,
            cancellable: false,
        }
    }
}

/// A desired mutation: create, update or delete, singular or plural.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationIntent {
    pub kind: MutationKind,
    pub resource: String,
    /// Target of singular mutations.
    pub id: Option<Identifier>,
    /// Targets of plural mutations.
    pub ids: Vec<Identifier>,
    /// Fields to write (create/update kinds).
    pub data: Option<Map<String, Value>>,
    /// Server-side state before the mutation, passed through to the
    /// provider contract.
    pub previous_data: Option<Record>,
    pub meta: IntentMeta,
}

impl MutationIntent {
    /// Mark this intent undoable: the orchestrator will apply it
    /// optimistically and open a cancel window before the real call.
    pub fn undoable(mut self) -> Self {
        self.meta.undoable = true;
        self.meta.cancellable = true;
        self
    }

    /// Identifiers affected by this mutation, however it is shaped.
    pub fn affected_ids(&self) -> Vec<Identifier> {
        match (&self.id, self.ids.is_empty()) {
            (Some(id), _) => vec![id.clone()],
            (None, false) => self.ids.clone(),
            (None, true) => Vec::new(),
        }
    }

    /// Number of records this mutation touches, for plural notifications.
    pub fn smart_count(&self) -> u64 {
        match self.kind {
            MutationKind::Create | MutationKind::Update | MutationKind::Delete => 1,
            MutationKind::UpdateMany | MutationKind::DeleteMany => self.ids.len() as u64,
        }
    }
}

/// The kind of a read-only fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    GetList {
        params: ListQuery,
    },
    GetOne {
        id: Identifier,
    },
    GetMany {
        ids: Vec<Identifier>,
    },
    GetManyReference {
        /// The resource the parent record belongs to (key derivation).
        source: String,
        target: String,
        parent_id: Identifier,
        params: ListQuery,
    },
}

/// A read-only fetch intent.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub resource: String,
    pub kind: QueryKind,
    /// Base path of the originating view, used for failure redirects.
    pub base_path: Option<String>,
}
