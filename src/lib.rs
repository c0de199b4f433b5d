//! Headless core for admin UIs: CRUD intents, a single-writer state
//! container, and an optimistic mutation pipeline over any backend API.
//!
//! The hard part lives in the runtime: a dispatched delete/update applies
//! to local state instantly, shows an undo window, and only hits the real
//! backend once the window elapses uncancelled. Derived caches (list
//! slices, one-to-many reference buckets) are patched in the same
//! synchronous dispatch, so every view agrees immediately.
//!
//! # Architecture
//!
//! ```text
//! UI ──→ intent factory ──→ AdminRuntime::dispatch
//!                                │
//!              ┌─────────────────┼─────────────────────┐
//!              ▼                 ▼                     ▼
//!        AdminStore        undo race            fetch lifecycle
//!     (pure reducers)  (optimistic + timer)   (provider verbs)
//!              │                 │                     │
//!              └───── state ─────┴──── UiEffect events ┘
//! ```
//!
//! UI layers dispatch intents and subscribe to state and effects; they
//! never mutate the caches directly.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use anyadmin::config::Config;
//! use anyadmin::intent::{crud_delete, crud_get_list};
//! use anyadmin::provider::{ListQuery, MemoryProvider};
//! use anyadmin::record::{Identifier, Record};
//! use anyadmin::runtime::AdminRuntime;
//! use anyadmin::store::Action;
//!
//! # async fn demo() {
//! let provider = Arc::new(MemoryProvider::new());
//! provider.seed("posts", vec![Record::new(1).with("title", "hello")]);
//!
//! let runtime = AdminRuntime::new(provider, Config::default());
//! runtime.register_resource("posts");
//! runtime.dispatch(Action::Query(crud_get_list("posts", ListQuery::default())));
//!
//! // Undoable delete: applied locally at once, sent to the backend only
//! // if the user does not cancel within the undo window.
//! let intent = crud_delete("posts", Identifier::Number(1), Record::new(1), "/posts", None, true);
//! let race = runtime.dispatch_undoable(intent);
//! runtime.cancel(race); // the user clicked "undo"
//! # }
//! ```

pub mod config;
pub mod error;
pub mod intent;
pub mod notification;
pub mod provider;
pub mod record;
pub mod runtime;
pub mod store;
