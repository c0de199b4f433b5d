//! The effect runtime: routes dispatched actions to the store and to
//! async work, and owns the pending undo races.
//!
//! Reducers stay pure; everything that touches the network, a timer, or a
//! cancel signal happens in tasks spawned here. Actions dispatched from
//! within one handler reach the store in the order they were dispatched
//! (the store serializes them); two independent races have no relative
//! ordering guarantee.

mod cancel;
mod effects;
mod fetch;
mod undo;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

pub use cancel::CancelHandle;
pub use effects::{resolve_redirect, UiEffect};

use crate::config::Config;
use crate::intent::{MutationIntent, QueryIntent, SideEffects};
use crate::provider::{DataProvider, HttpProvider};
use crate::record::Identifier;
use crate::store::{Action, AdminStore};

use effects::EffectExecutor;

/// Identifier of one pending undo race.
pub type RaceId = Uuid;

/// Bookkeeping for one open undo window; destroyed when the race settles.
pub struct PendingRace {
    pub intent: MutationIntent,
    pub delay_ms: u64,
    handle: CancelHandle,
}

/// The pipeline runtime. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct AdminRuntime {
    store: AdminStore,
    provider: Arc<dyn DataProvider>,
    config: Config,
    effects: EffectExecutor,
    races: Arc<Mutex<HashMap<RaceId, PendingRace>>>,
}

impl AdminRuntime {
    pub fn new(provider: Arc<dyn DataProvider>, config: Config) -> Self {
        AdminRuntime {
            store: AdminStore::new(),
            provider,
            config,
            effects: EffectExecutor::new(),
            races: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build a runtime talking to `config.api_url` over simple JSON REST.
    pub fn from_config(config: Config) -> Self {
        let provider = Arc::new(HttpProvider::new(&config.api_url));
        Self::new(provider, config)
    }

    pub fn store(&self) -> &AdminStore {
        &self.store
    }

    pub fn provider(&self) -> Arc<dyn DataProvider> {
        Arc::clone(&self.provider)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to UI effects (notifications, redirects, refreshes).
    pub fn subscribe_effects(&self) -> tokio::sync::broadcast::Receiver<UiEffect> {
        self.effects.subscribe()
    }

    /// Declare a resource.
    pub fn register_resource(&self, name: &str) {
        self.store.apply(&crate::store::register_resource(name));
    }

    /// Dispatch an action. Must run inside a tokio runtime, since fetches
    /// and races are spawned as tasks.
    pub fn dispatch(&self, action: Action) {
        match action {
            Action::Query(intent) => {
                self.dispatch_query(intent);
            }
            Action::Mutation(intent) => {
                if intent.meta.undoable || intent.meta.cancellable {
                    self.dispatch_undoable(intent);
                } else {
                    let rt = self.clone();
                    tokio::spawn(fetch::run_mutation(rt, intent));
                }
            }
            Action::ShowNotification(notification) => {
                self.store
                    .apply(&Action::ShowNotification(notification.clone()));
                self.effects.emit(UiEffect::Notify(notification));
            }
            Action::HideNotification => {
                self.store.apply(&Action::HideNotification);
                self.effects.emit(UiEffect::HideNotification);
            }
            Action::Refresh => {
                self.effects.emit(UiEffect::Refresh);
            }
            other => self.store.apply(&other),
        }
    }

    /// Dispatch a read-only fetch, returning a handle the view can cancel
    /// on unmount. A cancelled fetch emits neither success nor failure.
    pub fn dispatch_query(&self, intent: QueryIntent) -> CancelHandle {
        let handle = CancelHandle::new();
        let rt = self.clone();
        tokio::spawn(fetch::run_query(rt, intent, handle.clone()));
        handle
    }

    /// Dispatch a mutation through the undo race: applied optimistically
    /// now, committed for real when the window elapses, discarded if
    /// [`AdminRuntime::cancel`] fires first.
    pub fn dispatch_undoable(&self, intent: MutationIntent) -> RaceId {
        let intent = intent.undoable();
        let race_id = Uuid::new_v4();
        let handle = CancelHandle::new();
        // Snapshot the window length at dispatch time; the race runs with
        // this value even if the runtime is later rebuilt with another.
        let delay_ms = self.config.undo_delay_ms;

        undo::begin(self, &intent);

        self.races.lock().insert(
            race_id,
            PendingRace {
                intent: intent.clone(),
                delay_ms,
                handle: handle.clone(),
            },
        );
        let rt = self.clone();
        tokio::spawn(undo::run_race(rt, intent, race_id, handle, delay_ms));
        race_id
    }

    /// Ids of the races still waiting for cancel-or-timeout.
    pub fn pending_races(&self) -> Vec<RaceId> {
        self.races.lock().keys().copied().collect()
    }

    /// Fire the cancel signal of one race. Returns false when the race
    /// already settled.
    pub fn cancel(&self, race_id: RaceId) -> bool {
        let races = self.races.lock();
        match races.get(&race_id) {
            Some(race) => {
                race.handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending race (the global "undo" button).
    pub fn cancel_all(&self) {
        for race in self.races.lock().values() {
            race.handle.cancel();
        }
    }

    pub(crate) fn finish_race(&self, race_id: RaceId) {
        self.races.lock().remove(&race_id);
    }

    pub(crate) fn emit(&self, effect: UiEffect) {
        self.effects.emit(effect);
    }

    /// Interpret a declarative side-effect descriptor.
    pub(crate) fn run_side_effects(
        &self,
        side_effects: &SideEffects,
        base_path: &str,
        id: Option<&Identifier>,
    ) {
        if let Some(effect) = &side_effects.notification {
            self.dispatch(Action::ShowNotification(
                effect
                    .to_notification()
                    .auto_hide(self.config.notification_auto_hide_ms),
            ));
        }
        if let Some(redirect) = &side_effects.redirect_to {
            self.emit(UiEffect::Redirect(resolve_redirect(
                redirect, base_path, id,
            )));
        }
        if side_effects.refresh {
            self.dispatch(Action::Refresh);
        }
    }
}
