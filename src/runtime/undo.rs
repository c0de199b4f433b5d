//! The mutation orchestrator: optimistic apply plus undo race.
//!
//! States per mutation:
//!
//! ```text
//! Idle ──→ Racing(optimistic applied, timer running) ──→ Committed
//!                         │
//!                         └──→ Cancelled
//! ```
//!
//! On dispatch the optimistic variant is applied synchronously, a
//! cancellable notification goes up, and any redirect happens immediately,
//! so the UI reflects the mutation with zero latency. The race then waits
//! for whichever comes first: the user's cancel signal or the timer.
//! Exactly one race runs per dispatched intent; identical intents
//! dispatched twice race independently, with no coalescing.

use std::time::Duration;

use tokio::select;

use crate::intent::{MutationIntent, SideEffects};
use crate::notification::Notification;
use crate::store::Action;

use super::cancel::CancelHandle;
use super::effects::UiEffect;
use super::{fetch, AdminRuntime, RaceId};

/// Synchronous half: everything the user must see before the race starts.
pub(crate) fn begin(rt: &AdminRuntime, intent: &MutationIntent) {
    if let Some(effect) = &intent.meta.on_success.notification {
        rt.dispatch(Action::ShowNotification(
            effect.to_notification().cancellable(),
        ));
    }

    let mut optimistic = intent.clone();
    optimistic.meta.optimistic = true;
    rt.store().apply(&Action::Optimistic(optimistic));

    if let Some(redirect) = &intent.meta.on_success.redirect_to {
        rt.emit(UiEffect::Redirect(super::effects::resolve_redirect(
            redirect,
            &intent.meta.base_path,
            intent.id.as_ref(),
        )));
    }
    rt.dispatch(Action::Refresh);
}

/// Async half: the race itself, and whichever epilogue wins.
pub(crate) async fn run_race(
    rt: AdminRuntime,
    intent: MutationIntent,
    race_id: RaceId,
    handle: CancelHandle,
    delay_ms: u64,
) {
    let delay = Duration::from_millis(delay_ms);
    let cancelled = select! {
        _ = handle.wait() => true,
        _ = tokio::time::sleep(delay) => false,
    };
    rt.finish_race(race_id);

    // Whichever way the race went, the cancellable notification comes down.
    rt.dispatch(Action::HideNotification);

    if cancelled {
        tracing::debug!(
            race_id = %race_id,
            resource = %intent.resource,
            kind = intent.kind.label(),
            "undo race cancelled"
        );
        rt.dispatch(Action::ShowNotification(
            Notification::info("notification.canceled")
                .auto_hide(rt.config().notification_auto_hide_ms),
        ));
        // No explicit rollback: the optimistic state stands locally and the
        // refresh re-fetches server truth for every dependent view.
        rt.dispatch(Action::Refresh);
    } else {
        tracing::debug!(
            race_id = %race_id,
            resource = %intent.resource,
            kind = intent.kind.label(),
            "undo window elapsed, committing"
        );
        fetch::run_mutation(rt, strip_undo(intent)).await;
    }
}

/// The committed intent: no longer undoable, success effects already
/// delivered at optimistic time, `previous_data` preserved for the
/// provider contract.
fn strip_undo(mut intent: MutationIntent) -> MutationIntent {
    intent.meta.undoable = false;
    intent.meta.cancellable = false;
    intent.meta.optimistic = false;
    intent.meta.on_success = SideEffects::default();
    intent
}
