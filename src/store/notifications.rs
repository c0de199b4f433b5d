//! Notification queue state.
//!
//! Notifications are displayed first-in-first-out; hiding removes the one
//! currently shown. The undo choreography relies on this ordering: the
//! cancellable notification shown at optimistic time is hidden when the
//! race settles, whichever way it goes.

use std::collections::VecDeque;

use crate::notification::Notification;

use super::{Intent, Reducer, StoreState};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationState {
    queue: VecDeque<Notification>,
}

impl StoreState for NotificationState {}

impl NotificationState {
    /// The notification currently shown, if any.
    pub fn current(&self) -> Option<&Notification> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum NotificationIntent {
    Show(Notification),
    Hide,
}

impl Intent for NotificationIntent {}

pub struct NotificationReducer;

impl Reducer for NotificationReducer {
    type State = NotificationState;
    type Intent = NotificationIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            NotificationIntent::Show(notification) => {
                state.queue.push_back(notification);
            }
            NotificationIntent::Hide => {
                state.queue.pop_front();
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_then_hide_is_fifo() {
        let state = NotificationReducer::reduce(
            NotificationState::default(),
            NotificationIntent::Show(Notification::info("first")),
        );
        let state = NotificationReducer::reduce(
            state,
            NotificationIntent::Show(Notification::warning("second")),
        );
        assert_eq!(state.current().unwrap().message, "first");
        let state = NotificationReducer::reduce(state, NotificationIntent::Hide);
        assert_eq!(state.current().unwrap().message, "second");
        let state = NotificationReducer::reduce(state, NotificationIntent::Hide);
        assert!(state.is_empty());
    }

    #[test]
    fn hide_on_empty_queue_is_a_noop() {
        let state = NotificationReducer::reduce(NotificationState::default(), NotificationIntent::Hide);
        assert!(state.is_empty());
        assert_eq!(state.len(), 0);
    }
}
