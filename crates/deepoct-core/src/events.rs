//! In-process session event channel.
//!
//! A small publish/subscribe bus carrying session lifecycle signals from
//! the request pipeline to whatever front-end is driving it. Dispatch is
//! synchronous and in subscription order; a panicking handler does not
//! prevent the remaining handlers from running. Events emitted with no
//! subscriber are dropped.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Session lifecycle signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Access and refresh tokens are both invalid; the user must
    /// re-authenticate. Emitted by the request pipeline.
    TokenExpired,
    /// Deliberate, user-initiated logout.
    Logout,
    /// Reserved for a future "not permitted" distinction. Part of the
    /// contract but never emitted today.
    Unauthorized,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::TokenExpired => write!(f, "token_expired"),
            SessionEvent::Logout => write!(f, "logout"),
            SessionEvent::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

/// Handle returned by [`SessionEvents::on`], used to unsubscribe.
pub type SubscriptionId = u64;

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<SessionEvent, Vec<(SubscriptionId, Handler)>>>,
}

/// Cheaply clonable handle to the session event channel. All clones share
/// the same subscriber list, so one instance constructed at startup can be
/// passed to the pipeline and every front-end component.
#[derive(Clone, Default)]
pub struct SessionEvents {
    inner: Arc<Inner>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to an event. Handlers for the same event run in
    /// subscription order.
    pub fn on(&self, event: SessionEvent, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self.inner.handlers.lock().unwrap_or_else(|e| e.into_inner());
        handlers.entry(event).or_default().push((id, Arc::new(handler)));
        id
    }

    /// Remove a previously registered handler. Removing an unknown id is a
    /// no-op, so unsubscribing twice is harmless.
    pub fn off(&self, event: SessionEvent, id: SubscriptionId) {
        let mut handlers = self.inner.handlers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = handlers.get_mut(&event) {
            list.retain(|(handler_id, _)| *handler_id != id);
        }
    }

    /// Invoke every subscriber of `event` synchronously, isolating panics
    /// so one misbehaving handler cannot starve the rest.
    pub fn emit(&self, event: SessionEvent) {
        // Snapshot outside the dispatch loop: handlers may subscribe or
        // unsubscribe reentrantly.
        let snapshot: Vec<Handler> = {
            let handlers = self.inner.handlers.lock().unwrap_or_else(|e| e.into_inner());
            handlers
                .get(&event)
                .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler())).is_err() {
                warn!(%event, "session event handler panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let events = SessionEvents::new();
        events.emit(SessionEvent::Logout);
        events.emit(SessionEvent::TokenExpired);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let events = SessionEvents::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            events.on(SessionEvent::Logout, move || {
                order.lock().unwrap().push(tag);
            });
        }

        events.emit(SessionEvent::Logout);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_off_stops_delivery() {
        let events = SessionEvents::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let id = events.on(SessionEvent::TokenExpired, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(SessionEvent::TokenExpired);
        events.off(SessionEvent::TokenExpired, id);
        events.emit(SessionEvent::TokenExpired);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_events_are_independent() {
        let events = SessionEvents::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        events.on(SessionEvent::Logout, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(SessionEvent::TokenExpired);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        events.emit(SessionEvent::Logout);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let events = SessionEvents::new();
        let count = Arc::new(AtomicUsize::new(0));

        events.on(SessionEvent::TokenExpired, || panic!("handler failure"));
        let counter = Arc::clone(&count);
        events.on(SessionEvent::TokenExpired, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(SessionEvent::TokenExpired);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
