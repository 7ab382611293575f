//! State-change listeners and the pending notification slot.

use log::warn;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Events surfaced through the single pending-notification slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Check,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Notification::Check => write!(f, "check"),
        }
    }
}

/// Handle returned by `subscribe`, used to drop a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Listeners must be non-suspending and short-running; they fire
/// synchronously after every committed state change.
pub type StateListener = Box<dyn Fn() + Send>;

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(u64, StateListener)>,
}

impl ListenerRegistry {
    pub fn subscribe(&mut self, listener: StateListener) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        ListenerId(id)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(key, _)| *key != id.0);
        self.listeners.len() != before
    }

    /// Invokes every listener in subscription order. Listeners are
    /// isolated from each other: one panicking does not suppress the
    /// rest.
    pub fn fan_out(&self) {
        for (id, listener) in &self.listeners {
            if catch_unwind(AssertUnwindSafe(listener)).is_err() {
                warn!("state listener {id} panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn listeners_fire_in_order_and_unsubscribe() {
        let mut registry = ListenerRegistry::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let counted = hits.clone();
        let id = registry.subscribe(Box::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        registry.fan_out();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        registry.fan_out();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!registry.unsubscribe(id));
    }

    #[test]
    fn one_panicking_listener_does_not_suppress_others() {
        let mut registry = ListenerRegistry::default();
        registry.subscribe(Box::new(|| panic!("listener bug")));

        let hits = Arc::new(AtomicUsize::new(0));
        let counted = hits.clone();
        registry.subscribe(Box::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        registry.fan_out();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
