#![forbid(unsafe_code)]

//! Shared value cell with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] keeps a value of type `T` in shared storage
//! (`Rc<RefCell<..>>`). A write that changes the value (by `PartialEq`) bumps
//! the version and calls every live subscriber in registration order.
//! The history binding uses one of these to publish [`HistoryInfo`] to view
//! code that renders undo/redo buttons and the history badge.
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + clone               |
//! | `set()`       | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Re-entrant read in a subscriber**: callbacks run after the inner
//!   borrow is released, so `get()`/`set()` from a callback are allowed.
//! - **Subscriber leak**: callbacks live as long as their [`Subscription`]
//!   guard. Dead entries are pruned lazily on the next notification.
//!
//! [`HistoryInfo`]: crate::undo::HistoryInfo

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, info_span};
use web_time::Instant;

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct Slot<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value.
///
/// Cloning an `Observable` yields another handle to the same cell.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing write.
/// 2. `set(v)` where `v == current` is a no-op.
/// 3. Subscribers are notified in registration order.
pub struct Observable<T> {
    cell: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.cell.borrow();
        f.debug_struct("Observable")
            .field("value", &cell.value)
            .field("version", &cell.version)
            .field("subscriber_count", &cell.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a cell holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Slot {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().value.clone()
    }

    /// Read the value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow().value)
    }

    /// Store `value`. Subscribers are called only if it differs from the
    /// current value.
    pub fn set(&self, value: T) {
        {
            let mut cell = self.cell.borrow_mut();
            if cell.value == value {
                return;
            }
            cell.value = value;
            cell.version += 1;
        }
        self.notify();
    }

    /// Subscribe to changes. The callback receives the new value.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.cell
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.borrow().version
    }

    /// Registered subscribers, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.cell.borrow().subscribers.len()
    }

    fn notify(&self) {
        let (callbacks, value) = {
            let mut cell = self.cell.borrow_mut();
            cell.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<CallbackRc<T>> =
                cell.subscribers.iter().filter_map(|w| w.upgrade()).collect();
            (callbacks, cell.value.clone())
        };

        if callbacks.is_empty() {
            return;
        }

        let subscribers = callbacks.len() as u64;
        let start = Instant::now();
        let _span = info_span!(
            "history.binding.propagate",
            subscribers,
            duration_us = tracing::field::Empty
        )
        .entered();

        for cb in &callbacks {
            cb(&value);
        }

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        debug!(subscribers, duration_us, "history info propagated");
    }
}

/// Guard keeping a subscriber callback alive.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
