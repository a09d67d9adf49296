#![forbid(unsafe_code)]

//! Reactive adapter between a [`HistoryManager`] and view code.
//!
//! [`HistoryBinding`] owns the board session's manager and keeps an
//! [`Observable<HistoryInfo>`] in sync with it. Mounting registers a manager
//! listener that forwards each fresh [`HistoryInfo`] into the observable;
//! [`unmount`](HistoryBinding::unmount) removes the listener and hands the
//! manager back. Every mutating method is a plain pass-through.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use sketchboard_core::{TextItem, TransformState};
//! use sketchboard_history::reactive::HistoryBinding;
//! use sketchboard_history::undo::factory;
//!
//! let mut binding = HistoryBinding::new();
//! let can_undo = Rc::new(Cell::new(false));
//! let sink = Rc::clone(&can_undo);
//! let _sub = binding.subscribe(move |info| sink.set(info.can_undo));
//!
//! let text = TextItem::new("t1", "hello", TransformState::default());
//! binding.push_action(factory::create_add_text_action(&text, None));
//! assert!(can_undo.get());
//! ```

use sketchboard_core::BoardState;

use super::observable::{Observable, Subscription};
use crate::undo::{Action, BatchId, HistoryError, HistoryInfo, HistoryManager, ListenerId};

/// One board session's history, exposed reactively.
#[derive(Debug)]
pub struct HistoryBinding {
    manager: HistoryManager,
    info: Observable<HistoryInfo>,
    listener: ListenerId,
}

impl Default for HistoryBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBinding {
    /// Bind a fresh manager with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::mount(HistoryManager::new())
    }

    /// Take ownership of `manager` and start forwarding its info.
    #[must_use]
    pub fn mount(mut manager: HistoryManager) -> Self {
        let info = Observable::new(manager.history_info());
        let sink = info.clone();
        let listener = manager.add_listener(move |fresh| sink.set(fresh.clone()));
        Self {
            manager,
            info,
            listener,
        }
    }

    /// Stop forwarding and return the manager.
    pub fn unmount(mut self) -> HistoryManager {
        self.manager.remove_listener(self.listener);
        self.manager
    }

    /// Latest history info.
    #[must_use]
    pub fn info(&self) -> HistoryInfo {
        self.info.get()
    }

    /// The observable cell, for view code that wants version checks.
    #[must_use]
    pub fn observable(&self) -> &Observable<HistoryInfo> {
        &self.info
    }

    /// Subscribe to info changes. Dropping the guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&HistoryInfo) + 'static) -> Subscription {
        self.info.subscribe(callback)
    }

    #[must_use]
    pub fn manager(&self) -> &HistoryManager {
        &self.manager
    }

    /// Undo the most recent action. Returns `false` when there is nothing to
    /// undo, and also while a batch is open, even with a non-empty stack.
    pub fn undo(&mut self) -> bool {
        self.manager.undo()
    }

    /// Redo the most recently undone action. Returns `false` when there is
    /// nothing to redo, and also while a batch is open.
    pub fn redo(&mut self) -> bool {
        self.manager.redo()
    }

    pub fn push_action(&mut self, action: Action) {
        self.manager.push_action(action);
    }

    pub fn start_batch(&mut self, description: &str) -> Result<BatchId, HistoryError> {
        self.manager.start_batch(description)
    }

    pub fn end_batch(&mut self) -> Option<Action> {
        self.manager.end_batch()
    }

    pub fn cancel_batch(&mut self) -> usize {
        self.manager.cancel_batch()
    }

    pub fn clear(&mut self) {
        self.manager.clear();
    }

    pub fn update_state(&mut self, state: BoardState) {
        self.manager.update_state(state);
    }

    #[must_use]
    pub fn current_state(&self) -> BoardState {
        self.manager.current_state()
    }

    pub fn set_max_stack_size(&mut self, max_stack_size: usize) {
        self.manager.set_max_stack_size(max_stack_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::factory::create_add_image_action;
    use sketchboard_core::{ImageItem, TransformState};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add(id: &str) -> Action {
        create_add_image_action(&ImageItem::new(id, "blob:x", TransformState::default()), None)
    }

    #[test]
    fn mount_seeds_info_from_manager() {
        let mut manager = HistoryManager::new();
        manager.push_action(add("a"));
        let binding = HistoryBinding::mount(manager);
        assert_eq!(binding.info().undo_count, 1);
        assert_eq!(binding.observable().version(), 0);
        assert_eq!(binding.manager().listener_count(), 1);
    }

    #[test]
    fn pass_throughs_update_info() {
        let mut binding = HistoryBinding::new();
        binding.push_action(add("a"));
        binding.push_action(add("b"));
        assert!(binding.undo());
        let info = binding.info();
        assert_eq!((info.undo_count, info.redo_count), (1, 1));

        assert!(binding.redo());
        binding.set_max_stack_size(1);
        assert_eq!(binding.info().undo_count, 1);
        assert_eq!(binding.current_state().images.len(), 2);

        binding.clear();
        assert!(!binding.info().can_undo);
    }

    #[test]
    fn batch_pass_throughs() {
        let mut binding = HistoryBinding::new();
        let id = binding.start_batch("group").unwrap();
        assert_eq!(binding.info().current_batch_id, Some(id));
        binding.push_action(add("a"));
        assert_eq!(binding.info().batch_len, 1);
        assert!(binding.start_batch("nested").is_err());
        assert!(binding.end_batch().is_some());
        assert_eq!(binding.info().undo_count, 1);

        binding.start_batch("abandoned").unwrap();
        binding.push_action(add("b"));
        assert_eq!(binding.cancel_batch(), 1);
        assert!(!binding.info().is_batching());
    }

    #[test]
    fn subscribers_see_changes_only() {
        let mut binding = HistoryBinding::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = binding.subscribe(move |info| sink.borrow_mut().push(info.undo_count));

        binding.push_action(add("a"));
        // Nothing to undo twice: info is unchanged after the first undo.
        binding.undo();
        binding.undo();
        binding.update_state(BoardState::new());
        assert_eq!(*seen.borrow(), [1, 0]);
    }

    #[test]
    fn undo_refused_while_batch_open() {
        let mut binding = HistoryBinding::new();
        binding.push_action(add("a"));
        binding.start_batch("drag").unwrap();
        assert!(binding.info().can_undo);
        assert!(!binding.undo());
        assert!(!binding.redo());
        assert!(binding.end_batch().is_none());
        assert!(binding.undo());
    }

    #[test]
    fn unmount_stops_forwarding() {
        let binding = HistoryBinding::new();
        let info = binding.observable().clone();
        let mut manager = binding.unmount();
        assert_eq!(manager.listener_count(), 0);

        manager.push_action(add("a"));
        assert_eq!(info.get().undo_count, 0);
    }
}
