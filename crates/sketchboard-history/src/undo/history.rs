#![forbid(unsafe_code)]

//! Undo/redo stacks, batching and the board-state mirror.
//!
//! [`HistoryManager`] owns the two stacks, the open batch (if any) and the
//! authoritative [`BoardState`] mirror. One manager exists per open board;
//! it is an ordinary value, constructed and owned by whoever hosts the
//! board session.
//!
//! # State machine
//!
//! ```text
//!            start_batch()
//!   ┌──────┐ ───────────► ┌──────────┐
//!   │ idle │              │ batching │ ── push_action(): append to batch
//!   └──────┘ ◄─────────── └──────────┘
//!            end_batch() / cancel_batch()
//! ```
//!
//! Nested batches are rejected: `start_batch` while batching returns
//! [`HistoryError::BatchAlreadyOpen`] and leaves the open batch untouched.
//!
//! # Invariants
//!
//! 1. `undo_stack.len() <= max_stack_size` and
//!    `redo_stack.len() <= max_stack_size` after every operation.
//! 2. The redo stack is cleared whenever a new action lands on the undo stack.
//! 3. A batch lands on the undo stack as exactly one entry; an empty batch
//!    does not land at all.
//! 4. Every mutating operation notifies every listener exactly once, in
//!    registration order, after the mutation.
//!
//! # Memory Model
//!
//! Stacks are `VecDeque`s so the oldest entry is evicted from the front in
//! O(1).
//!
//! ```text
//! push(a5), max_stack_size = 4
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [a2, a3, a4, a5]   (a1 evicted)   │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//!
//! undo() x2
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [a2, a3]                          │
//! │ Redo Stack: [a5, a4]                          │
//! └───────────────────────────────────────────────┘
//!
//! push(a6)  <-- new branch, clears redo
//! ┌───────────────────────────────────────────────┐
//! │ Undo Stack: [a2, a3, a6]                      │
//! │ Redo Stack: []                                │
//! └───────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sketchboard_core::BoardState;
use tracing::{debug, info_span, trace, warn};
use web_time::Instant;

use super::action::{Action, BatchId};
use super::apply::{apply_forward, apply_inverse, apply_recorded};
use super::factory::create_batch_action;
use crate::config::HistoryConfig;

/// Snapshot of the history counters, handed to every listener.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryInfo {
    pub undo_count: usize,
    pub redo_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Id of the open batch, if batching.
    pub current_batch_id: Option<BatchId>,
    /// Actions recorded so far in the open batch.
    pub batch_len: usize,
    pub next_undo_description: Option<String>,
    pub next_redo_description: Option<String>,
    pub max_stack_size: usize,
}

impl HistoryInfo {
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.current_batch_id.is_some()
    }
}

/// Errors from history operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// `start_batch` was called while another batch is open.
    BatchAlreadyOpen { open: BatchId },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchAlreadyOpen { open } => {
                write!(f, "batch {open} is already open; nested batches are not supported")
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Handle returned by [`HistoryManager::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&HistoryInfo)>;

struct OpenBatch {
    id: BatchId,
    description: String,
    actions: Vec<Action>,
}

/// Manager for undo/redo history of one board.
pub struct HistoryManager {
    /// Actions available for undo (newest at back).
    undo_stack: VecDeque<Action>,
    /// Actions available for redo (most recently undone at back).
    redo_stack: VecDeque<Action>,
    state: BoardState,
    batch: Option<OpenBatch>,
    config: HistoryConfig,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("batch", &self.batch.as_ref().map(|b| b.id.as_str()))
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::with_config(HistoryConfig::default())
    }
}

impl HistoryManager {
    /// A manager over an empty board with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            state: BoardState::default(),
            batch: None,
            config,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Record a completed edit.
    ///
    /// The action's forward effect is applied to the board mirror. Forward
    /// effects are idempotent, so a caller that already applied the edit to
    /// its own copy and synced it with [`update_state`](Self::update_state)
    /// sees no difference.
    ///
    /// While batching, the action is stamped with the batch id and appended
    /// to the open batch; stack counts do not change. Otherwise the redo
    /// stack is cleared, the action is pushed, and the oldest entry is
    /// evicted if the stack exceeds its bound.
    pub fn push_action(&mut self, mut action: Action) {
        apply_recorded(&mut self.state, &action);

        if let Some(batch) = self.batch.as_mut() {
            action.batch_id = Some(batch.id.clone());
            debug!(
                action_id = %action.id,
                kind = %action.kind(),
                batch_id = %batch.id,
                "action recorded into batch"
            );
            batch.actions.push(action);
        } else {
            self.record(action);
        }

        self.notify();
    }

    /// Undo the most recent action.
    ///
    /// Returns `false` if there is nothing to undo, or if a batch is open
    /// (close or cancel it first).
    pub fn undo(&mut self) -> bool {
        if self.refuse_while_batching("undo") {
            return false;
        }
        let Some(action) = self.undo_stack.pop_back() else {
            return false;
        };

        apply_inverse(&mut self.state, &action);
        debug!(
            action_id = %action.id,
            kind = %action.kind(),
            description = action.description.as_str(),
            "undo"
        );
        self.redo_stack.push_back(action);
        self.notify();
        true
    }

    /// Redo the most recently undone action.
    ///
    /// Returns `false` if there is nothing to redo, or if a batch is open.
    pub fn redo(&mut self) -> bool {
        if self.refuse_while_batching("redo") {
            return false;
        }
        let Some(action) = self.redo_stack.pop_back() else {
            return false;
        };

        apply_forward(&mut self.state, &action);
        debug!(
            action_id = %action.id,
            kind = %action.kind(),
            description = action.description.as_str(),
            "redo"
        );
        self.undo_stack.push_back(action);
        self.notify();
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ========================================================================
    // Batching
    // ========================================================================

    /// Open a batch scope. Actions pushed until [`end_batch`](Self::end_batch)
    /// become one undo entry.
    ///
    /// An empty `description` is replaced by a per-kind summary when the
    /// batch closes.
    pub fn start_batch(&mut self, description: &str) -> Result<BatchId, HistoryError> {
        if let Some(open) = &self.batch {
            warn!(batch_id = %open.id, "nested start_batch rejected");
            return Err(HistoryError::BatchAlreadyOpen {
                open: open.id.clone(),
            });
        }

        let id = BatchId::generate();
        debug!(batch_id = %id, description, "batch started");
        self.batch = Some(OpenBatch {
            id: id.clone(),
            description: description.to_string(),
            actions: Vec::new(),
        });
        self.notify();
        Ok(id)
    }

    /// Close the open batch.
    ///
    /// Returns the batch action that landed on the undo stack, or `None` if
    /// no batch was open or nothing was recorded in it.
    pub fn end_batch(&mut self) -> Option<Action> {
        let batch = self.batch.take()?;

        if batch.actions.is_empty() {
            debug!(batch_id = %batch.id, "empty batch closed");
            self.notify();
            return None;
        }

        let description = (!batch.description.is_empty()).then_some(batch.description.as_str());
        let action = create_batch_action(batch.id.clone(), batch.actions, description);
        debug!(
            batch_id = %batch.id,
            actions = action.children().len(),
            description = action.description.as_str(),
            "batch committed"
        );
        // Children were applied as they were pushed.
        self.record(action.clone());
        self.notify();
        Some(action)
    }

    /// Abandon the open batch, reverting the effects of its recorded actions.
    ///
    /// Returns the number of discarded actions (0 if no batch was open).
    pub fn cancel_batch(&mut self) -> usize {
        let Some(batch) = self.batch.take() else {
            return 0;
        };

        for action in batch.actions.iter().rev() {
            apply_inverse(&mut self.state, action);
        }
        let discarded = batch.actions.len();
        debug!(batch_id = %batch.id, discarded, "batch cancelled");
        self.notify();
        discarded
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    // ========================================================================
    // Board mirror
    // ========================================================================

    /// Replace the board mirror.
    ///
    /// Stacks are left as they are; the caller is responsible for the new
    /// state being consistent with them.
    pub fn update_state(&mut self, state: BoardState) {
        trace!(items = state.item_count(), "board mirror replaced");
        self.state = state;
        self.notify();
    }

    /// An independent copy of the board mirror.
    #[must_use]
    pub fn current_state(&self) -> BoardState {
        self.state.clone()
    }

    /// Borrow the board mirror for reading.
    #[must_use]
    pub fn state(&self) -> &BoardState {
        &self.state
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[must_use]
    pub fn history_info(&self) -> HistoryInfo {
        HistoryInfo {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            current_batch_id: self.batch.as_ref().map(|b| b.id.clone()),
            batch_len: self.batch.as_ref().map_or(0, |b| b.actions.len()),
            next_undo_description: self.undo_stack.back().map(|a| a.description.clone()),
            next_redo_description: self.redo_stack.back().map(|a| a.description.clone()),
            max_stack_size: self.max_stack_size(),
        }
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The action the next [`undo`](Self::undo) would revert.
    #[must_use]
    pub fn peek_undo(&self) -> Option<&Action> {
        self.undo_stack.back()
    }

    /// The action the next [`redo`](Self::redo) would re-apply (the one
    /// most recently undone).
    #[must_use]
    pub fn peek_redo(&self) -> Option<&Action> {
        self.redo_stack.back()
    }

    /// Descriptions of undoable actions, most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|a| a.description.as_str())
            .collect()
    }

    /// Descriptions of redoable actions, most recent first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|a| a.description.as_str())
            .collect()
    }

    /// Estimated bytes held by both stacks and the open batch.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        let batch = self
            .batch
            .iter()
            .flat_map(|b| b.actions.iter())
            .map(Action::size_bytes)
            .sum::<usize>();
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(Action::size_bytes)
            .sum::<usize>()
            + batch
    }

    #[must_use]
    pub fn max_stack_size(&self) -> usize {
        self.config.effective_max_stack_size()
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Empty both stacks and drop any open batch. The board mirror is not
    /// touched.
    pub fn clear(&mut self) {
        debug!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "history cleared"
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
        self.notify();
    }

    /// Change the stack bound (minimum 1), trimming both stacks from their
    /// oldest end.
    pub fn set_max_stack_size(&mut self, max_stack_size: usize) {
        self.config.max_stack_size = max_stack_size.max(1);
        self.enforce_limits();
        self.notify();
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a listener, called with fresh [`HistoryInfo`] after every
    /// mutating operation.
    pub fn add_listener(&mut self, listener: impl Fn(&HistoryInfo) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Land an already-applied action on the undo stack.
    fn record(&mut self, action: Action) {
        if !self.redo_stack.is_empty() {
            debug!(dropped = self.redo_stack.len(), "redo stack invalidated");
            self.redo_stack.clear();
        }
        debug!(
            action_id = %action.id,
            kind = %action.kind(),
            description = action.description.as_str(),
            "action pushed"
        );
        self.undo_stack.push_back(action);
        self.enforce_limits();
    }

    /// Evict oldest entries until both stacks fit the bound.
    fn enforce_limits(&mut self) {
        let max = self.max_stack_size();
        while self.undo_stack.len() > max {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!(action_id = %evicted.id, "evicted oldest undo entry");
            }
        }
        while self.redo_stack.len() > max {
            if let Some(evicted) = self.redo_stack.pop_front() {
                debug!(action_id = %evicted.id, "evicted oldest redo entry");
            }
        }
    }

    fn refuse_while_batching(&self, operation: &str) -> bool {
        match &self.batch {
            Some(batch) => {
                warn!(batch_id = %batch.id, operation, "refused while a batch is open");
                true
            }
            None => false,
        }
    }

    fn notify(&self) {
        if self.listeners.is_empty() {
            return;
        }

        let info = self.history_info();
        let start = Instant::now();
        let _span = info_span!(
            "history.notify",
            listeners = self.listeners.len() as u64,
            duration_us = tracing::field::Empty
        )
        .entered();

        for (_, listener) in &self.listeners {
            listener(&info);
        }

        let duration_us = start.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::action::ActionKind;
    use crate::undo::factory::*;
    use sketchboard_core::{ImageItem, ItemKind, TextItem, TransformState};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn image(id: &str, x: f64) -> ImageItem {
        ImageItem::new(id, "blob:img", TransformState::new(x, x, 64.0, 64.0))
    }

    fn add(id: &str) -> Action {
        create_add_image_action(&image(id, 0.0), None)
    }

    fn recorder(mgr: &mut HistoryManager) -> Rc<RefCell<Vec<HistoryInfo>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        mgr.add_listener(move |info| sink.borrow_mut().push(info.clone()));
        seen
    }

    #[test]
    fn test_new_manager() {
        let mgr = HistoryManager::new();
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert_eq!(mgr.undo_depth(), 0);
        assert_eq!(mgr.redo_depth(), 0);
        assert!(mgr.state().is_empty());
        assert_eq!(mgr.max_stack_size(), 100);
    }

    #[test]
    fn test_push_applies_and_enables_undo() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));

        assert!(mgr.can_undo());
        assert!(!mgr.can_redo());
        assert!(mgr.state().contains(ItemKind::Image, "a"));
    }

    #[test]
    fn test_undo_redo_moves_between_stacks() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));

        assert!(mgr.undo());
        assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (0, 1));
        assert!(mgr.state().is_empty());

        assert!(mgr.redo());
        assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (1, 0));
        assert!(mgr.state().contains(ItemKind::Image, "a"));
    }

    #[test]
    fn test_exhausted_undo_redo_return_false() {
        let mut mgr = HistoryManager::new();
        let seen = recorder(&mut mgr);
        assert!(!mgr.undo());
        assert!(!mgr.redo());
        assert!(seen.borrow().is_empty(), "no-ops do not notify");
    }

    #[test]
    fn test_push_clears_redo() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));
        mgr.push_action(add("b"));
        mgr.undo();
        mgr.undo();
        assert_eq!(mgr.redo_depth(), 2);

        mgr.push_action(add("c"));
        assert!(!mgr.can_redo());
        assert_eq!(mgr.undo_depth(), 1);
    }

    #[test]
    fn test_max_stack_size_evicts_oldest() {
        let mut mgr = HistoryManager::with_config(HistoryConfig::new(3));
        for id in ["a", "b", "c", "d", "e"] {
            mgr.push_action(add(id));
        }
        assert_eq!(mgr.undo_depth(), 3);

        while mgr.undo() {}
        // a and b are still on the board: their adds were evicted, not undone.
        let ids: Vec<_> = mgr.state().images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_set_max_stack_size_trims_both_stacks() {
        let mut mgr = HistoryManager::new();
        for id in ["a", "b", "c", "d", "e", "f"] {
            mgr.push_action(add(id));
        }
        mgr.undo();
        mgr.undo();
        mgr.undo();
        assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (3, 3));

        mgr.set_max_stack_size(2);
        assert_eq!((mgr.undo_depth(), mgr.redo_depth()), (2, 2));
        // Oldest undo entries go first: b and c remain.
        assert_eq!(mgr.undo_descriptions(10).len(), 2);
        // Redo keeps the two most recently undone (d, e); f was farthest out.
        mgr.redo();
        mgr.redo();
        assert!(!mgr.can_redo());
        assert!(mgr.state().contains(ItemKind::Image, "e"));
        assert!(!mgr.state().contains(ItemKind::Image, "f"));
    }

    #[test]
    fn test_set_max_stack_size_minimum_is_one() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));
        mgr.push_action(add("b"));
        mgr.set_max_stack_size(0);
        assert_eq!(mgr.max_stack_size(), 1);
        assert_eq!(mgr.undo_depth(), 1);
    }

    #[test]
    fn test_batch_lands_as_single_entry() {
        let mut mgr = HistoryManager::new();
        let batch_id = mgr.start_batch("Drop three images").unwrap();
        mgr.push_action(add("a"));
        mgr.push_action(add("b"));
        mgr.push_action(add("c"));
        assert_eq!(mgr.undo_depth(), 0);
        assert_eq!(mgr.history_info().batch_len, 3);

        let batch = mgr.end_batch().expect("batch recorded");
        assert_eq!(batch.kind(), ActionKind::Batch);
        assert_eq!(batch.description, "Drop three images");
        assert_eq!(batch.batch_id.as_ref(), Some(&batch_id));
        assert!(batch.children().iter().all(|c| c.batch_id.as_ref() == Some(&batch_id)));
        assert_eq!(mgr.undo_depth(), 1);

        assert!(mgr.undo());
        assert!(mgr.state().is_empty());
    }

    #[test]
    fn test_batch_without_description_is_summarised() {
        let mut mgr = HistoryManager::new();
        mgr.start_batch("").unwrap();
        mgr.push_action(add("a"));
        mgr.push_action(add("b"));
        let batch = mgr.end_batch().unwrap();
        assert_eq!(batch.description, "2 add images");
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));
        let before = mgr.history_info();

        mgr.start_batch("nothing").unwrap();
        assert!(mgr.end_batch().is_none());
        assert_eq!(mgr.history_info(), before);
    }

    #[test]
    fn test_end_batch_without_open_batch() {
        let mut mgr = HistoryManager::new();
        assert!(mgr.end_batch().is_none());
    }

    #[test]
    fn test_nested_start_batch_rejected() {
        let mut mgr = HistoryManager::new();
        let first = mgr.start_batch("outer").unwrap();
        mgr.push_action(add("a"));

        let err = mgr.start_batch("inner").unwrap_err();
        assert_eq!(err, HistoryError::BatchAlreadyOpen { open: first.clone() });
        assert_eq!(mgr.history_info().current_batch_id, Some(first));
        assert_eq!(mgr.history_info().batch_len, 1, "recorded actions kept");
    }

    #[test]
    fn test_cancel_batch_reverts_effects() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("keep"));
        mgr.start_batch("drag").unwrap();
        mgr.push_action(add("a"));
        mgr.push_action(create_transform_image_action(
            "a",
            TransformState::new(0.0, 0.0, 64.0, 64.0),
            TransformState::new(9.0, 9.0, 64.0, 64.0),
            None,
        ));

        assert_eq!(mgr.cancel_batch(), 2);
        assert!(!mgr.is_batching());
        assert_eq!(mgr.undo_depth(), 1);
        let ids: Vec<_> = mgr.state().images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["keep"]);
        assert_eq!(mgr.cancel_batch(), 0);
    }

    #[test]
    fn test_undo_refused_while_batching() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));
        mgr.start_batch("gesture").unwrap();
        assert!(!mgr.undo());
        assert!(!mgr.redo());
        mgr.end_batch();
        assert!(mgr.undo());
    }

    #[test]
    fn test_clear_keeps_board() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));
        mgr.push_action(add("b"));
        mgr.undo();
        mgr.start_batch("open").unwrap();

        mgr.clear();
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert!(!mgr.is_batching());
        assert!(mgr.state().contains(ItemKind::Image, "a"));
    }

    #[test]
    fn test_state_copies_are_independent() {
        let mut mgr = HistoryManager::new();
        let mut board = BoardState::new();
        board.upsert_text(TextItem::new("t", "hi", TransformState::default()));
        mgr.update_state(board.clone());

        board.set_text("t", "mutated outside");
        let mut copy = mgr.current_state();
        copy.set_text("t", "mutated copy");

        assert_eq!(mgr.state().text("t").map(|t| t.text.as_str()), Some("hi"));
    }

    #[test]
    fn test_listeners_notified_in_order_with_fresh_info() {
        let mut mgr = HistoryManager::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (Rc::clone(&order), Rc::clone(&order));
        mgr.add_listener(move |info| o1.borrow_mut().push(("first", info.undo_count)));
        mgr.add_listener(move |info| o2.borrow_mut().push(("second", info.undo_count)));

        mgr.push_action(add("a"));
        assert_eq!(*order.borrow(), [("first", 1), ("second", 1)]);
    }

    #[test]
    fn test_every_mutation_notifies_once() {
        let mut mgr = HistoryManager::new();
        let seen = recorder(&mut mgr);

        mgr.push_action(add("a"));
        mgr.undo();
        mgr.redo();
        mgr.start_batch("b").unwrap();
        mgr.push_action(add("b"));
        mgr.end_batch();
        mgr.set_max_stack_size(10);
        mgr.update_state(mgr.current_state());
        mgr.clear();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen[4].batch_len, 1);
        assert_eq!(seen[4].undo_count, 1, "batched pushes leave counts alone");
        assert_eq!(seen[5].undo_count, 2);
        assert!(!seen[8].can_undo);
    }

    #[test]
    fn test_remove_listener() {
        let mut mgr = HistoryManager::new();
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let id = mgr.add_listener(move |_| *sink.borrow_mut() += 1);

        mgr.push_action(add("a"));
        assert!(mgr.remove_listener(id));
        assert!(!mgr.remove_listener(id));
        mgr.push_action(add("b"));
        assert_eq!(*seen.borrow(), 1);
        assert_eq!(mgr.listener_count(), 0);
    }

    #[test]
    fn test_descriptions_and_peek() {
        let mut mgr = HistoryManager::new();
        mgr.push_action(add("a"));
        mgr.push_action(create_edit_text_action("t", "", "x", 0, 1, None));

        assert_eq!(mgr.undo_descriptions(5), ["Edit text", "Add image"]);
        assert_eq!(mgr.history_info().next_undo_description.as_deref(), Some("Edit text"));

        mgr.undo();
        let undone = mgr.peek_redo().unwrap();
        assert_eq!(undone.kind(), ActionKind::EditText);
        assert_eq!(mgr.redo_descriptions(5), ["Edit text"]);
        assert_eq!(mgr.peek_undo().map(|a| a.kind()), Some(ActionKind::AddImage));
    }

    #[test]
    fn test_memory_usage_tracks_stacks() {
        let mut mgr = HistoryManager::new();
        assert_eq!(mgr.memory_usage(), 0);
        mgr.push_action(add("a"));
        let after_push = mgr.memory_usage();
        assert!(after_push > 0);
        mgr.undo();
        assert_eq!(mgr.memory_usage(), after_push);
        mgr.clear();
        assert_eq!(mgr.memory_usage(), 0);
    }

    #[test]
    fn test_debug_impl() {
        let mgr = HistoryManager::new();
        let debug_str = format!("{mgr:?}");
        assert!(debug_str.contains("HistoryManager"));
        assert!(debug_str.contains("undo_depth"));
    }

    #[test]
    fn test_error_display() {
        let err = HistoryError::BatchAlreadyOpen {
            open: BatchId::from_raw("batch-1"),
        };
        assert_eq!(
            err.to_string(),
            "batch batch-1 is already open; nested batches are not supported"
        );
    }
}
