#![forbid(unsafe_code)]

//! Forward and inverse effects of actions on a [`BoardState`].
//!
//! | Kind        | Forward                         | Inverse                          |
//! |-------------|---------------------------------|----------------------------------|
//! | Add-X       | insert item into X              | remove item by id from X         |
//! | Delete-X    | remove item by id from X        | re-insert the stored item into X |
//! | Transform-X | set transform to `new_transform`| set transform to `old_transform` |
//! | Edit-text   | set text to `new_text`          | set text to `old_text`           |
//! | Select      | set selection to `new_selection`| set selection to `old_selection` |
//! | Batch       | children forward, in order      | children inverse, reverse order  |
//!
//! Every single-action effect is a "set" (insert-or-replace, remove-if-present,
//! overwrite), so applying the same effect twice leaves the board as applying
//! it once. Effects aimed at an entity that is not on the board are skipped
//! with a warning. [`apply_recorded`] is the forward replay used when an edit
//! is first recorded: a delete whose target the caller already removed is
//! expected there and only logged at debug level.
//!
//! Undoing a delete re-appends the stored item at the end of its collection
//! (top of the paint order) and leaves the selection as it is. The entity's
//! former position and any selection reference to it are not restored.

use sketchboard_core::{BoardState, ItemKind};
use tracing::{debug, trace, warn};

use super::action::{Action, ActionPayload};

/// Which way an action is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Redo (or first application).
    Forward,
    /// Undo.
    Inverse,
}

impl Direction {
    fn pick<'a, T: ?Sized>(self, old: &'a T, new: &'a T) -> &'a T {
        match self {
            Self::Forward => new,
            Self::Inverse => old,
        }
    }
}

/// Apply an action's forward effect.
pub fn apply_forward(state: &mut BoardState, action: &Action) {
    apply(state, action, Direction::Forward);
}

/// Apply an action's inverse effect.
pub fn apply_inverse(state: &mut BoardState, action: &Action) {
    apply(state, action, Direction::Inverse);
}

/// Apply the forward effect of an action being recorded for the first time.
///
/// Same effect as [`apply_forward`]; the board may already reflect the edit.
pub fn apply_recorded(state: &mut BoardState, action: &Action) {
    replay(state, action, Direction::Forward, true);
}

fn remove(state: &mut BoardState, kind: ItemKind, id: &str, action: &Action, recording: bool) {
    if state.remove(kind, id) {
        return;
    }
    if recording {
        debug!(
            action_id = %action.id,
            kind = %kind,
            item_id = id,
            "remove skipped: item already gone"
        );
    } else {
        warn!(
            action_id = %action.id,
            kind = %kind,
            item_id = id,
            "remove skipped: item not on board"
        );
    }
}

/// Re-insert the item carried by an add or delete payload.
fn insert(state: &mut BoardState, payload: &ActionPayload) {
    match payload {
        ActionPayload::AddImage { item } | ActionPayload::DeleteImage { item, .. } => {
            state.upsert_image(item.clone());
        }
        ActionPayload::AddVideo { item } | ActionPayload::DeleteVideo { item, .. } => {
            state.upsert_video(item.clone());
        }
        ActionPayload::AddText { item } | ActionPayload::DeleteText { item, .. } => {
            state.upsert_text(item.clone());
        }
        ActionPayload::AddStroke { item } | ActionPayload::DeleteStroke { item, .. } => {
            state.upsert_stroke(item.clone());
        }
        _ => {}
    }
}

/// Apply `action` to `state` in the given direction.
pub fn apply(state: &mut BoardState, action: &Action, direction: Direction) {
    replay(state, action, direction, false);
}

fn replay(state: &mut BoardState, action: &Action, direction: Direction, recording: bool) {
    trace!(
        action_id = %action.id,
        kind = %action.kind(),
        ?direction,
        "apply action"
    );

    let kind = action.kind();
    match &action.payload {
        payload @ (ActionPayload::AddImage { .. }
        | ActionPayload::AddVideo { .. }
        | ActionPayload::AddText { .. }
        | ActionPayload::AddStroke { .. }) => match direction {
            Direction::Forward => insert(state, payload),
            Direction::Inverse => {
                if let (Some(item_kind), Some(id)) = (kind.target_kind(), action.target_id()) {
                    remove(state, item_kind, id, action, recording);
                }
            }
        },
        payload @ (ActionPayload::DeleteImage { item_id, .. }
        | ActionPayload::DeleteVideo { item_id, .. }
        | ActionPayload::DeleteText { item_id, .. }
        | ActionPayload::DeleteStroke { item_id, .. }) => match direction {
            Direction::Forward => {
                if let Some(item_kind) = kind.target_kind() {
                    remove(state, item_kind, item_id, action, recording);
                }
            }
            Direction::Inverse => insert(state, payload),
        },
        ActionPayload::TransformImage {
            item_id,
            old_transform,
            new_transform,
        }
        | ActionPayload::TransformVideo {
            item_id,
            old_transform,
            new_transform,
        }
        | ActionPayload::TransformText {
            item_id,
            old_transform,
            new_transform,
        } => {
            let target = *direction.pick(old_transform, new_transform);
            let applied = kind
                .target_kind()
                .is_some_and(|item_kind| state.set_transform(item_kind, item_id, target));
            if !applied {
                warn!(
                    action_id = %action.id,
                    item_id = item_id.as_str(),
                    "transform skipped: item not on board"
                );
            }
        }
        ActionPayload::EditText {
            item_id,
            old_text,
            new_text,
            ..
        } => {
            if !state.set_text(item_id, direction.pick(old_text, new_text)) {
                warn!(
                    action_id = %action.id,
                    item_id = item_id.as_str(),
                    "text edit skipped: item not on board"
                );
            }
        }
        ActionPayload::SelectItems {
            old_selection,
            new_selection,
        } => {
            state.set_selection(direction.pick(old_selection, new_selection).clone());
        }
        ActionPayload::Batch { actions, .. } => match direction {
            Direction::Forward => {
                for child in actions {
                    replay(state, child, Direction::Forward, recording);
                }
            }
            // A later child may depend on an earlier one (transform after
            // add), so inversion walks the recording backwards.
            Direction::Inverse => {
                for child in actions.iter().rev() {
                    replay(state, child, Direction::Inverse, recording);
                }
            }
        },
    }
}
