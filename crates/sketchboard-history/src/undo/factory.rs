#![forbid(unsafe_code)]

//! Construction and structural validation of [`Action`] values.
//!
//! The factory holds no state. Every constructor copies its inputs into a
//! self-contained action stamped with a fresh [`ActionId`], the current time
//! and a description (the caller's override, or a default such as
//! "Add image").
//!
//! Constructors never fail: payloads are assumed to be validated by the
//! caller. [`validate_action`] is the structural check to run on actions
//! that come from less trusted places (deserialized, scripted) before they
//! reach the history manager.
//!
//! [`ActionId`]: super::action::ActionId

use std::fmt;

use sketchboard_core::{ImageItem, SelectedItem, Stroke, TextItem, TransformState, VideoItem};

use super::action::{Action, ActionKind, ActionPayload, BatchId};

fn stamp(
    payload: ActionPayload,
    description: Option<&str>,
    default: impl FnOnce() -> String,
) -> Action {
    let description = match description {
        Some(text) => text.to_string(),
        None => default(),
    };
    Action::new(payload, description)
}

// ============================================================================
// Add
// ============================================================================

/// Record an image placed on the board.
#[must_use]
pub fn create_add_image_action(item: &ImageItem, description: Option<&str>) -> Action {
    stamp(
        ActionPayload::AddImage { item: item.clone() },
        description,
        || "Add image".into(),
    )
}

#[must_use]
pub fn create_add_video_action(item: &VideoItem, description: Option<&str>) -> Action {
    stamp(
        ActionPayload::AddVideo { item: item.clone() },
        description,
        || "Add video".into(),
    )
}

#[must_use]
pub fn create_add_text_action(item: &TextItem, description: Option<&str>) -> Action {
    stamp(
        ActionPayload::AddText { item: item.clone() },
        description,
        || "Add text".into(),
    )
}

/// Record a finished pen stroke. The point list is copied.
#[must_use]
pub fn create_add_stroke_action(item: &Stroke, description: Option<&str>) -> Action {
    stamp(
        ActionPayload::AddStroke { item: item.clone() },
        description,
        || "Add stroke".into(),
    )
}

// ============================================================================
// Delete
// ============================================================================

/// Record an image removed from the board.
///
/// `item_id` is expected to equal `item.id`; this is not checked.
#[must_use]
pub fn create_delete_image_action(
    item_id: &str,
    item: &ImageItem,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::DeleteImage {
            item_id: item_id.to_string(),
            item: item.clone(),
        },
        description,
        || "Delete image".into(),
    )
}

#[must_use]
pub fn create_delete_video_action(
    item_id: &str,
    item: &VideoItem,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::DeleteVideo {
            item_id: item_id.to_string(),
            item: item.clone(),
        },
        description,
        || "Delete video".into(),
    )
}

#[must_use]
pub fn create_delete_text_action(
    item_id: &str,
    item: &TextItem,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::DeleteText {
            item_id: item_id.to_string(),
            item: item.clone(),
        },
        description,
        || "Delete text".into(),
    )
}

#[must_use]
pub fn create_delete_stroke_action(
    item_id: &str,
    item: &Stroke,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::DeleteStroke {
            item_id: item_id.to_string(),
            item: item.clone(),
        },
        description,
        || "Delete stroke".into(),
    )
}

// ============================================================================
// Transform
// ============================================================================

/// Record a move/resize/rotate of an image.
#[must_use]
pub fn create_transform_image_action(
    item_id: &str,
    old_transform: TransformState,
    new_transform: TransformState,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::TransformImage {
            item_id: item_id.to_string(),
            old_transform,
            new_transform,
        },
        description,
        || "Transform image".into(),
    )
}

#[must_use]
pub fn create_transform_video_action(
    item_id: &str,
    old_transform: TransformState,
    new_transform: TransformState,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::TransformVideo {
            item_id: item_id.to_string(),
            old_transform,
            new_transform,
        },
        description,
        || "Transform video".into(),
    )
}

#[must_use]
pub fn create_transform_text_action(
    item_id: &str,
    old_transform: TransformState,
    new_transform: TransformState,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::TransformText {
            item_id: item_id.to_string(),
            old_transform,
            new_transform,
        },
        description,
        || "Transform text".into(),
    )
}

// ============================================================================
// Text and selection
// ============================================================================

/// Record a committed text edit. Cursor positions are char offsets.
#[must_use]
pub fn create_edit_text_action(
    item_id: &str,
    old_text: &str,
    new_text: &str,
    old_cursor_pos: usize,
    new_cursor_pos: usize,
    description: Option<&str>,
) -> Action {
    stamp(
        ActionPayload::EditText {
            item_id: item_id.to_string(),
            old_text: old_text.to_string(),
            new_text: new_text.to_string(),
            old_cursor_pos,
            new_cursor_pos,
        },
        description,
        || "Edit text".into(),
    )
}

/// Record a selection change.
#[must_use]
pub fn create_select_items_action(
    old_selection: &[SelectedItem],
    new_selection: &[SelectedItem],
    description: Option<&str>,
) -> Action {
    let count = new_selection.len();
    stamp(
        ActionPayload::SelectItems {
            old_selection: old_selection.to_vec(),
            new_selection: new_selection.to_vec(),
        },
        description,
        || match count {
            0 => "Clear selection".into(),
            1 => "Select 1 item".into(),
            n => format!("Select {n} items"),
        },
    )
}

/// Wrap recorded actions into one undoable unit.
///
/// Without a description override the summary from
/// [`create_batch_description`] is used.
#[must_use]
pub fn create_batch_action(
    batch_id: BatchId,
    actions: Vec<Action>,
    description: Option<&str>,
) -> Action {
    let summary = create_batch_description(&actions);
    let mut action = stamp(
        ActionPayload::Batch {
            batch_id: batch_id.clone(),
            actions,
        },
        description,
        || summary,
    );
    action.batch_id = Some(batch_id);
    action
}

// ============================================================================
// Classification
// ============================================================================

#[must_use]
pub fn is_transform_action(action: &Action) -> bool {
    action.kind().is_transform()
}

#[must_use]
pub fn is_add_action(action: &Action) -> bool {
    action.kind().is_add()
}

#[must_use]
pub fn is_delete_action(action: &Action) -> bool {
    action.kind().is_delete()
}

fn summary_phrase(kind: ActionKind, count: usize) -> String {
    let plural = count != 1;
    match kind {
        ActionKind::SelectItems => {
            format!("{count} selection change{}", if plural { "s" } else { "" })
        }
        ActionKind::Batch => format!("{count} batch{}", if plural { "es" } else { "" }),
        _ => {
            let verb = if kind.is_add() {
                "add"
            } else if kind.is_delete() {
                "delete"
            } else if kind.is_transform() {
                "transform"
            } else {
                "edit"
            };
            let noun = kind.target_kind().map_or("item", |k| k.as_str());
            format!("{count} {verb} {noun}{}", if plural { "s" } else { "" })
        }
    }
}

/// Human-readable summary of a batch, e.g. `"3 add images, 1 delete text"`.
///
/// Kinds are listed in order of first appearance.
#[must_use]
pub fn create_batch_description(actions: &[Action]) -> String {
    if actions.is_empty() {
        return "Empty batch".into();
    }

    let mut counts: Vec<(ActionKind, usize)> = Vec::new();
    for action in actions {
        let kind = action.kind();
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }

    counts
        .into_iter()
        .map(|(kind, n)| summary_phrase(kind, n))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Validation
// ============================================================================

/// Structural defects found by [`validate_action`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The action id is empty.
    MissingActionId,
    /// The entity id carried by the action is empty.
    MissingItemId(ActionKind),
    /// A stroke without points.
    EmptyStroke { item_id: String },
    /// A transform snapshot contains NaN or infinity.
    NonFiniteTransform { kind: ActionKind, item_id: String },
    /// A cursor position past the end of its text.
    CursorOutOfBounds {
        item_id: String,
        position: usize,
        length: usize,
    },
    /// A batch without sub-actions.
    EmptyBatch,
    /// A batch whose batch id is empty.
    MissingBatchId,
    /// A sub-action of a batch is invalid.
    InvalidChild {
        index: usize,
        error: Box<ValidationError>,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingActionId => write!(f, "action id is empty"),
            Self::MissingItemId(kind) => write!(f, "{kind} action has an empty item id"),
            Self::EmptyStroke { item_id } => write!(f, "stroke '{item_id}' has no points"),
            Self::NonFiniteTransform { kind, item_id } => {
                write!(f, "{kind} action for '{item_id}' has a non-finite transform")
            }
            Self::CursorOutOfBounds {
                item_id,
                position,
                length,
            } => write!(
                f,
                "cursor {position} out of bounds for text '{item_id}' (length {length})"
            ),
            Self::EmptyBatch => write!(f, "batch has no sub-actions"),
            Self::MissingBatchId => write!(f, "batch id is empty"),
            Self::InvalidChild { index, error } => {
                write!(f, "batch sub-action {index}: {error}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn require_id(kind: ActionKind, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::MissingItemId(kind));
    }
    Ok(())
}

fn require_finite(
    kind: ActionKind,
    item_id: &str,
    transforms: [TransformState; 2],
) -> Result<(), ValidationError> {
    if transforms.iter().all(|t| t.is_finite()) {
        return Ok(());
    }
    Err(ValidationError::NonFiniteTransform {
        kind,
        item_id: item_id.to_string(),
    })
}

fn require_cursor(item_id: &str, text: &str, position: usize) -> Result<(), ValidationError> {
    let length = text.chars().count();
    if position > length {
        return Err(ValidationError::CursorOutOfBounds {
            item_id: item_id.to_string(),
            position,
            length,
        });
    }
    Ok(())
}

/// Check that an action carries every field its kind needs, in the
/// expected shape.
///
/// This is structural only: it does not check the action against a board
/// (e.g. whether a transformed entity exists).
pub fn validate_action(action: &Action) -> Result<(), ValidationError> {
    if action.id.as_str().is_empty() {
        return Err(ValidationError::MissingActionId);
    }

    let kind = action.kind();
    match &action.payload {
        ActionPayload::AddImage { item } | ActionPayload::DeleteImage { item, .. } => {
            require_id(kind, &item.id)?;
        }
        ActionPayload::AddVideo { item } | ActionPayload::DeleteVideo { item, .. } => {
            require_id(kind, &item.id)?;
        }
        ActionPayload::AddText { item } | ActionPayload::DeleteText { item, .. } => {
            require_id(kind, &item.id)?;
        }
        ActionPayload::AddStroke { item } | ActionPayload::DeleteStroke { item, .. } => {
            require_id(kind, &item.id)?;
            if item.points.is_empty() {
                return Err(ValidationError::EmptyStroke {
                    item_id: item.id.clone(),
                });
            }
        }
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
            require_id(kind, item_id)?;
            require_finite(kind, item_id, [*old_transform, *new_transform])?;
        }
        ActionPayload::EditText {
            item_id,
            old_text,
            new_text,
            old_cursor_pos,
            new_cursor_pos,
        } => {
            require_id(kind, item_id)?;
            require_cursor(item_id, old_text, *old_cursor_pos)?;
            require_cursor(item_id, new_text, *new_cursor_pos)?;
        }
        ActionPayload::SelectItems {
            old_selection,
            new_selection,
        } => {
            for selected in old_selection.iter().chain(new_selection) {
                require_id(kind, &selected.id)?;
            }
        }
        ActionPayload::Batch { batch_id, actions } => {
            if batch_id.as_str().is_empty() {
                return Err(ValidationError::MissingBatchId);
            }
            if actions.is_empty() {
                return Err(ValidationError::EmptyBatch);
            }
            for (index, child) in actions.iter().enumerate() {
                validate_action(child).map_err(|error| ValidationError::InvalidChild {
                    index,
                    error: Box::new(error),
                })?;
            }
        }
    }

    // Delete actions additionally need the id they remove by.
    match &action.payload {
        ActionPayload::DeleteImage { item_id, .. }
        | ActionPayload::DeleteVideo { item_id, .. }
        | ActionPayload::DeleteText { item_id, .. }
        | ActionPayload::DeleteStroke { item_id, .. } => require_id(kind, item_id),
        _ => Ok(()),
    }
}

/// [`validate_action`] as a pass/fail flag.
#[must_use]
pub fn is_valid_action(action: &Action) -> bool {
    validate_action(action).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::action::ActionId;
    use sketchboard_core::{ItemKind, Point};

    fn image(id: &str) -> ImageItem {
        ImageItem::new(
            id,
            "https://cdn.example/a.png",
            TransformState::new(10.0, 10.0, 64.0, 64.0),
        )
    }

    #[test]
    fn add_copies_item_and_defaults_description() {
        let mut item = image("img1");
        let action = create_add_image_action(&item, None);
        item.transform.x = 999.0;

        assert_eq!(action.description, "Add image");
        match &action.payload {
            ActionPayload::AddImage { item: recorded } => assert_eq!(recorded.transform.x, 10.0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn description_override_wins() {
        let action = create_add_text_action(
            &TextItem::new("t1", "hi", TransformState::default()),
            Some("Paste text"),
        );
        assert_eq!(action.description, "Paste text");
    }

    #[test]
    fn stroke_points_are_copied() {
        let mut stroke = Stroke::new("s1", vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let action = create_add_stroke_action(&stroke, None);
        stroke.points.clear();
        match &action.payload {
            ActionPayload::AddStroke { item } => assert_eq!(item.points.len(), 2),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn select_default_descriptions() {
        let one = [SelectedItem::new("a", ItemKind::Image)];
        let two = [
            SelectedItem::new("a", ItemKind::Image),
            SelectedItem::new("b", ItemKind::Text),
        ];
        assert_eq!(create_select_items_action(&[], &one, None).description, "Select 1 item");
        assert_eq!(create_select_items_action(&one, &two, None).description, "Select 2 items");
        assert_eq!(create_select_items_action(&two, &[], None).description, "Clear selection");
    }

    #[test]
    fn every_constructor_yields_a_valid_action() {
        let t0 = TransformState::new(0.0, 0.0, 10.0, 10.0);
        let t1 = t0.moved_to(5.0, 5.0);
        let video = VideoItem::new("v1", "blob:v", t0);
        let text = TextItem::new("t1", "hello", t0);
        let stroke = Stroke::new("s1", vec![Point::new(1.0, 2.0)]);
        let actions = vec![
            create_add_image_action(&image("i1"), None),
            create_add_video_action(&video, None),
            create_add_text_action(&text, None),
            create_add_stroke_action(&stroke, None),
            create_delete_image_action("i1", &image("i1"), None),
            create_delete_video_action("v1", &video, None),
            create_delete_text_action("t1", &text, None),
            create_delete_stroke_action("s1", &stroke, None),
            create_transform_image_action("i1", t0, t1, None),
            create_transform_video_action("v1", t0, t1, None),
            create_transform_text_action("t1", t0, t1, None),
            create_edit_text_action("t1", "hello", "hello!", 5, 6, None),
            create_select_items_action(&[], &[SelectedItem::new("i1", ItemKind::Image)], None),
        ];
        for action in &actions {
            assert!(is_valid_action(action), "{:?} should validate", action.kind());
        }
        let batch = create_batch_action(BatchId::generate(), actions, None);
        assert_eq!(validate_action(&batch), Ok(()));
    }

    #[test]
    fn validation_rejects_missing_fields() {
        let mut action = create_add_image_action(&image(""), None);
        assert_eq!(
            validate_action(&action),
            Err(ValidationError::MissingItemId(ActionKind::AddImage))
        );

        action = create_add_image_action(&image("ok"), None);
        action.id = ActionId::from_raw("");
        assert_eq!(validate_action(&action), Err(ValidationError::MissingActionId));

        let empty_stroke = create_add_stroke_action(&Stroke::new("s", vec![]), None);
        assert!(matches!(
            validate_action(&empty_stroke),
            Err(ValidationError::EmptyStroke { .. })
        ));

        let delete = create_delete_image_action("", &image("a"), None);
        assert_eq!(
            validate_action(&delete),
            Err(ValidationError::MissingItemId(ActionKind::DeleteImage))
        );
    }

    #[test]
    fn validation_rejects_non_finite_transform() {
        let bad = TransformState::default().moved_to(f64::NAN, 0.0);
        let action = create_transform_video_action("v", TransformState::default(), bad, None);
        let err = validate_action(&action).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn validation_checks_cursor_bounds_in_chars() {
        let ok = create_edit_text_action("t", "héllo", "héllo!", 5, 6, None);
        assert!(is_valid_action(&ok));

        let bad = create_edit_text_action("t", "ab", "abc", 3, 3, None);
        assert_eq!(
            validate_action(&bad),
            Err(ValidationError::CursorOutOfBounds {
                item_id: "t".into(),
                position: 3,
                length: 2
            })
        );
    }

    #[test]
    fn validation_rejects_empty_and_poisoned_batches() {
        let empty = create_batch_action(BatchId::generate(), Vec::new(), None);
        assert_eq!(validate_action(&empty), Err(ValidationError::EmptyBatch));

        let nameless = create_batch_action(
            BatchId::from_raw(""),
            vec![create_add_image_action(&image("a"), None)],
            None,
        );
        assert_eq!(validate_action(&nameless), Err(ValidationError::MissingBatchId));

        let poisoned = create_batch_action(
            BatchId::generate(),
            vec![
                create_add_image_action(&image("a"), None),
                create_add_image_action(&image(""), None),
            ],
            None,
        );
        assert!(matches!(
            validate_action(&poisoned),
            Err(ValidationError::InvalidChild { index: 1, .. })
        ));
    }

    #[test]
    fn classification_helpers() {
        let add = create_add_image_action(&image("a"), None);
        let del = create_delete_image_action("a", &image("a"), None);
        let mv = create_transform_image_action(
            "a",
            TransformState::default(),
            TransformState::default(),
            None,
        );
        assert!(is_add_action(&add) && !is_delete_action(&add));
        assert!(is_delete_action(&del) && !is_transform_action(&del));
        assert!(is_transform_action(&mv) && !is_add_action(&mv));
    }

    #[test]
    fn batch_description_counts_per_kind() {
        let text = TextItem::new("t", "x", TransformState::default());
        let actions = vec![
            create_add_image_action(&image("a"), None),
            create_add_image_action(&image("b"), None),
            create_delete_text_action("t", &text, None),
            create_add_image_action(&image("c"), None),
        ];
        assert_eq!(
            create_batch_description(&actions),
            "3 add images, 1 delete text"
        );
        assert_eq!(create_batch_description(&[]), "Empty batch");
    }

    #[test]
    fn batch_action_carries_batch_id_and_summary() {
        let id = BatchId::generate();
        let batch = create_batch_action(
            id.clone(),
            vec![create_add_image_action(&image("a"), None)],
            None,
        );
        assert_eq!(batch.batch_id.as_ref(), Some(&id));
        assert_eq!(batch.description, "1 add image");
        assert!(batch.is_batch());
    }
}
