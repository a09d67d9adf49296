#![forbid(unsafe_code)]

//! Reversible board edits.
//!
//! An [`Action`] records one completed user gesture with exactly the payload
//! needed to apply it forward and to invert it. Actions are plain owned
//! values: once handed to the history manager they are only moved between
//! the undo and redo stacks, never mutated.
//!
//! # Identity
//!
//! [`ActionId`] and [`BatchId`] are generated from the wall clock (unix
//! microseconds), a process-wide sequence number and a random suffix:
//!
//! ```text
//! action-1760870400123456-42-9f3a61c0
//! batch-1760870400123999-43-07be2d11
//! ```
//!
//! The sequence number makes ids unique within a process even when many
//! actions are generated inside the same microsecond.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sketchboard_core::{
    ImageItem, ItemKind, Point, SelectedItem, Stroke, TextItem, TransformState, VideoItem,
};
use web_time::{SystemTime, UNIX_EPOCH};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn unix_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Wall-clock time in unix milliseconds, the unit of [`Action::timestamp_ms`].
#[must_use]
pub fn now_millis() -> u64 {
    unix_micros() / 1_000
}

fn generate_id(prefix: &str) -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let suffix: u32 = rand::random();
    format!("{prefix}-{}-{seq}-{suffix:08x}", unix_micros())
}

/// Unique identifier of an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActionId(String);

impl ActionId {
    /// Generate a fresh, process-unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id("action"))
    }

    /// Wrap an existing id (e.g. one received from another layer).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a batch scope opened with `start_batch`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BatchId(String);

impl BatchId {
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_id("batch"))
    }

    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminant of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionKind {
    AddImage,
    AddVideo,
    AddText,
    AddStroke,
    DeleteImage,
    DeleteVideo,
    DeleteText,
    DeleteStroke,
    TransformImage,
    TransformVideo,
    TransformText,
    EditText,
    SelectItems,
    Batch,
}

impl ActionKind {
    /// Stable snake-case name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddImage => "add_image",
            Self::AddVideo => "add_video",
            Self::AddText => "add_text",
            Self::AddStroke => "add_stroke",
            Self::DeleteImage => "delete_image",
            Self::DeleteVideo => "delete_video",
            Self::DeleteText => "delete_text",
            Self::DeleteStroke => "delete_stroke",
            Self::TransformImage => "transform_image",
            Self::TransformVideo => "transform_video",
            Self::TransformText => "transform_text",
            Self::EditText => "edit_text",
            Self::SelectItems => "select_items",
            Self::Batch => "batch",
        }
    }

    #[must_use]
    pub const fn is_add(self) -> bool {
        matches!(
            self,
            Self::AddImage | Self::AddVideo | Self::AddText | Self::AddStroke
        )
    }

    #[must_use]
    pub const fn is_delete(self) -> bool {
        matches!(
            self,
            Self::DeleteImage | Self::DeleteVideo | Self::DeleteText | Self::DeleteStroke
        )
    }

    #[must_use]
    pub const fn is_transform(self) -> bool {
        matches!(
            self,
            Self::TransformImage | Self::TransformVideo | Self::TransformText
        )
    }

    /// Entity collection this kind edits. `None` for selection and batches.
    #[must_use]
    pub const fn target_kind(self) -> Option<ItemKind> {
        match self {
            Self::AddImage | Self::DeleteImage | Self::TransformImage => Some(ItemKind::Image),
            Self::AddVideo | Self::DeleteVideo | Self::TransformVideo => Some(ItemKind::Video),
            Self::AddText | Self::DeleteText | Self::TransformText | Self::EditText => {
                Some(ItemKind::Text)
            }
            Self::AddStroke | Self::DeleteStroke => Some(ItemKind::Stroke),
            Self::SelectItems | Self::Batch => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of an [`Action`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum ActionPayload {
    AddImage {
        item: ImageItem,
    },
    AddVideo {
        item: VideoItem,
    },
    AddText {
        item: TextItem,
    },
    AddStroke {
        item: Stroke,
    },
    DeleteImage {
        item_id: String,
        item: ImageItem,
    },
    DeleteVideo {
        item_id: String,
        item: VideoItem,
    },
    DeleteText {
        item_id: String,
        item: TextItem,
    },
    DeleteStroke {
        item_id: String,
        item: Stroke,
    },
    TransformImage {
        item_id: String,
        old_transform: TransformState,
        new_transform: TransformState,
    },
    TransformVideo {
        item_id: String,
        old_transform: TransformState,
        new_transform: TransformState,
    },
    TransformText {
        item_id: String,
        old_transform: TransformState,
        new_transform: TransformState,
    },
    EditText {
        item_id: String,
        old_text: String,
        new_text: String,
        /// Cursor positions are char offsets into the respective text.
        old_cursor_pos: usize,
        new_cursor_pos: usize,
    },
    SelectItems {
        old_selection: Vec<SelectedItem>,
        new_selection: Vec<SelectedItem>,
    },
    /// Sub-actions in recorded order.
    Batch {
        batch_id: BatchId,
        actions: Vec<Action>,
    },
}

impl ActionPayload {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AddImage { .. } => ActionKind::AddImage,
            Self::AddVideo { .. } => ActionKind::AddVideo,
            Self::AddText { .. } => ActionKind::AddText,
            Self::AddStroke { .. } => ActionKind::AddStroke,
            Self::DeleteImage { .. } => ActionKind::DeleteImage,
            Self::DeleteVideo { .. } => ActionKind::DeleteVideo,
            Self::DeleteText { .. } => ActionKind::DeleteText,
            Self::DeleteStroke { .. } => ActionKind::DeleteStroke,
            Self::TransformImage { .. } => ActionKind::TransformImage,
            Self::TransformVideo { .. } => ActionKind::TransformVideo,
            Self::TransformText { .. } => ActionKind::TransformText,
            Self::EditText { .. } => ActionKind::EditText,
            Self::SelectItems { .. } => ActionKind::SelectItems,
            Self::Batch { .. } => ActionKind::Batch,
        }
    }
}

/// An immutable record of one reversible edit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Action {
    pub id: ActionId,
    /// Creation time in unix milliseconds.
    pub timestamp_ms: u64,
    /// Human-readable description for UI display (e.g. "Add image").
    pub description: String,
    /// Batch scope the action was recorded in, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub batch_id: Option<BatchId>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub payload: ActionPayload,
}

impl Action {
    /// Stamp a payload with a fresh id and the current time.
    #[must_use]
    pub fn new(payload: ActionPayload, description: impl Into<String>) -> Self {
        Self {
            id: ActionId::generate(),
            timestamp_ms: now_millis(),
            description: description.into(),
            batch_id: None,
            payload,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    #[must_use]
    pub fn is_batch(&self) -> bool {
        matches!(self.payload, ActionPayload::Batch { .. })
    }

    /// Id of the entity this action edits. `None` for selection and batches.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        match &self.payload {
            ActionPayload::AddImage { item } => Some(&item.id),
            ActionPayload::AddVideo { item } => Some(&item.id),
            ActionPayload::AddText { item } => Some(&item.id),
            ActionPayload::AddStroke { item } => Some(&item.id),
            ActionPayload::DeleteImage { item_id, .. }
            | ActionPayload::DeleteVideo { item_id, .. }
            | ActionPayload::DeleteText { item_id, .. }
            | ActionPayload::DeleteStroke { item_id, .. }
            | ActionPayload::TransformImage { item_id, .. }
            | ActionPayload::TransformVideo { item_id, .. }
            | ActionPayload::TransformText { item_id, .. }
            | ActionPayload::EditText { item_id, .. } => Some(item_id),
            ActionPayload::SelectItems { .. } | ActionPayload::Batch { .. } => None,
        }
    }

    /// Sub-actions of a batch; empty for every other kind.
    #[must_use]
    pub fn children(&self) -> &[Action] {
        match &self.payload {
            ActionPayload::Batch { actions, .. } => actions,
            _ => &[],
        }
    }

    /// Number of leaf edits: 1 for a simple action, the recursive leaf count
    /// for a batch.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match &self.payload {
            ActionPayload::Batch { actions, .. } => actions.iter().map(Action::leaf_count).sum(),
            _ => 1,
        }
    }

    /// Estimated heap plus inline size, for memory reporting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        fn strings(parts: &[&str]) -> usize {
            parts.iter().map(|s| s.len()).sum()
        }

        let payload = match &self.payload {
            ActionPayload::AddImage { item } | ActionPayload::DeleteImage { item, .. } => {
                strings(&[
                    item.id.as_str(),
                    item.src.as_str(),
                    item.prompt.as_deref().unwrap_or(""),
                ])
            }
            ActionPayload::AddVideo { item } | ActionPayload::DeleteVideo { item, .. } => {
                strings(&[
                    item.id.as_str(),
                    item.src.as_str(),
                    item.poster.as_deref().unwrap_or(""),
                ])
            }
            ActionPayload::AddText { item } | ActionPayload::DeleteText { item, .. } => {
                strings(&[item.id.as_str(), item.text.as_str(), item.color.as_str()])
            }
            ActionPayload::AddStroke { item } | ActionPayload::DeleteStroke { item, .. } => {
                strings(&[item.id.as_str(), item.color.as_str()])
                    + item.points.len() * std::mem::size_of::<Point>()
            }
            ActionPayload::TransformImage { item_id, .. }
            | ActionPayload::TransformVideo { item_id, .. }
            | ActionPayload::TransformText { item_id, .. } => item_id.len(),
            ActionPayload::EditText {
                item_id,
                old_text,
                new_text,
                ..
            } => strings(&[item_id.as_str(), old_text.as_str(), new_text.as_str()]),
            ActionPayload::SelectItems {
                old_selection,
                new_selection,
            } => old_selection
                .iter()
                .chain(new_selection)
                .map(|s| s.id.len() + std::mem::size_of::<SelectedItem>())
                .sum(),
            ActionPayload::Batch { batch_id, actions } => {
                batch_id.as_str().len() + actions.iter().map(Action::size_bytes).sum::<usize>()
            }
        };
        std::mem::size_of::<Self>() + self.id.as_str().len() + self.description.len() + payload
    }
}
