#![forbid(unsafe_code)]

//! The live board document.
//!
//! A [`BoardState`] holds four ordered collections, one per entity kind, and
//! the ordered list of selected entity references. Collection order is the
//! paint order: later entries draw on top.
//!
//! # Invariants
//!
//! 1. Ids are unique within a collection. [`BoardState::upsert_image`] and
//!    friends replace in place instead of inserting a duplicate.
//! 2. [`BoardState::remove`] drops selection references to the removed
//!    entity in the same call, so the selection never dangles after a
//!    removal made through this API.
//!
//! [`BoardState::validate`] checks both invariants for documents assembled
//! by hand (for example, loaded from storage).

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, TransformState};

/// Which collection an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ItemKind {
    Image,
    Video,
    Text,
    Stroke,
}

impl ItemKind {
    /// All kinds, in collection order.
    pub const ALL: [ItemKind; 4] = [Self::Image, Self::Video, Self::Text, Self::Stroke];

    /// Lowercase singular name ("image", "video", ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Text => "text",
            Self::Stroke => "stroke",
        }
    }

    /// Whether entities of this kind carry a [`TransformState`].
    #[must_use]
    pub const fn is_transformable(self) -> bool {
        !matches!(self, Self::Stroke)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a selected entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectedItem {
    pub id: String,
    pub kind: ItemKind,
}

impl SelectedItem {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Common surface of every board entity.
pub trait BoardItem: Clone {
    /// Collection this entity type lives in.
    const KIND: ItemKind;

    /// Unique id within the collection.
    fn id(&self) -> &str;
}

/// A placed raster image (uploaded or generated).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageItem {
    pub id: String,
    /// Storage URL or data URI.
    pub src: String,
    pub transform: TransformState,
    /// Generation prompt, when the image came from a generation service.
    #[cfg_attr(feature = "serde", serde(default))]
    pub prompt: Option<String>,
}

impl ImageItem {
    #[must_use]
    pub fn new(id: impl Into<String>, src: impl Into<String>, transform: TransformState) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            transform,
            prompt: None,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

impl BoardItem for ImageItem {
    const KIND: ItemKind = ItemKind::Image;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A placed video clip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VideoItem {
    pub id: String,
    pub src: String,
    pub transform: TransformState,
    #[cfg_attr(feature = "serde", serde(default))]
    pub poster: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_secs: Option<f64>,
}

impl VideoItem {
    #[must_use]
    pub fn new(id: impl Into<String>, src: impl Into<String>, transform: TransformState) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            transform,
            poster: None,
            duration_secs: None,
        }
    }
}

impl BoardItem for VideoItem {
    const KIND: ItemKind = ItemKind::Video;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A text box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextItem {
    pub id: String,
    pub text: String,
    pub transform: TransformState,
    pub font_size: f64,
    pub color: String,
}

impl TextItem {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const DEFAULT_COLOR: &'static str = "#000000";

    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, transform: TransformState) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            transform,
            font_size: Self::DEFAULT_FONT_SIZE,
            color: Self::DEFAULT_COLOR.to_string(),
        }
    }

    /// Length of the text in chars, the unit cursor positions are measured in.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl BoardItem for TextItem {
    const KIND: ItemKind = ItemKind::Text;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A freehand pen stroke.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stroke {
    pub id: String,
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
}

impl Stroke {
    pub const DEFAULT_WIDTH: f64 = 2.0;

    #[must_use]
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
            color: TextItem::DEFAULT_COLOR.to_string(),
            width: Self::DEFAULT_WIDTH,
        }
    }

    #[must_use]
    pub fn with_style(mut self, color: impl Into<String>, width: f64) -> Self {
        self.color = color.into();
        self.width = width;
        self
    }
}

impl BoardItem for Stroke {
    const KIND: ItemKind = ItemKind::Stroke;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Errors reported by [`BoardState::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Two entries in the same collection share an id.
    DuplicateId { kind: ItemKind, id: String },
    /// A selection reference points at an id missing from its collection.
    DanglingSelection { kind: ItemKind, id: String },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { kind, id } => write!(f, "duplicate {kind} id '{id}'"),
            Self::DanglingSelection { kind, id } => {
                write!(f, "selection references missing {kind} '{id}'")
            }
        }
    }
}

impl std::error::Error for BoardError {}

/// The live board document.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoardState {
    pub images: Vec<ImageItem>,
    pub videos: Vec<VideoItem>,
    pub texts: Vec<TextItem>,
    pub strokes: Vec<Stroke>,
    pub selected: Vec<SelectedItem>,
}

fn upsert<T: BoardItem>(items: &mut Vec<T>, item: T) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn remove_by_id<T: BoardItem>(items: &mut Vec<T>, id: &str) -> Option<T> {
    let index = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(index))
}

fn first_duplicate<T: BoardItem>(items: &[T]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .map(|item| item.id())
        .find(|id| !seen.insert(*id))
}

impl BoardState {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// No entities on the board (selection is ignored).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Total number of entities across all collections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.images.len() + self.videos.len() + self.texts.len() + self.strokes.len()
    }

    /// Number of entities of one kind.
    #[must_use]
    pub fn count(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::Image => self.images.len(),
            ItemKind::Video => self.videos.len(),
            ItemKind::Text => self.texts.len(),
            ItemKind::Stroke => self.strokes.len(),
        }
    }

    #[must_use]
    pub fn contains(&self, kind: ItemKind, id: &str) -> bool {
        match kind {
            ItemKind::Image => self.image(id).is_some(),
            ItemKind::Video => self.video(id).is_some(),
            ItemKind::Text => self.text(id).is_some(),
            ItemKind::Stroke => self.stroke(id).is_some(),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[must_use]
    pub fn image(&self, id: &str) -> Option<&ImageItem> {
        self.images.iter().find(|i| i.id == id)
    }

    #[must_use]
    pub fn video(&self, id: &str) -> Option<&VideoItem> {
        self.videos.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&TextItem> {
        self.texts.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn stroke(&self, id: &str) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == id)
    }

    pub fn image_mut(&mut self, id: &str) -> Option<&mut ImageItem> {
        self.images.iter_mut().find(|i| i.id == id)
    }

    pub fn video_mut(&mut self, id: &str) -> Option<&mut VideoItem> {
        self.videos.iter_mut().find(|v| v.id == id)
    }

    pub fn text_mut(&mut self, id: &str) -> Option<&mut TextItem> {
        self.texts.iter_mut().find(|t| t.id == id)
    }

    pub fn stroke_mut(&mut self, id: &str) -> Option<&mut Stroke> {
        self.strokes.iter_mut().find(|s| s.id == id)
    }

    /// Current transform of a transformable entity.
    #[must_use]
    pub fn transform_of(&self, kind: ItemKind, id: &str) -> Option<TransformState> {
        match kind {
            ItemKind::Image => self.image(id).map(|i| i.transform),
            ItemKind::Video => self.video(id).map(|v| v.transform),
            ItemKind::Text => self.text(id).map(|t| t.transform),
            ItemKind::Stroke => None,
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert an image at the top of the paint order, or replace the entry
    /// with the same id in place.
    pub fn upsert_image(&mut self, item: ImageItem) {
        upsert(&mut self.images, item);
    }

    pub fn upsert_video(&mut self, item: VideoItem) {
        upsert(&mut self.videos, item);
    }

    pub fn upsert_text(&mut self, item: TextItem) {
        upsert(&mut self.texts, item);
    }

    pub fn upsert_stroke(&mut self, item: Stroke) {
        upsert(&mut self.strokes, item);
    }

    /// Remove an entity and every selection reference to it.
    ///
    /// Returns `false` if no entity with that id exists in the collection.
    pub fn remove(&mut self, kind: ItemKind, id: &str) -> bool {
        let removed = match kind {
            ItemKind::Image => remove_by_id(&mut self.images, id).is_some(),
            ItemKind::Video => remove_by_id(&mut self.videos, id).is_some(),
            ItemKind::Text => remove_by_id(&mut self.texts, id).is_some(),
            ItemKind::Stroke => remove_by_id(&mut self.strokes, id).is_some(),
        };
        self.selected.retain(|s| !(s.kind == kind && s.id == id));
        removed
    }

    /// Overwrite the transform of an image, video or text entity.
    ///
    /// Returns `false` for strokes and for unknown ids.
    pub fn set_transform(&mut self, kind: ItemKind, id: &str, transform: TransformState) -> bool {
        let slot = match kind {
            ItemKind::Image => self.image_mut(id).map(|i| &mut i.transform),
            ItemKind::Video => self.video_mut(id).map(|v| &mut v.transform),
            ItemKind::Text => self.text_mut(id).map(|t| &mut t.transform),
            ItemKind::Stroke => None,
        };
        match slot {
            Some(slot) => {
                *slot = transform;
                true
            }
            None => false,
        }
    }

    /// Overwrite the content of a text entity.
    pub fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.text_mut(id) {
            Some(item) => {
                item.text.clear();
                item.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Replace the selection list.
    pub fn set_selection(&mut self, selection: Vec<SelectedItem>) {
        self.selected = selection;
    }

    #[must_use]
    pub fn selection(&self) -> &[SelectedItem] {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, kind: ItemKind, id: &str) -> bool {
        self.selected.iter().any(|s| s.kind == kind && s.id == id)
    }

    /// Check the id-uniqueness and selection invariants.
    pub fn validate(&self) -> Result<(), BoardError> {
        let duplicate = first_duplicate(&self.images)
            .map(|id| (ItemKind::Image, id))
            .or_else(|| first_duplicate(&self.videos).map(|id| (ItemKind::Video, id)))
            .or_else(|| first_duplicate(&self.texts).map(|id| (ItemKind::Text, id)))
            .or_else(|| first_duplicate(&self.strokes).map(|id| (ItemKind::Stroke, id)));
        if let Some((kind, id)) = duplicate {
            return Err(BoardError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }

        if let Some(dangling) = self
            .selected
            .iter()
            .find(|s| !self.contains(s.kind, &s.id))
        {
            return Err(BoardError::DanglingSelection {
                kind: dangling.kind,
                id: dangling.id.clone(),
            });
        }

        Ok(())
    }
}
