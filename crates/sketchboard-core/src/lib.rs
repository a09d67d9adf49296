#![forbid(unsafe_code)]

//! Sketchboard Core
//!
//! The board document model shared by every Sketchboard layer: the four
//! entity collections (images, videos, texts, freehand strokes), the
//! selection list, and the [`TransformState`] value that places an entity
//! on the canvas.
//!
//! # Role in Sketchboard
//! `sketchboard-core` owns no behavior beyond keeping the document
//! well-formed. The history engine (`sketchboard-history`) records edits
//! against these types and replays them forward or backward; rendering and
//! persistence layers read them.
//!
//! # Invariants
//!
//! 1. Every id is unique within its own collection.
//! 2. Selection references point at ids that exist in their collection.
//!    Removing an entity through [`BoardState::remove`] drops its selection
//!    references in the same step.
//!
//! All types are plain owned values: cloning a [`BoardState`] produces a
//! fully independent document.

pub mod board;
pub mod geometry;

pub use board::{
    BoardError, BoardItem, BoardState, ImageItem, ItemKind, SelectedItem, Stroke, TextItem,
    VideoItem,
};
pub use geometry::{Point, TransformState};
