#![forbid(unsafe_code)]

//! Sketchboard History
//!
//! Undo/redo for the Sketchboard canvas. Completed user gestures are recorded
//! as [`Action`] values; the [`HistoryManager`] keeps bounded undo and redo
//! stacks, groups multi-step gestures into batches, maintains a mirror of the
//! board, and tells listeners about every change.
//!
//! # Key Components
//!
//! - [`undo::factory`] - constructors for every action kind, batch summaries,
//!   structural validation
//! - [`HistoryManager`] - stacks, batching, board mirror, listeners
//! - [`undo::apply`] - forward and inverse effects of actions on a board
//! - [`HistoryBinding`] - publishes [`HistoryInfo`] to view code through an
//!   [`Observable`]
//! - [`HistoryConfig`] - tunables, loadable from TOML/JSON with the
//!   `history-config` feature
//!
//! # Role in Sketchboard
//! The history engine sits between the canvas (which turns pointer and
//! keyboard gestures into actions) and the board model in
//! `sketchboard-core`. It performs no I/O and runs entirely on the UI
//! thread; one manager is created per open board.

pub mod config;
pub mod reactive;
pub mod undo;

pub use config::{HistoryConfig, HistoryConfigError};
pub use reactive::{HistoryBinding, Observable, Subscription};
pub use undo::{
    Action, ActionId, ActionKind, ActionPayload, BatchId, HistoryError, HistoryInfo,
    HistoryManager, ListenerId, ValidationError,
};

pub use sketchboard_core::{
    BoardState, ImageItem, ItemKind, Point, SelectedItem, Stroke, TextItem, TransformState,
    VideoItem,
};
