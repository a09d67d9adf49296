#![forbid(unsafe_code)]

//! Undo/redo history for board edits.
//!
//! Edits are recorded as data, not as closures: every [`Action`] carries the
//! before and after snapshots it needs, and [`apply`] knows how to replay
//! each kind forward or backward against a [`BoardState`].
//!
//! # Architecture
//!
//! ```text
//!   UI gesture ──► factory::create_*_action ──► HistoryManager::push_action
//!                                                     │
//!        ┌────────────────────────────────────────────┤
//!        ▼                                            ▼
//! ┌──────────────────┐  undo()   ┌──────────────────┐ ┌────────────┐
//! │   Undo Stack     │ ────────► │   Redo Stack     │ │ BoardState │
//! │  [a1 .. aN]      │ ◄──────── │  [.. ]           │ │  (mirror)  │
//! └──────────────────┘  redo()   └──────────────────┘ └────────────┘
//!                                                     │
//!                          listeners ◄── HistoryInfo ─┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use sketchboard_core::{ImageItem, ItemKind, TransformState};
//! use sketchboard_history::undo::{factory, HistoryManager};
//!
//! let mut history = HistoryManager::new();
//! let t0 = TransformState::new(10.0, 10.0, 64.0, 64.0);
//! let image = ImageItem::new("img1", "blob:cat", t0);
//!
//! history.push_action(factory::create_add_image_action(&image, None));
//! history.push_action(factory::create_transform_image_action(
//!     "img1",
//!     t0,
//!     t0.moved_to(50.0, 50.0),
//!     None,
//! ));
//!
//! assert!(history.undo());
//! assert_eq!(
//!     history.state().transform_of(ItemKind::Image, "img1"),
//!     Some(t0)
//! );
//! ```
//!
//! # Module Structure
//!
//! - [`action`]: `Action`, its payloads and ids
//! - [`factory`]: action constructors, batch summaries and validation
//! - [`apply`]: forward and inverse effects on the board
//! - [`history`]: `HistoryManager`, batching and listeners
//!
//! # Design Notes
//!
//! ## Batches
//!
//! A multi-step gesture (drag then resize, multi-select delete) is bracketed
//! by `start_batch`/`end_batch` and lands as one `Batch` action. Children
//! are inverted in reverse recording order, so a batch holding
//! "add E, move E" undoes to a board without E.
//!
//! ## Memory Budget
//!
//! Both stacks are bounded by entry count (`max_stack_size`, default 100).
//! [`Action::size_bytes`] gives an estimate for callers that want to report
//! history memory.

pub mod action;
pub mod apply;
pub mod factory;
pub mod history;

pub use action::{Action, ActionId, ActionKind, ActionPayload, BatchId};
pub use apply::{Direction, apply_forward, apply_inverse, apply_recorded};
pub use factory::{ValidationError, create_batch_description, is_valid_action, validate_action};
pub use history::{HistoryError, HistoryInfo, HistoryManager, ListenerId};

#[doc(no_inline)]
pub use sketchboard_core::BoardState;
