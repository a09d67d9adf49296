#![forbid(unsafe_code)]

//! Reactive publication of history state to view code.
//!
//! - [`Observable`]: shared value cell with change notification
//! - [`HistoryBinding`]: owns a [`HistoryManager`](crate::undo::HistoryManager)
//!   and mirrors its [`HistoryInfo`](crate::undo::HistoryInfo) into an
//!   observable

pub mod binding;
pub mod observable;

pub use binding::HistoryBinding;
pub use observable::{Observable, Subscription};
