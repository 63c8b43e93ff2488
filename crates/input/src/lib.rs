//! Input aggregation: raw keys and pointer-lock mouse events become a per-frame
//! [`InputIntent`] plus discrete [`Action`]s routed through [`GameActions`].
//!
//! # Invariants
//! - No knowledge of physics or rendering.
//! - Mouse look and clicks only count while the pointer is locked.

pub mod action;
pub mod aggregator;
pub mod key;

pub use action::{Action, GameActions};
pub use aggregator::{InputAggregator, InputIntent};
pub use key::{Key, MouseButton, UnknownKey};
