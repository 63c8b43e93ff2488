//! Tooling around a running session: the asset palette shown to players and
//! a read-only inspector for developers.
//!
//! # Invariants
//! - Tools only read session state. Selection changes go through input actions.

mod inspector;
mod palette;

pub use inspector::{ObjectInfo, SessionInspector, SessionSummary};
pub use palette::{Palette, Swatch};
