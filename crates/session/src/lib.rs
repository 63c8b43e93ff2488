//! Session: wires input, movement, physics, scene sync, placement and
//! rendering into one per-frame update.
//!
//! # Invariants
//! - A session never starts without a physics world, a camera and a renderer.
//! - Persisted state is applied only at the start of a frame, never mid-commit.

pub mod config;
pub mod session;

pub use config::{ConfigError, PlayerConfig, SessionConfig};
pub use session::{FrameReport, Session, SessionBuilder, StartupError};
