//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - A renderer only reads the scene graph; it never mutates meshes or bodies.
//! - Render output derives from the scene and the camera view alone.
//!
//! The text renderer stands in for a GPU backend. Consumers only see the
//! [`Renderer`] trait, so a real backend can replace it without changes.

mod renderer;

pub use renderer::{DebugTextRenderer, FrameStats, RenderView, Renderer};
