//! Shared types for the propyard sandbox.
//!
//! # Invariants
//! - Types here carry no behavior tied to physics, rendering or persistence.
//! - Persisted shapes (`PlacedObject`) are wire-stable: camelCase keys, array vectors.

pub mod ray;
pub mod types;

pub use ray::{Ray, SurfaceHit};
pub use types::{MovementFlags, ObjectId, PlacedObject, Transform};
