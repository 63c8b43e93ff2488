//! Persistence collaborator for the placed-object list.
//!
//! # Invariants
//! - `save` never blocks the caller and never surfaces an error to it.
//! - Every subscriber hears the stored state at least once after subscribing.
//! - Every delivery carries the revision it reflects, so consumers can drop
//!   state older than their own last save.
//! - The in-memory registry stays authoritative: backend failures are logged only.

pub mod collaborator;
pub mod memory;
pub mod store;

pub use collaborator::{LoadCallback, Persistence, Snapshot, Subscription};
pub use memory::MemoryStore;
pub use store::{FileStore, SceneFile, SceneMeta, SequenceGuard, StoreError, SCENE_SCHEMA_VERSION};
