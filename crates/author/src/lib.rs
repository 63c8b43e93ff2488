//! In-world authoring: placing, removing and reloading objects.
//!
//! # Invariants
//! - Every registered object owns exactly one mesh and one static body.
//! - The ghost preview never has a body and is never a placeable surface.
//! - Registry mutations happen only through commit, remove and reload.

pub mod decode;
pub mod ghost;
pub mod placement;
pub mod registry;

pub use decode::{DecodeError, SkippedEntry, decode_entry, decode_list};
pub use ghost::GhostPreview;
pub use placement::{
    PlacementConfig, PlacementState, PlacementTool, ReloadReport, SaveMode, snap_to_grid,
};
pub use registry::{ObjectRegistry, RegistryEntry};
