//! Simulation kernel: rigid bodies, fixed-step integration, grounding, player movement.
//!
//! # Invariants
//! - Physics advances only in fixed sub-steps; wall-clock time never reaches the integrator.
//! - Static bodies (mass 0) are never integrated and never receive velocity.
//! - Bodies added between steps join the simulation at the start of the next `step`.
//! - At most one body carries the player flag.
//! - The grounding resolver is the only writer of the grounded flag.

pub mod body;
pub mod contact;
pub mod grounding;
pub mod movement;
pub mod world;

pub use body::{BodyHandle, CompoundPart, PartShape, RigidBody, Shape, SleepPolicy};
pub use contact::{ContactEvent, ContactListener};
pub use grounding::{GroundingResolver, GroundingStrategy};
pub use movement::{MovementCommand, MovementConfig, MovementController, MovementOutcome};
pub use world::{PhysicsConfig, PhysicsError, PhysicsWorld, RayHit, StepReport};
