//! # reach_core - Procedural Environment Interaction
//!
//! Drives a character's arm IK so that a hand reaches out and touches nearby
//! interactable surfaces while the character moves.
//!
//! ## Features
//! - Five-phase controller: Search, Approach, Rise, Touch, Reset
//! - Engine-agnostic: the host pushes body state and trigger overlaps,
//!   then reads IK targets and weights back through [`ConstraintSolver`]
//! - Explicit frame delta everywhere, so every phase is testable offline
//! - Scripted JSON/YAML scenarios against a reference static world
//!
//! ## Usage
//! ```rust
//! use nalgebra::Vector3;
//! use reach_core::{
//!     CapsuleCollider, EnvironmentInteractionMachine, NoHits, RigBindings, Transform,
//! };
//!
//! let capsule = CapsuleCollider::new(Vector3::new(0.0, 0.9, 0.0), 1.8, 0.3);
//! let bindings = RigBindings::humanoid(capsule, 0.4, 1.4);
//! let mut machine =
//!     EnvironmentInteractionMachine::with_defaults(&bindings, Transform::identity()).unwrap();
//!
//! machine.sync_body(Transform::identity(), Vector3::new(0.0, 0.0, 1.0));
//! let report = machine.tick(1.0 / 60.0, &NoHits).unwrap();
//! assert_eq!(report.phase, reach_core::InteractionPhase::Reset);
//! ```

// Doc formatting lints - purely cosmetic, fix incrementally
#![allow(clippy::doc_lazy_continuation)]
// Struct initialization pattern used intentionally in tests and presets
#![allow(clippy::field_reassign_with_default)]
// Complex types are sometimes necessary for generic APIs
#![allow(clippy::type_complexity)]

pub mod collider;
pub mod config;
pub mod context;
pub mod error;
pub mod fsm;
pub mod machine;
pub mod math;
pub mod query;
pub mod scenario;
pub mod states;
pub mod world;

pub use collider::{
    CapsuleCollider, Collider, ColliderId, ColliderShape, CollisionLayer, LayerMask, OrientedBox,
};
pub use config::InteractionConfig;
pub use context::{BodySide, InteractionContext, RigBindings};
pub use error::{InteractionError, Result};
pub use machine::{
    ConstraintSolver, DetectionVolume, EnvironmentInteractionMachine, PhaseTransition, TickReport,
};
pub use math::Transform;
pub use query::{NoHits, RaycastHit, SpatialQuery, TriggerEvent, TriggerPhase};
pub use scenario::{ScenarioReport, ScenarioSpec, TransitionRecord};
pub use states::InteractionPhase;
pub use world::{StaticWorld, TriggerTracker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
