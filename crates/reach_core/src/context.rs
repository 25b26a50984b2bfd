//! Interaction Context
//!
//! The single mutable record every phase state reads and writes. Owned by the
//! machine and lent to exactly one state at a time.
//!
//! ## Side selection
//! ```text
//! set_current_side(side) ─► derive_current_aliases(side) ─► aliases
//!                                                        │
//!   current_ik_mut / current_rotation_mut / current_shoulder resolve here
//! ```
//! The aliases are never assigned anywhere else, so the left and right limbs
//! cannot desync mid-episode.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::collider::{CapsuleCollider, Collider};
use crate::error::{InteractionError, Result};
use crate::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodySide {
    Left,
    Right,
}

impl BodySide {
    pub const ALL: [BodySide; 2] = [BodySide::Left, BodySide::Right];

    pub fn index(self) -> usize {
        match self {
            BodySide::Left => 0,
            BodySide::Right => 1,
        }
    }

    pub fn opposite(self) -> BodySide {
        match self {
            BodySide::Left => BodySide::Right,
            BodySide::Right => BodySide::Left,
        }
    }
}

/// Two-bone IK target the solver pulls the hand toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IkConstraint {
    pub target: Transform,
    /// Blend in [0, 1]
    pub weight: f32,
}

/// Wrist/forearm rotation constraint; only its blend is driven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationConstraint {
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limb {
    pub ik: IkConstraint,
    pub rotation: RotationConstraint,
    shoulder: Vector3<f32>,
    shoulder_local: Vector3<f32>,
    rest_target_local: Transform,
}

impl Limb {
    /// World position of the chain root
    pub fn shoulder(&self) -> Vector3<f32> {
        self.shoulder
    }

    /// Rest pose of the IK target in root space
    pub fn rest_target_local(&self) -> Transform {
        self.rest_target_local
    }
}

// ============================================================================
// Construction-time bindings
// ============================================================================

/// One arm's IK chain, both points in root space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IkChainBinding {
    pub shoulder: Vector3<f32>,
    /// Where the target sits when nothing is being touched
    pub target: Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationConstraintBinding {
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidbodyBinding {
    pub velocity: Vector3<f32>,
}

/// Handles a host hands over when creating a machine. Every field is required.
#[derive(Debug, Clone, Default)]
pub struct RigBindings {
    pub left_ik: Option<IkChainBinding>,
    pub right_ik: Option<IkChainBinding>,
    pub left_rotation: Option<RotationConstraintBinding>,
    pub right_rotation: Option<RotationConstraintBinding>,
    pub rigidbody: Option<RigidbodyBinding>,
    pub root_collider: Option<CapsuleCollider>,
}

/// Bindings after validation; nothing optional left.
#[derive(Debug, Clone, Copy)]
pub struct Rig {
    pub left_ik: IkChainBinding,
    pub right_ik: IkChainBinding,
    pub left_rotation: RotationConstraintBinding,
    pub right_rotation: RotationConstraintBinding,
    pub rigidbody: RigidbodyBinding,
    pub root_collider: CapsuleCollider,
}

impl RigBindings {
    /// Symmetric biped: shoulders `shoulder_width` apart at `shoulder_height`,
    /// hands resting 0.6 m below them.
    pub fn humanoid(capsule: CapsuleCollider, shoulder_width: f32, shoulder_height: f32) -> Self {
        let half = shoulder_width * 0.5;
        let chain = |x: f32| IkChainBinding {
            shoulder: Vector3::new(x, shoulder_height, 0.0),
            target: Transform::from_position(Vector3::new(x * 1.2, shoulder_height - 0.6, 0.0)),
        };
        Self {
            left_ik: Some(chain(-half)),
            right_ik: Some(chain(half)),
            left_rotation: Some(RotationConstraintBinding { weight: 0.0 }),
            right_rotation: Some(RotationConstraintBinding { weight: 0.0 }),
            rigidbody: Some(RigidbodyBinding { velocity: Vector3::zeros() }),
            root_collider: Some(capsule),
        }
    }

    /// Fails on the first missing handle, in declaration order.
    pub fn validate(&self) -> Result<Rig> {
        let left_ik = require(self.left_ik, "Left IK constraint")?;
        let right_ik = require(self.right_ik, "Right IK constraint")?;
        let left_rotation = require(self.left_rotation, "Left multi-rotation constraint")?;
        let right_rotation = require(self.right_rotation, "Right multi-rotation constraint")?;
        let rigidbody = require(self.rigidbody, "Rigidbody used to control character")?;
        let root_collider = require(self.root_collider, "RootCollider attached to character")?;

        check_weight(left_rotation.weight, "Left multi-rotation constraint")?;
        check_weight(right_rotation.weight, "Right multi-rotation constraint")?;
        if !(root_collider.height.is_finite() && root_collider.height > 0.0) {
            return Err(InteractionError::InvalidBinding {
                binding: "RootCollider attached to character",
                reason: format!("height must be positive, got {}", root_collider.height),
            });
        }
        if !(root_collider.radius.is_finite() && root_collider.radius > 0.0) {
            return Err(InteractionError::InvalidBinding {
                binding: "RootCollider attached to character",
                reason: format!("radius must be positive, got {}", root_collider.radius),
            });
        }

        Ok(Rig { left_ik, right_ik, left_rotation, right_rotation, rigidbody, root_collider })
    }
}

fn require<T>(handle: Option<T>, binding: &'static str) -> Result<T> {
    handle.ok_or(InteractionError::MissingBinding { binding })
}

fn check_weight(weight: f32, binding: &'static str) -> Result<()> {
    if (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(InteractionError::InvalidBinding {
            binding,
            reason: format!("weight {} outside [0, 1]", weight),
        })
    }
}

// ============================================================================
// Side-selected aliases
// ============================================================================

/// Which limb each "current" accessor resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAliases {
    pub ik_target: BodySide,
    pub rotation_constraint: BodySide,
    pub shoulder: BodySide,
}

pub fn derive_current_aliases(side: Option<BodySide>) -> Option<CurrentAliases> {
    side.map(|side| CurrentAliases { ik_target: side, rotation_constraint: side, shoulder: side })
}

// ============================================================================
// Context
// ============================================================================

#[derive(Debug, Clone)]
pub struct InteractionContext {
    limbs: [Limb; 2],
    root: Transform,
    velocity: Vector3<f32>,
    root_collider: CapsuleCollider,

    current_side: Option<BodySide>,
    aliases: Option<CurrentAliases>,

    current_collider: Option<Collider>,
    closest_point: Option<Vector3<f32>>,
    /// Height the IK target is held at; blended toward the candidate in Rise
    pub interaction_point_y_offset: f32,
    collider_center_y: f32,
    shoulder_height: f32,

    lowest_distance: f32,
    reset_requested: bool,
}

impl InteractionContext {
    pub fn new(rig: &Rig, root: Transform) -> Self {
        let limb = |chain: &IkChainBinding, rotation: &RotationConstraintBinding| Limb {
            ik: IkConstraint { target: root.compose(&chain.target), weight: 0.0 },
            rotation: RotationConstraint { weight: rotation.weight },
            shoulder: root.transform_point(&chain.shoulder),
            shoulder_local: chain.shoulder,
            rest_target_local: chain.target,
        };
        let collider_center_y = rig.root_collider.center.y;

        Self {
            limbs: [limb(&rig.left_ik, &rig.left_rotation), limb(&rig.right_ik, &rig.right_rotation)],
            root,
            velocity: rig.rigidbody.velocity,
            root_collider: rig.root_collider,
            current_side: None,
            aliases: None,
            current_collider: None,
            closest_point: None,
            interaction_point_y_offset: root.position.y + collider_center_y,
            collider_center_y,
            shoulder_height: rig.left_ik.shoulder.y,
            lowest_distance: f32::INFINITY,
            reset_requested: false,
        }
    }

    // ---- body ----

    pub fn root(&self) -> &Transform {
        &self.root
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity
    }

    pub fn root_collider(&self) -> &CapsuleCollider {
        &self.root_collider
    }

    /// Push this frame's root pose and body velocity; shoulders follow the root.
    pub fn sync_body(&mut self, root: Transform, velocity: Vector3<f32>) {
        self.root = root;
        self.velocity = velocity;
        for limb in &mut self.limbs {
            limb.shoulder = root.transform_point(&limb.shoulder_local);
        }
    }

    /// Override one shoulder with an animated world position.
    pub fn set_shoulder_position(&mut self, side: BodySide, world: Vector3<f32>) {
        self.limbs[side.index()].shoulder = world;
    }

    pub fn is_moving(&self, stopped_speed: f32) -> bool {
        self.velocity.norm() >= stopped_speed
    }

    // ---- limbs ----

    pub fn limb(&self, side: BodySide) -> &Limb {
        &self.limbs[side.index()]
    }

    pub fn ik(&self, side: BodySide) -> &IkConstraint {
        &self.limbs[side.index()].ik
    }

    pub fn rotation(&self, side: BodySide) -> &RotationConstraint {
        &self.limbs[side.index()].rotation
    }

    pub fn ik_mut(&mut self, side: BodySide) -> &mut IkConstraint {
        &mut self.limbs[side.index()].ik
    }

    pub fn rotation_mut(&mut self, side: BodySide) -> &mut RotationConstraint {
        &mut self.limbs[side.index()].rotation
    }

    pub fn shoulder(&self, side: BodySide) -> Vector3<f32> {
        self.limbs[side.index()].shoulder
    }

    pub fn rest_target_world(&self, side: BodySide) -> Transform {
        self.root.compose(&self.limbs[side.index()].rest_target_local)
    }

    // ---- side selection ----

    pub fn current_side(&self) -> Option<BodySide> {
        self.current_side
    }

    pub fn aliases(&self) -> Option<CurrentAliases> {
        self.aliases
    }

    pub fn set_current_side(&mut self, side: Option<BodySide>) {
        if self.current_side != side {
            tracing::debug!(from = ?self.current_side, to = ?side, "current side changed");
        }
        self.current_side = side;
        self.aliases = derive_current_aliases(side);
    }

    /// Commit the side whose shoulder is nearer to `collider`; ties go right.
    pub fn select_side_for(&mut self, collider: &Collider) -> BodySide {
        let distance_from = |side: BodySide| {
            let shoulder = self.shoulder(side);
            (collider.closest_point(&shoulder) - shoulder).norm()
        };
        let side = if distance_from(BodySide::Left) < distance_from(BodySide::Right) {
            BodySide::Left
        } else {
            BodySide::Right
        };
        self.set_current_side(Some(side));
        side
    }

    pub fn current_ik(&self) -> Option<&IkConstraint> {
        self.aliases.map(|a| &self.limbs[a.ik_target.index()].ik)
    }

    pub fn current_ik_mut(&mut self) -> Option<&mut IkConstraint> {
        let aliases = self.aliases?;
        Some(&mut self.limbs[aliases.ik_target.index()].ik)
    }

    pub fn current_rotation(&self) -> Option<&RotationConstraint> {
        self.aliases.map(|a| &self.limbs[a.rotation_constraint.index()].rotation)
    }

    pub fn current_rotation_mut(&mut self) -> Option<&mut RotationConstraint> {
        let aliases = self.aliases?;
        Some(&mut self.limbs[aliases.rotation_constraint.index()].rotation)
    }

    pub fn current_shoulder(&self) -> Option<Vector3<f32>> {
        self.aliases.map(|a| self.limbs[a.shoulder.index()].shoulder)
    }

    pub fn current_rest_target_world(&self) -> Option<Transform> {
        self.aliases.map(|a| self.rest_target_world(a.ik_target))
    }

    // ---- tracking ----

    pub fn current_collider(&self) -> Option<&Collider> {
        self.current_collider.as_ref()
    }

    pub fn closest_point(&self) -> Option<Vector3<f32>> {
        self.closest_point
    }

    pub fn collider_center_y(&self) -> f32 {
        self.collider_center_y
    }

    /// Root-relative shoulder height captured at construction
    pub fn shoulder_height(&self) -> f32 {
        self.shoulder_height
    }

    /// World height the interaction offset relaxes to
    pub fn baseline_y(&self) -> f32 {
        self.root.position.y + self.collider_center_y
    }

    pub(crate) fn set_current_collider(&mut self, collider: Option<Collider>) {
        self.current_collider = collider;
    }

    pub(crate) fn set_closest_point(&mut self, point: Option<Vector3<f32>>) {
        self.closest_point = point;
    }

    pub fn lowest_distance(&self) -> f32 {
        self.lowest_distance
    }

    pub(crate) fn set_lowest_distance(&mut self, distance: f32) {
        self.lowest_distance = distance;
    }

    pub fn reset_requested(&self) -> bool {
        self.reset_requested
    }

    pub(crate) fn set_reset_requested(&mut self, requested: bool) {
        self.reset_requested = requested;
    }

    /// Drop the tracked surface and its candidate point.
    pub(crate) fn clear_tracking(&mut self) {
        self.current_collider = None;
        self.closest_point = None;
    }
}
