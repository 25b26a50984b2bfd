//! Seam to the host's collision world
//!
//! The controller never owns physics. During a frame it only asks for ray
//! casts, and between frames the host forwards trigger overlap transitions.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::collider::{Collider, ColliderId, LayerMask};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    pub point: Vector3<f32>,
    /// Outward surface normal (unit length)
    pub normal: Vector3<f32>,
    pub distance: f32,
    pub collider: ColliderId,
}

/// Ray queries against a layer-filtered world.
pub trait SpatialQuery {
    /// Nearest hit along `direction` (unit length) within `max_distance`,
    /// considering only colliders whose layer is in `mask`.
    fn raycast(
        &self,
        origin: &Vector3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit>;
}

/// A world with nothing to hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHits;

impl SpatialQuery for NoHits {
    fn raycast(
        &self,
        _origin: &Vector3<f32>,
        _direction: &Vector3<f32>,
        _max_distance: f32,
        _mask: LayerMask,
    ) -> Option<RaycastHit> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerPhase {
    Enter,
    Stay,
    Exit,
}

/// One overlap transition between the detection volume and `collider`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    pub phase: TriggerPhase,
    pub collider: Collider,
}

impl TriggerEvent {
    pub fn enter(collider: Collider) -> Self {
        Self { phase: TriggerPhase::Enter, collider }
    }

    pub fn stay(collider: Collider) -> Self {
        Self { phase: TriggerPhase::Stay, collider }
    }

    pub fn exit(collider: Collider) -> Self {
        Self { phase: TriggerPhase::Exit, collider }
    }
}
