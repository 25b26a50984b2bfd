//! Transform and interpolation helpers
//!
//! Conventions: Y is up, a transform's forward is its rotation applied to `+Z`
//! and its right is the rotation applied to `+X`. Angles at the public surface
//! are degrees, matching the tunables in [`crate::config`].

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

pub const EPS: f32 = 1e-6;

/// World up axis
pub fn world_up() -> Vector3<f32> {
    Vector3::y()
}

/// Position + orientation of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self { position: Vector3::zeros(), rotation: UnitQuaternion::identity() }
    }

    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Self { position, rotation: UnitQuaternion::identity() }
    }

    /// Position plus a heading around the up axis.
    pub fn from_position_yaw(position: Vector3<f32>, yaw_deg: f32) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_deg.to_radians()),
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::x()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    /// Local point → world point
    pub fn transform_point(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.rotation * local + self.position
    }

    /// World point → local point
    pub fn inverse_transform_point(&self, world: &Vector3<f32>) -> Vector3<f32> {
        self.rotation.inverse() * (world - self.position)
    }

    /// `self` as parent, `child` expressed in the parent's space.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(&child.position),
            rotation: self.rotation * child.rotation,
        }
    }
}

/// Linear interpolation with `t` clamped into [0, 1].
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Component-wise [`lerp`].
pub fn lerp_vec3(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Drop the vertical component.
pub fn horizontal(v: &Vector3<f32>) -> Vector3<f32> {
    Vector3::new(v.x, 0.0, v.z)
}

/// Rotation whose `+Z` points along `forward` with `+Y` as close to `up` as possible.
///
/// Returns `None` when `forward` is degenerate or parallel to `up`.
pub fn look_rotation(forward: &Vector3<f32>, up: &Vector3<f32>) -> Option<UnitQuaternion<f32>> {
    let forward = forward.try_normalize(EPS)?;
    let up = up.try_normalize(EPS)?;
    if forward.cross(&up).norm() < 1e-4 {
        return None;
    }
    Some(UnitQuaternion::face_towards(&forward, &up))
}

/// Step `from` toward `to` by at most `max_degrees`.
///
/// Lands exactly on `to` once it is within reach. Opposite orientations are
/// still resolved through the delta rotation's own axis.
pub fn rotate_towards(
    from: &UnitQuaternion<f32>,
    to: &UnitQuaternion<f32>,
    max_degrees: f32,
) -> UnitQuaternion<f32> {
    let max_radians = max_degrees.max(0.0).to_radians();
    let delta = to * from.inverse();
    match delta.axis_angle() {
        None => *to,
        Some((axis, angle)) => {
            if angle <= max_radians {
                *to
            } else {
                UnitQuaternion::from_axis_angle(&axis, max_radians) * from
            }
        }
    }
}

/// Angle between two orientations in degrees (0..=180)
pub fn angle_between_deg(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>) -> f32 {
    a.angle_to(b).to_degrees()
}
