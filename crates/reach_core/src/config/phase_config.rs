//! Per-phase timers and thresholds
//!
//! Each state copies its own section at construction; nothing here changes
//! once a machine exists.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate must be this close to the root to start approaching (default: 2.0 m)
    #[validate(range(min = 0.0))]
    pub approach_distance: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { approach_distance: 2.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApproachConfig {
    /// Interpolation horizon for both weights (default: 5.0 s)
    #[validate(range(min = 0.001))]
    pub lerp_duration: f32,
    /// IK weight the arm blends toward (default: 0.5)
    #[validate(range(min = 0.0, max = 1.0))]
    pub ik_weight: f32,
    /// Rotation-constraint weight the wrist blends toward (default: 0.75)
    #[validate(range(min = 0.0, max = 1.0))]
    pub rotation_weight: f32,
    /// Palm-down turn rate (default: 500 °/s)
    #[validate(range(min = 0.0))]
    pub rotation_speed_deg: f32,
    /// Shoulder-to-candidate distance that starts the rise (default: 0.5 m)
    #[validate(range(min = 0.0))]
    pub rise_distance: f32,
    /// Approach gives up after this long (default: 2.0 s)
    #[validate(range(min = 0.0))]
    pub max_duration: f32,
}

impl Default for ApproachConfig {
    fn default() -> Self {
        Self {
            lerp_duration: 5.0,
            ik_weight: 0.5,
            rotation_weight: 0.75,
            rotation_speed_deg: 500.0,
            rise_distance: 0.5,
            max_duration: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RiseConfig {
    /// Interpolation horizon for offset and weights (default: 5.0 s)
    #[validate(range(min = 0.001))]
    pub lerp_duration: f32,
    /// Weight both constraints blend toward (default: 1.0)
    #[validate(range(min = 0.0, max = 1.0))]
    pub ik_weight: f32,
    /// Surface probe length from the shoulder (default: 0.5 m)
    #[validate(range(min = 0.0))]
    pub max_ray_distance: f32,
    /// Hand alignment turn rate (default: 1000 °/s)
    #[validate(range(min = 0.0))]
    pub rotation_speed_deg: f32,
    /// IK target to candidate distance that counts as contact (default: 0.1 m)
    #[validate(range(min = 0.0))]
    pub touch_distance: f32,
    /// Minimum time in rise before contact is accepted (default: 1.0 s)
    #[validate(range(min = 0.0))]
    pub touch_time: f32,
}

impl Default for RiseConfig {
    fn default() -> Self {
        Self {
            lerp_duration: 5.0,
            ik_weight: 1.0,
            max_ray_distance: 0.5,
            rotation_speed_deg: 1000.0,
            touch_distance: 0.1,
            touch_time: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TouchConfig {
    /// Contact pose is held this long (default: 0.5 s)
    #[validate(range(min = 0.0))]
    pub hold_duration: f32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self { hold_duration: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ResetConfig {
    /// Minimum time spent releasing (default: 2.0 s)
    #[validate(range(min = 0.0))]
    pub duration: f32,
    /// Interpolation horizon back to rest (default: 10.0 s)
    #[validate(range(min = 0.001))]
    pub lerp_duration: f32,
    /// Return-to-rest turn rate (default: 500 °/s)
    #[validate(range(min = 0.0))]
    pub rotation_speed_deg: f32,
    /// Only resume searching while the body moves (default: true)
    pub require_motion: bool,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self { duration: 2.0, lerp_duration: 10.0, rotation_speed_deg: 500.0, require_motion: true }
    }
}
