//! Candidate tracking and detection volume tunables

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::collider::CollisionLayer;

/// Shared by every state that follows a candidate surface.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TrackingConfig {
    /// Layer index treated as interactable (default: 6)
    #[validate(range(max = 31))]
    pub interactable_layer: u8,
    /// IK target stand-off from the surface, toward the shoulder (default: 0.05 m)
    #[validate(range(min = 0.0, max = 1.0))]
    pub surface_offset: f32,
    /// Distance growth tolerated before "moving away" fires (default: 0.005 m)
    #[validate(range(min = 0.0, max = 1.0))]
    pub moving_away_tolerance: f32,
    /// Speed under which the body counts as stopped (default: 1e-4 m/s)
    #[validate(range(min = 0.0, max = 1.0))]
    pub stopped_speed: f32,
    /// Upward speed that counts as a jump (default: 0.5 m/s)
    #[validate(range(min = 0.0))]
    pub jump_speed: f32,
    /// Weight below which a constraint counts as released (default: 1e-3)
    #[validate(range(min = 0.0, max = 0.5))]
    pub weight_settle_epsilon: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interactable_layer: 6,
            surface_offset: 0.05,
            moving_away_tolerance: 0.005,
            stopped_speed: 1e-4,
            jump_speed: 0.5,
            weight_settle_epsilon: 1e-3,
        }
    }
}

impl TrackingConfig {
    pub fn interactable_layer(&self) -> CollisionLayer {
        CollisionLayer::new(self.interactable_layer).unwrap_or_default()
    }
}

/// Trigger box placement relative to the root collider.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DetectionConfig {
    /// Box edge as a multiple of the wingspan (default: 1.0)
    #[validate(range(min = 0.01, max = 10.0))]
    pub size_factor: f32,
    /// Upward shift of the box center, in wingspans (default: 0.25)
    #[validate(range(min = -2.0, max = 2.0))]
    pub vertical_offset_factor: f32,
    /// Forward shift of the box center, in wingspans (default: 0.5)
    #[validate(range(min = -2.0, max = 2.0))]
    pub forward_offset_factor: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { size_factor: 1.0, vertical_offset_factor: 0.25, forward_offset_factor: 0.5 }
    }
}
