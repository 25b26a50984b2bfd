//! Rise: lift the hand to the candidate and turn the palm onto the surface.
//!
//! ```text
//! shoulder ──ray──► surface       hit.normal ─► expected = look(-normal, up)
//! y offset  → candidate.y         (time-normalised lerp)
//! ik weight → rise.ik_weight
//! rotation  → rise.ik_weight      (from its own weight)
//! ```

use nalgebra::UnitQuaternion;

use crate::collider::{Collider, LayerMask};
use crate::config::{InteractionConfig, RiseConfig, TrackingConfig};
use crate::context::InteractionContext;
use crate::fsm::BaseState;
use crate::math::{lerp, look_rotation, rotate_towards, world_up, EPS};
use crate::query::SpatialQuery;

use super::tracking;
use super::{InteractionPhase, InteractionWorld};

#[derive(Debug, Clone)]
pub struct RiseState {
    tracking: TrackingConfig,
    config: RiseConfig,
    elapsed: f32,
    /// Palm orientation from the last surface hit; kept while rays miss
    expected_rotation: Option<UnitQuaternion<f32>>,
}

impl RiseState {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            tracking: config.tracking.clone(),
            config: config.rise.clone(),
            elapsed: 0.0,
            expected_rotation: None,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn expected_rotation(&self) -> Option<UnitQuaternion<f32>> {
        self.expected_rotation
    }

    fn probe_surface(&mut self, ctx: &InteractionContext, world: &InteractionWorld) {
        let (Some(shoulder), Some(point)) = (ctx.current_shoulder(), ctx.closest_point()) else {
            return;
        };
        let Some(direction) = (point - shoulder).try_normalize(EPS) else {
            return;
        };
        let mask = LayerMask::from_layer(self.tracking.interactable_layer());
        if let Some(hit) = world.raycast(&shoulder, &direction, self.config.max_ray_distance, mask) {
            if let Some(rotation) = look_rotation(&-hit.normal, &world_up()) {
                self.expected_rotation = Some(rotation);
            }
        }
    }
}

impl BaseState<InteractionPhase, InteractionContext, InteractionWorld, Collider> for RiseState {
    fn key(&self) -> InteractionPhase {
        InteractionPhase::Rise
    }

    fn enter_state(&mut self, _ctx: &mut InteractionContext) {
        self.elapsed = 0.0;
        self.expected_rotation = None;
    }

    fn exit_state(&mut self, _ctx: &mut InteractionContext) {}

    fn update_state(&mut self, ctx: &mut InteractionContext, world: &InteractionWorld, dt: f32) {
        self.probe_surface(ctx, world);
        let t = self.elapsed / self.config.lerp_duration;

        if let Some(point) = ctx.closest_point() {
            ctx.interaction_point_y_offset = lerp(ctx.interaction_point_y_offset, point.y, t);
            tracking::refresh_candidate(ctx, &self.tracking);
        }

        let step = self.config.rotation_speed_deg * dt;
        if let Some(ik) = ctx.current_ik_mut() {
            ik.weight = lerp(ik.weight, self.config.ik_weight, t);
            if let Some(expected) = self.expected_rotation {
                ik.target.rotation = rotate_towards(&ik.target.rotation, &expected, step);
            }
        }
        if let Some(rotation) = ctx.current_rotation_mut() {
            rotation.weight = lerp(rotation.weight, self.config.ik_weight, t);
        }

        self.elapsed += dt;
    }

    fn next_state(&self, ctx: &mut InteractionContext) -> InteractionPhase {
        if tracking::should_reset(ctx, &self.tracking) {
            return InteractionPhase::Reset;
        }
        let (Some(point), Some(ik)) = (ctx.closest_point(), ctx.current_ik()) else {
            return InteractionPhase::Reset;
        };

        let close_enough = (ik.target.position - point).norm() < self.config.touch_distance;
        let held_long_enough = self.elapsed >= self.config.touch_time;
        if close_enough && held_long_enough {
            InteractionPhase::Touch
        } else {
            InteractionPhase::Rise
        }
    }

    fn on_trigger_enter(&mut self, ctx: &mut InteractionContext, other: &Collider) {
        tracking::start_tracking(ctx, &self.tracking, other);
    }

    fn on_trigger_stay(&mut self, ctx: &mut InteractionContext, other: &Collider) {
        tracking::update_tracking(ctx, &self.tracking, other);
    }

    fn on_trigger_exit(&mut self, ctx: &mut InteractionContext, other: &Collider) {
        tracking::stop_tracking(ctx, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BodySide;
    use crate::math::angle_between_deg;
    use crate::query::NoHits;
    use crate::states::test_support::{context, right_wall, world_with};
    use nalgebra::Vector3;

    fn rising(config: &InteractionConfig) -> (InteractionContext, RiseState) {
        let mut ctx = context();
        tracking::start_tracking(&mut ctx, &config.tracking, &right_wall());
        let mut state = RiseState::new(config);
        state.enter_state(&mut ctx);
        (ctx, state)
    }

    fn slow_touch() -> InteractionConfig {
        let mut config = InteractionConfig::default();
        config.rise.touch_time = 5.0;
        config
    }

    #[test]
    fn test_touch_waits_for_time_threshold() {
        let config = slow_touch();
        let (mut ctx, mut s) = rising(&config);
        let world = world_with(&[right_wall()]);

        for _ in 0..49 {
            s.update_state(&mut ctx, &world, 0.1);
        }
        assert!(s.elapsed() < 5.0);
        let ik = ctx.current_ik().unwrap().target.position;
        assert!((ik - ctx.closest_point().unwrap()).norm() < config.rise.touch_distance);
        // close enough but not held long enough
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Rise);

        s.update_state(&mut ctx, &world, 0.1);
        s.update_state(&mut ctx, &world, 0.1);
        assert!(s.elapsed() > 5.0);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Touch);
    }

    #[test]
    fn test_touch_needs_distance_too() {
        let mut config = slow_touch();
        // the target always stands surface_offset away from the candidate
        config.rise.touch_distance = 0.01;
        let (mut ctx, mut s) = rising(&config);
        let world = world_with(&[right_wall()]);

        for _ in 0..60 {
            s.update_state(&mut ctx, &world, 0.1);
        }
        assert!(s.elapsed() >= 5.0);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Rise);
    }

    #[test]
    fn test_blends_height_weights_and_palm() {
        let (mut ctx, mut s) = rising(&InteractionConfig::default());
        let world = world_with(&[right_wall()]);
        for _ in 0..60 {
            s.update_state(&mut ctx, &world, 0.1);
        }

        assert!((ctx.interaction_point_y_offset - 1.4).abs() < 1e-4);
        assert!((ctx.ik(BodySide::Right).weight - 1.0).abs() < 1e-4);
        assert!((ctx.rotation(BodySide::Right).weight - 1.0).abs() < 1e-4);

        // palm faces into the wall along +X
        let expected = s.expected_rotation().unwrap();
        let forward = expected * Vector3::z();
        assert!((forward - Vector3::x()).norm() < 1e-4);
        let rotation = ctx.ik(BodySide::Right).target.rotation;
        assert!(angle_between_deg(&rotation, &expected) < 0.1);

        let target = ctx.ik(BodySide::Right).target.position;
        assert!((target - Vector3::new(0.55, 1.4, 0.0)).norm() < 1e-3);
    }

    #[test]
    fn test_missing_ray_keeps_orientation() {
        let (mut ctx, mut s) = rising(&InteractionConfig::default());
        let before = ctx.ik(BodySide::Right).target.rotation;
        s.update_state(&mut ctx, &NoHits, 0.1);
        assert!(s.expected_rotation().is_none());
        assert_eq!(ctx.ik(BodySide::Right).target.rotation, before);
    }

    #[test]
    fn test_lost_candidate_resets() {
        let (mut ctx, mut s) = rising(&InteractionConfig::default());
        s.on_trigger_exit(&mut ctx, &right_wall());
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Reset);

        // stopping also ends the reach
        let (mut ctx, s) = rising(&InteractionConfig::default());
        let root = *ctx.root();
        ctx.sync_body(root, Vector3::zeros());
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Reset);
    }

    #[test]
    fn test_enter_clears_timer() {
        let (mut ctx, mut s) = rising(&InteractionConfig::default());
        s.update_state(&mut ctx, &world_with(&[right_wall()]), 0.5);
        assert!(s.elapsed() > 0.0);
        assert!(s.expected_rotation().is_some());
        s.enter_state(&mut ctx);
        assert_eq!(s.elapsed(), 0.0);
        assert!(s.expected_rotation().is_none());
    }
}
