//! Reset: relax the arm back to rest and forget the episode.
//!
//! Tracking is cleared on entry; the committed side is kept until exit so
//! the blend-out drives the limb that was reaching. Weights relax on both
//! limbs, so a weight the host bound at construction also returns to 0.

use crate::collider::Collider;
use crate::config::{InteractionConfig, ResetConfig, TrackingConfig};
use crate::context::{BodySide, InteractionContext};
use crate::fsm::BaseState;
use crate::math::{lerp, lerp_vec3, rotate_towards};

use super::{InteractionPhase, InteractionWorld};

#[derive(Debug, Clone)]
pub struct ResetState {
    tracking: TrackingConfig,
    config: ResetConfig,
    elapsed: f32,
}

impl ResetState {
    pub fn new(config: &InteractionConfig) -> Self {
        Self { tracking: config.tracking.clone(), config: config.reset.clone(), elapsed: 0.0 }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn settled(&self, ctx: &InteractionContext) -> bool {
        let eps = self.tracking.weight_settle_epsilon;
        BodySide::ALL
            .iter()
            .all(|&side| ctx.ik(side).weight <= eps && ctx.rotation(side).weight <= eps)
    }
}

impl BaseState<InteractionPhase, InteractionContext, InteractionWorld, Collider> for ResetState {
    fn key(&self) -> InteractionPhase {
        InteractionPhase::Reset
    }

    fn enter_state(&mut self, ctx: &mut InteractionContext) {
        self.elapsed = 0.0;
        ctx.clear_tracking();
        ctx.set_reset_requested(false);
        ctx.set_lowest_distance(f32::INFINITY);
    }

    fn exit_state(&mut self, ctx: &mut InteractionContext) {
        for side in BodySide::ALL {
            ctx.ik_mut(side).weight = 0.0;
            ctx.rotation_mut(side).weight = 0.0;
        }
        ctx.set_current_side(None);
    }

    fn update_state(&mut self, ctx: &mut InteractionContext, _world: &InteractionWorld, dt: f32) {
        self.elapsed += dt;
        let t = self.elapsed / self.config.lerp_duration;

        ctx.interaction_point_y_offset = lerp(ctx.interaction_point_y_offset, ctx.baseline_y(), t);

        let rest = ctx.current_rest_target_world();
        let step = self.config.rotation_speed_deg * dt;
        if let (Some(ik), Some(rest)) = (ctx.current_ik_mut(), rest) {
            ik.target.position = lerp_vec3(&ik.target.position, &rest.position, t);
            ik.target.rotation = rotate_towards(&ik.target.rotation, &rest.rotation, step);
        }
        for side in BodySide::ALL {
            let ik = ctx.ik_mut(side);
            ik.weight = lerp(ik.weight, 0.0, t);
            let rotation = ctx.rotation_mut(side);
            rotation.weight = lerp(rotation.weight, 0.0, t);
        }
    }

    fn next_state(&self, ctx: &mut InteractionContext) -> InteractionPhase {
        let moving = ctx.is_moving(self.tracking.stopped_speed) || !self.config.require_motion;
        if self.elapsed >= self.config.duration && self.settled(ctx) && moving {
            InteractionPhase::Search
        } else {
            InteractionPhase::Reset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::NoHits;
    use crate::states::test_support::{context, right_wall};
    use crate::states::tracking;
    use nalgebra::Vector3;

    /// Context mid-reach on the right arm.
    fn reaching() -> InteractionContext {
        let config = InteractionConfig::default();
        let mut ctx = context();
        tracking::start_tracking(&mut ctx, &config.tracking, &right_wall());
        let ik = ctx.current_ik_mut().unwrap();
        ik.weight = 1.0;
        ctx.current_rotation_mut().unwrap().weight = 1.0;
        ctx.interaction_point_y_offset = 1.4;
        ctx.set_reset_requested(true);
        ctx
    }

    #[test]
    fn test_enter_clears_tracking_but_keeps_side() {
        let mut ctx = reaching();
        let mut s = ResetState::new(&InteractionConfig::default());
        s.enter_state(&mut ctx);
        assert!(ctx.closest_point().is_none());
        assert!(ctx.current_collider().is_none());
        assert!(!ctx.reset_requested());
        assert!(ctx.lowest_distance().is_infinite());
        assert_eq!(ctx.current_side(), Some(BodySide::Right));
    }

    #[test]
    fn test_blends_back_to_rest() {
        let mut ctx = reaching();
        let mut s = ResetState::new(&InteractionConfig::default());
        s.enter_state(&mut ctx);

        s.update_state(&mut ctx, &NoHits, 0.1);
        let weight = ctx.ik(BodySide::Right).weight;
        assert!(weight < 1.0 && weight > 0.0);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Reset);

        for _ in 0..120 {
            s.update_state(&mut ctx, &NoHits, 0.1);
        }
        assert_eq!(ctx.ik(BodySide::Right).weight, 0.0);
        assert_eq!(ctx.rotation(BodySide::Right).weight, 0.0);
        assert!((ctx.interaction_point_y_offset - ctx.baseline_y()).abs() < 1e-5);
        let rest = ctx.rest_target_world(BodySide::Right);
        assert!((ctx.ik(BodySide::Right).target.position - rest.position).norm() < 1e-5);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Search);

        s.exit_state(&mut ctx);
        assert_eq!(ctx.current_side(), None);
    }

    #[test]
    fn test_waits_for_motion() {
        let mut ctx = context();
        let mut s = ResetState::new(&InteractionConfig::default());
        s.enter_state(&mut ctx);
        let root = *ctx.root();
        ctx.sync_body(root, Vector3::zeros());

        s.update_state(&mut ctx, &NoHits, 3.0);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Reset);

        let mut config = InteractionConfig::default();
        config.reset.require_motion = false;
        let mut s = ResetState::new(&config);
        s.enter_state(&mut ctx);
        s.update_state(&mut ctx, &NoHits, 3.0);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Search);
    }

    #[test]
    fn test_exit_snaps_weights() {
        let mut ctx = reaching();
        let mut s = ResetState::new(&InteractionConfig::default());
        s.enter_state(&mut ctx);
        s.update_state(&mut ctx, &NoHits, 0.1);
        s.exit_state(&mut ctx);
        assert_eq!(ctx.ik(BodySide::Right).weight, 0.0);
        assert_eq!(ctx.rotation(BodySide::Right).weight, 0.0);
        assert!(ctx.aliases().is_none());
    }

    #[test]
    fn test_relaxes_limb_off_the_current_side() {
        let mut ctx = reaching();
        ctx.rotation_mut(BodySide::Left).weight = 0.5;
        let mut s = ResetState::new(&InteractionConfig::default());
        s.enter_state(&mut ctx);

        s.update_state(&mut ctx, &NoHits, 0.1);
        let weight = ctx.rotation(BodySide::Left).weight;
        assert!(weight < 0.5 && weight > 0.0);

        for _ in 0..120 {
            s.update_state(&mut ctx, &NoHits, 0.1);
        }
        assert_eq!(ctx.rotation(BodySide::Left).weight, 0.0);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Search);
    }

    #[test]
    fn test_waits_for_both_limbs_to_settle() {
        let mut ctx = context();
        ctx.ik_mut(BodySide::Left).weight = 0.8;
        let mut s = ResetState::new(&InteractionConfig::default());
        s.enter_state(&mut ctx);
        s.update_state(&mut ctx, &NoHits, 0.1);
        s.elapsed = 10.0;
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Reset);
    }
}
