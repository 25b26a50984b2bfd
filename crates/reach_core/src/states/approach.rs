//! Approach: partially raise the committed arm while closing in.

use crate::collider::Collider;
use crate::config::{ApproachConfig, InteractionConfig, TrackingConfig};
use crate::context::InteractionContext;
use crate::fsm::BaseState;
use crate::math::{lerp, look_rotation, rotate_towards};

use super::tracking;
use super::{InteractionPhase, InteractionWorld};

#[derive(Debug, Clone)]
pub struct ApproachState {
    tracking: TrackingConfig,
    config: ApproachConfig,
    elapsed: f32,
}

impl ApproachState {
    pub fn new(config: &InteractionConfig) -> Self {
        Self { tracking: config.tracking.clone(), config: config.approach.clone(), elapsed: 0.0 }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl BaseState<InteractionPhase, InteractionContext, InteractionWorld, Collider> for ApproachState {
    fn key(&self) -> InteractionPhase {
        InteractionPhase::Approach
    }

    fn enter_state(&mut self, _ctx: &mut InteractionContext) {
        self.elapsed = 0.0;
    }

    fn exit_state(&mut self, _ctx: &mut InteractionContext) {}

    fn update_state(&mut self, ctx: &mut InteractionContext, _world: &InteractionWorld, dt: f32) {
        self.elapsed += dt;
        let t = self.elapsed / self.config.lerp_duration;

        // palm down, fingers along the walking direction
        let root = *ctx.root();
        let expected = look_rotation(&-root.up(), &root.forward());
        let step = self.config.rotation_speed_deg * dt;

        if let Some(ik) = ctx.current_ik_mut() {
            if let Some(expected) = expected {
                ik.target.rotation = rotate_towards(&ik.target.rotation, &expected, step);
            }
            ik.weight = lerp(ik.weight, self.config.ik_weight, t);
        }
        if let Some(rotation) = ctx.current_rotation_mut() {
            rotation.weight = lerp(rotation.weight, self.config.rotation_weight, t);
        }
    }

    fn next_state(&self, ctx: &mut InteractionContext) -> InteractionPhase {
        if self.elapsed >= self.config.max_duration || tracking::should_reset(ctx, &self.tracking) {
            return InteractionPhase::Reset;
        }
        match (ctx.closest_point(), ctx.current_shoulder()) {
            (Some(point), Some(shoulder)) if (point - shoulder).norm() < self.config.rise_distance => {
                InteractionPhase::Rise
            }
            _ => InteractionPhase::Approach,
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
