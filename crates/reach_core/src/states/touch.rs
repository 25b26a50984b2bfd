//! Touch: hold the contact pose for a while, then let go.

use crate::collider::Collider;
use crate::config::{InteractionConfig, TouchConfig, TrackingConfig};
use crate::context::InteractionContext;
use crate::fsm::BaseState;

use super::tracking;
use super::{InteractionPhase, InteractionWorld};

#[derive(Debug, Clone)]
pub struct TouchState {
    tracking: TrackingConfig,
    config: TouchConfig,
    elapsed: f32,
}

impl TouchState {
    pub fn new(config: &InteractionConfig) -> Self {
        Self { tracking: config.tracking.clone(), config: config.touch.clone(), elapsed: 0.0 }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl BaseState<InteractionPhase, InteractionContext, InteractionWorld, Collider> for TouchState {
    fn key(&self) -> InteractionPhase {
        InteractionPhase::Touch
    }

    fn enter_state(&mut self, _ctx: &mut InteractionContext) {
        self.elapsed = 0.0;
    }

    fn exit_state(&mut self, _ctx: &mut InteractionContext) {}

    fn update_state(&mut self, _ctx: &mut InteractionContext, _world: &InteractionWorld, dt: f32) {
        self.elapsed += dt;
    }

    fn next_state(&self, ctx: &mut InteractionContext) -> InteractionPhase {
        if self.elapsed > self.config.hold_duration || tracking::should_reset(ctx, &self.tracking) {
            InteractionPhase::Reset
        } else {
            InteractionPhase::Touch
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
