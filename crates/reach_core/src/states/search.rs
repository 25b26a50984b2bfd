//! Search: arm idle, waiting for an interactable surface within reach.

use crate::collider::Collider;
use crate::config::{InteractionConfig, SearchConfig, TrackingConfig};
use crate::context::InteractionContext;
use crate::fsm::BaseState;

use super::tracking;
use super::{InteractionPhase, InteractionWorld};

#[derive(Debug, Clone)]
pub struct SearchState {
    tracking: TrackingConfig,
    config: SearchConfig,
}

impl SearchState {
    pub fn new(config: &InteractionConfig) -> Self {
        Self { tracking: config.tracking.clone(), config: config.search.clone() }
    }
}

impl BaseState<InteractionPhase, InteractionContext, InteractionWorld, Collider> for SearchState {
    fn key(&self) -> InteractionPhase {
        InteractionPhase::Search
    }

    fn enter_state(&mut self, _ctx: &mut InteractionContext) {}

    fn exit_state(&mut self, _ctx: &mut InteractionContext) {}

    fn update_state(&mut self, _ctx: &mut InteractionContext, _world: &InteractionWorld, _dt: f32) {}

    fn next_state(&self, ctx: &mut InteractionContext) -> InteractionPhase {
        if tracking::should_reset(ctx, &self.tracking) {
            return InteractionPhase::Reset;
        }
        match ctx.closest_point() {
            Some(point) if (point - ctx.root().position).norm() < self.config.approach_distance => {
                InteractionPhase::Approach
            }
            _ => InteractionPhase::Search,
        }
    }

    fn on_trigger_enter(&mut self, ctx: &mut InteractionContext, other: &Collider) {
        tracking::start_tracking(ctx, &self.tracking, other);
    }

    fn on_trigger_stay(&mut self, ctx: &mut InteractionContext, other: &Collider) {
        // a surface already inside the volume when Search began
        if ctx.current_collider().is_none() {
            tracking::start_tracking(ctx, &self.tracking, other);
        } else {
            tracking::update_tracking(ctx, &self.tracking, other);
        }
    }

    fn on_trigger_exit(&mut self, ctx: &mut InteractionContext, other: &Collider) {
        tracking::stop_tracking(ctx, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::ColliderId;
    use crate::query::NoHits;
    use crate::states::test_support::{context, right_wall};
    use nalgebra::Vector3;

    fn state() -> SearchState {
        SearchState::new(&InteractionConfig::default())
    }

    #[test]
    fn test_stays_without_candidate() {
        let mut ctx = context();
        let mut s = state();
        s.enter_state(&mut ctx);
        s.update_state(&mut ctx, &NoHits, 0.1);
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Search);
    }

    #[test]
    fn test_near_candidate_moves_to_approach() {
        let mut ctx = context();
        let mut s = state();
        s.on_trigger_enter(&mut ctx, &right_wall());
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Approach);
    }

    #[test]
    fn test_far_candidate_keeps_searching() {
        let mut ctx = context();
        let mut s = state();
        let far = Collider::sphere(ColliderId(3), Vector3::new(3.0, 1.4, 0.0), 0.5)
            .with_layer(right_wall().layer);
        s.on_trigger_enter(&mut ctx, &far);
        assert!(ctx.closest_point().is_some());
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Search);
    }

    #[test]
    fn test_stay_starts_tracking_when_idle() {
        let mut ctx = context();
        let mut s = state();
        s.on_trigger_stay(&mut ctx, &right_wall());
        assert_eq!(ctx.current_collider().map(|c| c.id), Some(right_wall().id));
    }

    #[test]
    fn test_exit_forces_reset() {
        let mut ctx = context();
        let mut s = state();
        s.on_trigger_enter(&mut ctx, &right_wall());
        s.on_trigger_exit(&mut ctx, &right_wall());
        assert_eq!(s.next_state(&mut ctx), InteractionPhase::Reset);
    }
}
