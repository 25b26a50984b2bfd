//! Candidate tracking shared by the active phases
//!
//! A candidate is the point on the tracked collider nearest to the committed
//! shoulder. It exists only while the detection volume overlaps that
//! collider; losing the overlap raises a reset request.

use nalgebra::Vector3;

use crate::collider::Collider;
use crate::config::TrackingConfig;
use crate::context::{BodySide, InteractionContext};
use crate::math::EPS;

/// Start following `collider` if it is interactable and nothing is tracked yet.
///
/// The side is committed only when none is set, so a new surface picked up
/// mid-episode never flips the active arm.
pub fn start_tracking(ctx: &mut InteractionContext, cfg: &TrackingConfig, collider: &Collider) -> bool {
    if collider.layer != cfg.interactable_layer() || ctx.current_collider().is_some() {
        return false;
    }

    ctx.set_current_collider(Some(*collider));
    let side = match ctx.current_side() {
        Some(side) => side,
        None => ctx.select_side_for(collider),
    };
    refresh_candidate(ctx, cfg);

    tracing::debug!(
        collider = collider.id.0,
        ?side,
        point = ?ctx.closest_point(),
        "tracking started"
    );
    true
}

/// Refresh the candidate while the tracked collider keeps overlapping.
pub fn update_tracking(ctx: &mut InteractionContext, cfg: &TrackingConfig, collider: &Collider) {
    if ctx.current_collider().map(|c| c.id) != Some(collider.id) {
        return;
    }
    // the collider may have moved since it was first seen
    ctx.set_current_collider(Some(*collider));
    refresh_candidate(ctx, cfg);
}

/// The tracked collider left the detection volume.
pub fn stop_tracking(ctx: &mut InteractionContext, collider: &Collider) {
    if ctx.current_collider().map(|c| c.id) != Some(collider.id) {
        return;
    }
    ctx.clear_tracking();
    ctx.set_reset_requested(true);
    tracing::debug!(collider = collider.id.0, "tracking lost");
}

/// Recompute the candidate point and place the current IK target next to it.
///
/// The probe point is the shoulder at the captured shoulder height. The target
/// stands `surface_offset` off the surface toward the shoulder, at the current
/// interaction height.
pub fn refresh_candidate(ctx: &mut InteractionContext, cfg: &TrackingConfig) {
    let (Some(collider), Some(shoulder)) = (ctx.current_collider().copied(), ctx.current_shoulder())
    else {
        return;
    };

    let probe =
        Vector3::new(shoulder.x, ctx.root().position.y + ctx.shoulder_height(), shoulder.z);
    let point = collider.closest_point(&probe);
    ctx.set_closest_point(Some(point));

    let back_off = (shoulder - point).try_normalize(EPS).unwrap_or_else(Vector3::zeros);
    let standoff = point + back_off * cfg.surface_offset;
    let height = ctx.interaction_point_y_offset;
    if let Some(ik) = ctx.current_ik_mut() {
        ik.target.position = Vector3::new(standoff.x, height, standoff.z);
    }
}

/// Whether the episode must fall back to Reset.
///
/// Evaluates every condition so the moving-away detector keeps its running
/// minimum current. Any positive answer forgets that minimum.
pub fn should_reset(ctx: &mut InteractionContext, cfg: &TrackingConfig) -> bool {
    if ctx.reset_requested() {
        ctx.set_reset_requested(false);
        ctx.set_lowest_distance(f32::INFINITY);
        return true;
    }

    let stopped = !ctx.is_moving(cfg.stopped_speed);
    let moving_away = is_moving_away(ctx, cfg);
    let bad_angle = is_bad_angle(ctx);
    let jumping = ctx.velocity().y >= cfg.jump_speed;

    if stopped || moving_away || bad_angle || jumping {
        tracing::trace!(stopped, moving_away, bad_angle, jumping, "reset condition");
        ctx.set_lowest_distance(f32::INFINITY);
        return true;
    }
    false
}

/// Root drifting away from the candidate by more than the tolerance.
pub fn is_moving_away(ctx: &mut InteractionContext, cfg: &TrackingConfig) -> bool {
    if ctx.current_collider().is_none() {
        return false;
    }
    let Some(point) = ctx.closest_point() else {
        return false;
    };

    let distance = (ctx.root().position - point).norm();
    if distance <= ctx.lowest_distance() {
        ctx.set_lowest_distance(distance);
        return false;
    }
    if distance > ctx.lowest_distance() + cfg.moving_away_tolerance {
        ctx.set_lowest_distance(f32::INFINITY);
        return true;
    }
    false
}

/// Candidate lies behind the committed shoulder's outward axis.
pub fn is_bad_angle(ctx: &InteractionContext) -> bool {
    if ctx.current_collider().is_none() {
        return false;
    }
    let (Some(point), Some(shoulder), Some(side)) =
        (ctx.closest_point(), ctx.current_shoulder(), ctx.current_side())
    else {
        return false;
    };
    let Some(direction) = (point - shoulder).try_normalize(EPS) else {
        return false;
    };

    let outward = match side {
        BodySide::Right => ctx.root().right(),
        BodySide::Left => -ctx.root().right(),
    };
    outward.dot(&direction) < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::{ColliderId, CollisionLayer};
    use crate::math::Transform;
    use crate::states::test_support::{context, right_wall};

    fn cfg() -> TrackingConfig {
        TrackingConfig::default()
    }

    #[test]
    fn test_start_tracking_requires_interactable_layer() {
        let mut ctx = context();
        let plain = right_wall().with_layer(CollisionLayer::DEFAULT);
        assert!(!start_tracking(&mut ctx, &cfg(), &plain));
        assert!(ctx.closest_point().is_none());
        assert!(ctx.current_side().is_none());
    }

    #[test]
    fn test_start_tracking_places_target() {
        let mut ctx = context();
        assert!(start_tracking(&mut ctx, &cfg(), &right_wall()));
        assert_eq!(ctx.current_side(), Some(BodySide::Right));

        let point = ctx.closest_point().unwrap();
        assert!((point - Vector3::new(0.6, 1.4, 0.0)).norm() < 1e-5);

        let target = ctx.current_ik().unwrap().target.position;
        assert!((target.x - 0.55).abs() < 1e-5);
        assert!((target.y - ctx.interaction_point_y_offset).abs() < 1e-5);
        assert!(target.z.abs() < 1e-5);

        // a second surface does not replace the first
        let other = Collider::sphere(ColliderId(99), Vector3::new(-1.0, 1.4, 0.0), 0.3)
            .with_layer(right_wall().layer);
        assert!(!start_tracking(&mut ctx, &cfg(), &other));
        assert_eq!(ctx.current_collider().unwrap().id, right_wall().id);
    }

    #[test]
    fn test_update_ignores_other_colliders() {
        let mut ctx = context();
        start_tracking(&mut ctx, &cfg(), &right_wall());

        let mut moved = right_wall();
        moved.transform = Transform::from_position(Vector3::new(0.8, 1.0, 0.0));
        update_tracking(&mut ctx, &cfg(), &moved);
        assert!((ctx.closest_point().unwrap().x - 0.7).abs() < 1e-5);

        let mut stranger = moved;
        stranger.id = ColliderId(77);
        stranger.transform = Transform::from_position(Vector3::new(3.0, 1.0, 0.0));
        update_tracking(&mut ctx, &cfg(), &stranger);
        assert!((ctx.closest_point().unwrap().x - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_stop_tracking_requests_reset() {
        let mut ctx = context();
        start_tracking(&mut ctx, &cfg(), &right_wall());

        let mut stranger = right_wall();
        stranger.id = ColliderId(5);
        stop_tracking(&mut ctx, &stranger);
        assert!(ctx.closest_point().is_some());

        stop_tracking(&mut ctx, &right_wall());
        assert!(ctx.closest_point().is_none());
        assert!(ctx.current_collider().is_none());
        assert!(ctx.reset_requested());

        assert!(should_reset(&mut ctx, &cfg()));
        assert!(!ctx.reset_requested());
    }

    #[test]
    fn test_should_reset_conditions() {
        let mut ctx = context();
        start_tracking(&mut ctx, &cfg(), &right_wall());
        assert!(!should_reset(&mut ctx, &cfg()));

        // standing still
        let root = *ctx.root();
        ctx.sync_body(root, Vector3::zeros());
        assert!(should_reset(&mut ctx, &cfg()));

        // jumping
        ctx.sync_body(root, Vector3::new(0.0, 2.0, 1.0));
        assert!(should_reset(&mut ctx, &cfg()));

        ctx.sync_body(root, Vector3::new(0.0, 0.0, 1.0));
        assert!(!should_reset(&mut ctx, &cfg()));
    }

    #[test]
    fn test_moving_away_uses_running_minimum() {
        let mut ctx = context();
        start_tracking(&mut ctx, &cfg(), &right_wall());
        let velocity = Vector3::new(0.0, 0.0, 1.0);

        assert!(!is_moving_away(&mut ctx, &cfg()));
        let first = ctx.lowest_distance();
        assert!(first.is_finite());

        // tiny drift inside the tolerance
        ctx.sync_body(Transform::from_position(Vector3::new(-0.003, 0.0, 0.0)), velocity);
        assert!(!is_moving_away(&mut ctx, &cfg()));
        assert_eq!(ctx.lowest_distance(), first);

        // step away from the wall
        ctx.sync_body(Transform::from_position(Vector3::new(-0.2, 0.0, 0.0)), velocity);
        assert!(is_moving_away(&mut ctx, &cfg()));
        assert!(ctx.lowest_distance().is_infinite());
    }

    #[test]
    fn test_bad_angle_when_surface_behind_shoulder() {
        let mut ctx = context();
        start_tracking(&mut ctx, &cfg(), &right_wall());
        assert!(!is_bad_angle(&ctx));

        // turn around: the committed right arm now points away from the wall
        let velocity = ctx.velocity();
        ctx.sync_body(Transform::from_position_yaw(Vector3::zeros(), 180.0), velocity);
        assert!(is_bad_angle(&ctx));
    }
}
