//! Environment Interaction Machine
//!
//! Owns the context and the five phase states, advances the active phase
//! once per frame and forwards detection-volume trigger events to it.
//!
//! ## Frame
//! ```text
//! sync_body(root, velocity)          host pushes body state
//! on_trigger_enter/stay/exit(c)      host forwards overlaps (active phase only)
//! tick(dt, world)                    update_state → next_state → exit/enter
//! drive_solver(solver)               host reads back IK targets and weights
//! ```

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::collider::{CapsuleCollider, Collider, OrientedBox};
use crate::config::{DetectionConfig, InteractionConfig};
use crate::context::{BodySide, InteractionContext, RigBindings};
use crate::error::{InteractionError, Result};
use crate::fsm::StateManager;
use crate::math::Transform;
use crate::query::{TriggerEvent, TriggerPhase};
use crate::states::{
    ApproachState, BoxedInteractionState, InteractionPhase, InteractionWorld, ResetState,
    RiseState, SearchState, TouchState,
};

/// Registration order of the phase states.
pub const REGISTRATION_ORDER: [InteractionPhase; 5] = [
    InteractionPhase::Reset,
    InteractionPhase::Touch,
    InteractionPhase::Rise,
    InteractionPhase::Approach,
    InteractionPhase::Search,
];

pub const INITIAL_PHASE: InteractionPhase = InteractionPhase::Reset;

/// Trigger-only box attached to the character root.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionVolume {
    /// Full extents
    pub size: Vector3<f32>,
    /// Root-local center
    pub center: Vector3<f32>,
    pub is_trigger: bool,
}

impl DetectionVolume {
    /// A cube one wingspan wide, raised and pushed ahead of the capsule center.
    pub fn from_capsule(capsule: &CapsuleCollider, config: &DetectionConfig) -> Self {
        let wingspan = capsule.wingspan() * config.size_factor;
        let offset = Vector3::new(
            0.0,
            wingspan * config.vertical_offset_factor,
            wingspan * config.forward_offset_factor,
        );
        Self {
            size: Vector3::repeat(wingspan),
            center: capsule.center + offset,
            is_trigger: true,
        }
    }

    pub fn world_box(&self, root: &Transform) -> OrientedBox {
        let placement = Transform::new(root.transform_point(&self.center), root.rotation);
        OrientedBox::from_transform(&placement, self.size * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: InteractionPhase,
    pub to: InteractionPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Active phase after the frame
    pub phase: InteractionPhase,
    pub transition: Option<PhaseTransition>,
}

/// Write-only seam to whatever solves the arm chains.
pub trait ConstraintSolver {
    fn apply_ik(&mut self, side: BodySide, target: &Transform, weight: f32);

    fn apply_rotation_weight(&mut self, side: BodySide, weight: f32);
}

pub struct EnvironmentInteractionMachine {
    manager: StateManager<InteractionPhase, InteractionContext, InteractionWorld, Collider>,
    config: InteractionConfig,
    detection: DetectionVolume,
    entered: bool,
    frame: u64,
}

impl EnvironmentInteractionMachine {
    /// Fails before any state exists when a binding is missing or invalid.
    pub fn new(bindings: &RigBindings, root: Transform, config: InteractionConfig) -> Result<Self> {
        let config = config.validated()?;
        let rig = bindings.validate()?;
        let context = InteractionContext::new(&rig, root);
        let detection = DetectionVolume::from_capsule(&rig.root_collider, &config.detection);

        let states: Vec<BoxedInteractionState> = REGISTRATION_ORDER
            .iter()
            .map(|phase| build_state(*phase, &config))
            .collect();
        let manager = StateManager::new(context, states, INITIAL_PHASE)?;

        tracing::debug!(
            phase = %INITIAL_PHASE,
            detection_size = detection.size.x,
            "interaction machine created"
        );
        Ok(Self { manager, config, detection, entered: false, frame: 0 })
    }

    pub fn with_defaults(bindings: &RigBindings, root: Transform) -> Result<Self> {
        Self::new(bindings, root, InteractionConfig::default())
    }

    /// Enter the initial phase. `tick` does this on its first call.
    pub fn enter(&mut self) -> Result<()> {
        if self.entered {
            return Ok(());
        }
        self.manager.enter()?;
        self.entered = true;
        Ok(())
    }

    /// Advance one frame: update the active phase, then apply its transition.
    pub fn tick(&mut self, dt: f32, world: &InteractionWorld) -> Result<TickReport> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(InteractionError::InvalidDeltaTime(dt));
        }
        self.enter()?;

        self.manager.tick(world, dt)?;
        let from = self.manager.current_key();
        let to = self.manager.next_key()?;
        let transition = if self.manager.transition_to(to)? {
            tracing::debug!(frame = self.frame, %from, %to, "phase transition");
            Some(PhaseTransition { from, to })
        } else {
            None
        };

        if let Some(side) = self.context().current_side() {
            tracing::trace!(
                frame = self.frame,
                ?side,
                ik_weight = self.context().ik(side).weight,
                rotation_weight = self.context().rotation(side).weight,
                "weights"
            );
        }
        self.frame += 1;
        Ok(TickReport { phase: self.manager.current_key(), transition })
    }

    pub fn on_trigger_enter(&mut self, other: &Collider) -> Result<()> {
        self.forward(TriggerPhase::Enter, other)
    }

    pub fn on_trigger_stay(&mut self, other: &Collider) -> Result<()> {
        self.forward(TriggerPhase::Stay, other)
    }

    pub fn on_trigger_exit(&mut self, other: &Collider) -> Result<()> {
        self.forward(TriggerPhase::Exit, other)
    }

    pub fn handle_trigger(&mut self, event: &TriggerEvent) -> Result<()> {
        self.forward(event.phase, &event.collider)
    }

    fn forward(&mut self, phase: TriggerPhase, other: &Collider) -> Result<()> {
        tracing::trace!(
            ?phase,
            collider = other.id.0,
            active = %self.manager.current_key(),
            "trigger"
        );
        self.manager.forward_trigger(phase, other)
    }

    /// Push this frame's root pose and body velocity.
    pub fn sync_body(&mut self, root: Transform, velocity: Vector3<f32>) {
        self.manager.context_mut().sync_body(root, velocity);
    }

    pub fn phase(&self) -> InteractionPhase {
        self.manager.current_key()
    }

    pub fn context(&self) -> &InteractionContext {
        self.manager.context()
    }

    /// Host-side overrides such as animated shoulder positions.
    pub fn context_mut(&mut self) -> &mut InteractionContext {
        self.manager.context_mut()
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn detection_volume(&self) -> &DetectionVolume {
        &self.detection
    }

    /// The detection volume placed at the current root.
    pub fn detection_box(&self) -> OrientedBox {
        self.detection.world_box(self.context().root())
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn drive_solver<S: ConstraintSolver + ?Sized>(&self, solver: &mut S) {
        let ctx = self.context();
        for side in BodySide::ALL {
            let ik = ctx.ik(side);
            solver.apply_ik(side, &ik.target, ik.weight);
            solver.apply_rotation_weight(side, ctx.rotation(side).weight);
        }
    }
}

fn build_state(phase: InteractionPhase, config: &InteractionConfig) -> BoxedInteractionState {
    match phase {
        InteractionPhase::Search => Box::new(SearchState::new(config)),
        InteractionPhase::Approach => Box::new(ApproachState::new(config)),
        InteractionPhase::Rise => Box::new(RiseState::new(config)),
        InteractionPhase::Touch => Box::new(TouchState::new(config)),
        InteractionPhase::Reset => Box::new(ResetState::new(config)),
    }
}
