//! Scripted interaction scenarios
//!
//! A scenario places a character and some colliders, scripts the body's
//! velocity over time and runs the machine frame by frame against a
//! [`StaticWorld`]. Files are JSON or YAML.
//!
//! ```yaml
//! id: walk_along_wall
//! dt: 0.05
//! frames: 200
//! motion:
//!   - { from_frame: 0, velocity: [0.0, 0.0, 1.0] }
//! colliders:
//!   - id: 1
//!     shape: { type: cuboid, half_extents: [0.1, 1.0, 3.0] }
//!     position: [0.7, 1.0, 6.0]
//!     layer: 6
//! expect:
//!   phases: [search, approach, rise, touch, reset]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::collider::{CapsuleCollider, Collider, ColliderId, ColliderShape, CollisionLayer};
use crate::config::InteractionConfig;
use crate::context::{BodySide, RigBindings};
use crate::error::{InteractionError, Result};
use crate::machine::EnvironmentInteractionMachine;
use crate::math::Transform;
use crate::states::InteractionPhase;
use crate::world::{StaticWorld, TriggerTracker};

fn default_dt() -> f32 {
    1.0 / 60.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCapsule {
    pub center: [f32; 3],
    pub height: f32,
    pub radius: f32,
}

impl Default for ScenarioCapsule {
    fn default() -> Self {
        Self { center: [0.0, 0.9, 0.0], height: 1.8, radius: 0.3 }
    }
}

/// Symmetric biped description; see [`RigBindings::humanoid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRig {
    pub shoulder_width: f32,
    pub shoulder_height: f32,
    pub capsule: ScenarioCapsule,
}

impl Default for ScenarioRig {
    fn default() -> Self {
        Self { shoulder_width: 0.4, shoulder_height: 1.4, capsule: ScenarioCapsule::default() }
    }
}

impl ScenarioRig {
    pub fn bindings(&self) -> RigBindings {
        let capsule = CapsuleCollider::new(
            Vector3::from(self.capsule.center),
            self.capsule.height,
            self.capsule.radius,
        );
        RigBindings::humanoid(capsule, self.shoulder_width, self.shoulder_height)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRoot {
    pub position: [f32; 3],
    pub yaw_deg: f32,
}

/// Body velocity from `from_frame` until the next segment starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSegment {
    pub from_frame: u32,
    pub velocity: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCollider {
    pub id: u32,
    pub shape: ColliderShape,
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw_deg: f32,
    #[serde(default)]
    pub layer: u8,
}

impl ScenarioCollider {
    pub fn to_collider(&self) -> Result<Collider> {
        let layer = CollisionLayer::new(self.layer).ok_or_else(|| {
            InteractionError::Scenario(format!(
                "collider {} uses layer {} (expected 0..=31)",
                self.id, self.layer
            ))
        })?;
        Ok(Collider {
            id: ColliderId(self.id),
            shape: self.shape,
            transform: Transform::from_position_yaw(Vector3::from(self.position), self.yaw_deg),
            layer,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioExpect {
    /// Phases that must be visited in this order (gaps allowed)
    pub phases: Vec<InteractionPhase>,
    pub final_phase: Option<InteractionPhase>,
    pub min_peak_ik_weight: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_dt")]
    pub dt: f32,
    pub frames: u32,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub rig: ScenarioRig,
    #[serde(default)]
    pub root: ScenarioRoot,
    #[serde(default)]
    pub motion: Vec<MotionSegment>,
    #[serde(default)]
    pub colliders: Vec<ScenarioCollider>,
    #[serde(default)]
    pub expect: ScenarioExpect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub frame: u32,
    /// Simulated seconds at the end of the frame
    pub time: f32,
    pub from: InteractionPhase,
    pub to: InteractionPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub id: String,
    pub frames: u32,
    pub transitions: Vec<TransitionRecord>,
    pub final_phase: InteractionPhase,
    pub peak_ik_weight: f32,
    pub assertion_failures: Vec<String>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.assertion_failures.is_empty()
    }

    /// Initial phase followed by every phase entered.
    pub fn visited(&self) -> Vec<InteractionPhase> {
        let mut phases = vec![crate::machine::INITIAL_PHASE];
        phases.extend(self.transitions.iter().map(|t| t.to));
        phases
    }
}

impl ScenarioSpec {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let spec: Self =
            serde_json::from_str(raw).map_err(|err| InteractionError::Scenario(err.to_string()))?;
        spec.check()?;
        Ok(spec)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let spec: Self =
            serde_yaml::from_str(raw).map_err(|err| InteractionError::Scenario(err.to_string()))?;
        spec.check()?;
        Ok(spec)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            other => Err(InteractionError::Scenario(format!("unsupported extension {:?}", other))),
        };
        parsed.map_err(|err| match err {
            InteractionError::Scenario(msg) => {
                InteractionError::Scenario(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    fn check(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(InteractionError::Scenario(format!("dt must be positive, got {}", self.dt)));
        }
        if self.frames == 0 {
            return Err(InteractionError::Scenario("frames must be at least 1".to_string()));
        }
        let mut ids = BTreeSet::new();
        for collider in &self.colliders {
            if !ids.insert(collider.id) {
                return Err(InteractionError::Scenario(format!(
                    "collider id {} used twice",
                    collider.id
                )));
            }
            collider.to_collider()?;
        }
        Ok(())
    }

    /// The profile named by the scenario, or the default configuration.
    pub fn config(&self) -> Result<InteractionConfig> {
        match self.profile.as_deref() {
            None => Ok(InteractionConfig::default()),
            Some(name) => InteractionConfig::from_profile(name)
                .ok_or_else(|| InteractionError::Scenario(format!("unknown profile {}", name))),
        }
    }

    pub fn world(&self) -> Result<StaticWorld> {
        let colliders =
            self.colliders.iter().map(ScenarioCollider::to_collider).collect::<Result<Vec<_>>>()?;
        Ok(StaticWorld::from_colliders(colliders))
    }

    pub fn start_transform(&self) -> Transform {
        Transform::from_position_yaw(Vector3::from(self.root.position), self.root.yaw_deg)
    }

    pub fn to_machine(&self, config: InteractionConfig) -> Result<EnvironmentInteractionMachine> {
        EnvironmentInteractionMachine::new(&self.rig.bindings(), self.start_transform(), config)
    }

    /// Velocity of the latest segment that has started by `frame`.
    pub fn velocity_at(&self, frame: u32) -> Vector3<f32> {
        self.motion
            .iter()
            .filter(|segment| segment.from_frame <= frame)
            .max_by_key(|segment| segment.from_frame)
            .map(|segment| Vector3::from(segment.velocity))
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn run(&self, config: InteractionConfig) -> Result<ScenarioReport> {
        let world = self.world()?;
        let mut machine = self.to_machine(config)?;
        let mut tracker = TriggerTracker::new();

        let start = self.start_transform();
        let mut position = start.position;
        let mut transitions = Vec::new();
        let mut peak_ik_weight: f32 = 0.0;

        tracing::info!(id = %self.id, frames = self.frames, dt = self.dt, "scenario started");
        for frame in 0..self.frames {
            let velocity = self.velocity_at(frame);
            position += velocity * self.dt;
            machine.sync_body(Transform::new(position, start.rotation), velocity);

            for event in tracker.update(&world, &machine.detection_box()) {
                machine.handle_trigger(&event)?;
            }

            let report = machine.tick(self.dt, &world)?;
            if let Some(transition) = report.transition {
                transitions.push(TransitionRecord {
                    frame,
                    time: (frame + 1) as f32 * self.dt,
                    from: transition.from,
                    to: transition.to,
                });
            }
            for side in BodySide::ALL {
                peak_ik_weight = peak_ik_weight.max(machine.context().ik(side).weight);
            }
        }

        let mut report = ScenarioReport {
            id: self.id.clone(),
            frames: self.frames,
            transitions,
            final_phase: machine.phase(),
            peak_ik_weight,
            assertion_failures: Vec::new(),
        };
        report.assertion_failures = self.check_expectations(&report);
        tracing::info!(
            id = %self.id,
            transitions = report.transitions.len(),
            failures = report.assertion_failures.len(),
            "scenario finished"
        );
        Ok(report)
    }

    fn check_expectations(&self, report: &ScenarioReport) -> Vec<String> {
        let mut failures = Vec::new();

        let visited = report.visited();
        let mut remaining = visited.iter();
        for expected in &self.expect.phases {
            if !remaining.any(|phase| phase == expected) {
                failures.push(format!(
                    "phase sequence {:?} not visited in order (visited {:?})",
                    self.expect.phases, visited
                ));
                break;
            }
        }

        if let Some(expected) = self.expect.final_phase {
            if report.final_phase != expected {
                failures.push(format!(
                    "final phase {} (expected {})",
                    report.final_phase, expected
                ));
            }
        }

        if let Some(min) = self.expect.min_peak_ik_weight {
            if report.peak_ik_weight < min {
                failures.push(format!(
                    "peak IK weight {:.3} below {:.3}",
                    report.peak_ik_weight, min
                ));
            }
        }
        failures
    }
}
