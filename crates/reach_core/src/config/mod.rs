//! # Interaction Configuration
//!
//! Every tunable of the controller lives here instead of inside the states.
//!
//! ## Presets
//!
//! | Profile | Feel |
//! |---------|------|
//! | `default` | Slow, deliberate reach |
//! | `responsive` | Shorter blends, faster wrist turns |
//! | `cautious` | Longer blends, must be closer before reaching |
//!
//! ## Usage
//!
//! ```rust
//! use reach_core::config::InteractionConfig;
//!
//! let config = InteractionConfig::default();
//! let snappy = InteractionConfig::responsive();
//! let from_env = InteractionConfig::from_env_or_default();
//! ```
//!
//! ## Environment Variables
//!
//! - `REACH_CONFIG_PROFILE`: Select preset (default, responsive, cautious)

mod phase_config;
mod tracking_config;

pub use phase_config::{ApproachConfig, ResetConfig, RiseConfig, SearchConfig, TouchConfig};
pub use tracking_config::{DetectionConfig, TrackingConfig};

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{InteractionError, Result};

pub const PROFILE_ENV_VAR: &str = "REACH_CONFIG_PROFILE";

pub const PROFILES: [&str; 3] = ["default", "responsive", "cautious"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct InteractionConfig {
    #[validate]
    pub tracking: TrackingConfig,
    #[validate]
    pub search: SearchConfig,
    #[validate]
    pub approach: ApproachConfig,
    #[validate]
    pub rise: RiseConfig,
    #[validate]
    pub touch: TouchConfig,
    #[validate]
    pub reset: ResetConfig,
    #[validate]
    pub detection: DetectionConfig,
}

impl InteractionConfig {
    /// Quicker blends and wrist turns for arcade-style movement
    pub fn responsive() -> Self {
        Self {
            approach: ApproachConfig {
                lerp_duration: 2.0,
                rotation_speed_deg: 900.0,
                max_duration: 1.5,
                ..ApproachConfig::default()
            },
            rise: RiseConfig {
                lerp_duration: 2.0,
                rotation_speed_deg: 1500.0,
                touch_time: 0.5,
                ..RiseConfig::default()
            },
            touch: TouchConfig { hold_duration: 0.3 },
            reset: ResetConfig {
                duration: 1.0,
                lerp_duration: 4.0,
                rotation_speed_deg: 900.0,
                ..ResetConfig::default()
            },
            ..Self::default()
        }
    }

    /// Slower blends; the arm only lifts for surfaces well within reach
    pub fn cautious() -> Self {
        Self {
            search: SearchConfig { approach_distance: 1.5 },
            approach: ApproachConfig {
                lerp_duration: 6.0,
                rise_distance: 0.4,
                max_duration: 3.0,
                ..ApproachConfig::default()
            },
            rise: RiseConfig { lerp_duration: 6.0, touch_time: 1.5, ..RiseConfig::default() },
            touch: TouchConfig { hold_duration: 1.0 },
            reset: ResetConfig { duration: 2.5, ..ResetConfig::default() },
            ..Self::default()
        }
    }

    pub fn from_profile(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "" | "default" => Some(Self::default()),
            "responsive" => Some(Self::responsive()),
            "cautious" => Some(Self::cautious()),
            _ => None,
        }
    }

    pub fn from_env_or_default() -> Self {
        let profile = env::var(PROFILE_ENV_VAR).unwrap_or_default();
        match Self::from_profile(&profile) {
            Some(config) => config,
            None => {
                tracing::warn!(profile = %profile, "unknown {}, using default", PROFILE_ENV_VAR);
                Self::default()
            }
        }
    }

    /// Run the range checks; returns the config unchanged when valid.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validated()
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validated()
    }

    /// Load by extension: `.json`, `.yaml` or `.yml`.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            other => Err(InteractionError::ConfigParse(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tunables() {
        let cfg = InteractionConfig::default();
        assert_eq!(cfg.search.approach_distance, 2.0);
        assert_eq!(cfg.approach.ik_weight, 0.5);
        assert_eq!(cfg.approach.rotation_weight, 0.75);
        assert_eq!(cfg.rise.lerp_duration, 5.0);
        assert_eq!(cfg.rise.rotation_speed_deg, 1000.0);
        assert_eq!(cfg.touch.hold_duration, 0.5);
        assert_eq!(cfg.reset.lerp_duration, 10.0);
        assert_eq!(cfg.tracking.interactable_layer().index(), 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid_and_distinct() {
        for name in PROFILES {
            let cfg = InteractionConfig::from_profile(name).unwrap();
            assert!(cfg.validate().is_ok(), "{} should validate", name);
        }
        let default = InteractionConfig::default();
        let responsive = InteractionConfig::responsive();
        let cautious = InteractionConfig::cautious();
        assert!(responsive.rise.lerp_duration < default.rise.lerp_duration);
        assert!(cautious.approach.rise_distance < default.approach.rise_distance);
        assert!(InteractionConfig::from_profile("ARCADE").is_none());
        assert!(InteractionConfig::from_profile("Responsive").is_some());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let raw = "rise:\n  touch_time: 5.0\ntouch:\n  hold_duration: 0.25\n";
        let cfg = InteractionConfig::from_yaml_str(raw).unwrap();
        assert_eq!(cfg.rise.touch_time, 5.0);
        assert_eq!(cfg.rise.lerp_duration, 5.0);
        assert_eq!(cfg.touch.hold_duration, 0.25);
        assert_eq!(cfg.search.approach_distance, 2.0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = InteractionConfig::from_json_str(r#"{"approach":{"ik_weight":1.5}}"#).unwrap_err();
        assert!(matches!(err, InteractionError::InvalidConfig(_)));

        let err = InteractionConfig::from_json_str(r#"{"tracking":{"interactable_layer":40}}"#)
            .unwrap_err();
        assert!(matches!(err, InteractionError::InvalidConfig(_)));

        let err = InteractionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, InteractionError::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("reach.yaml");
        let mut f = std::fs::File::create(&yaml_path).unwrap();
        writeln!(f, "search:\n  approach_distance: 1.25").unwrap();
        let cfg = InteractionConfig::load_from_path(&yaml_path).unwrap();
        assert_eq!(cfg.search.approach_distance, 1.25);

        let json_path = dir.path().join("reach.json");
        std::fs::write(&json_path, r#"{"touch":{"hold_duration":2.0}}"#).unwrap();
        let cfg = InteractionConfig::load_from_path(&json_path).unwrap();
        assert_eq!(cfg.touch.hold_duration, 2.0);

        let toml_path = dir.path().join("reach.toml");
        std::fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            InteractionConfig::load_from_path(&toml_path),
            Err(InteractionError::ConfigParse(_))
        ));

        assert!(matches!(
            InteractionConfig::load_from_path(dir.path().join("missing.yaml")),
            Err(InteractionError::Io(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip_keeps_values() {
        let cfg = InteractionConfig::cautious();
        let yaml = cfg.to_yaml().unwrap();
        let back = InteractionConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back.touch.hold_duration, cfg.touch.hold_duration);
        assert_eq!(back.search.approach_distance, cfg.search.approach_distance);
    }
}
