//! reach CLI support
//!
//! Config resolution and report rendering shared by the `reach` binary.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use reach_core::{InteractionConfig, ScenarioReport, ScenarioSpec};

/// Where the configuration for a run came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConfigSource {
    File(String),
    Profile(String),
    /// Profile named inside the scenario, or the default
    Scenario,
}

/// Precedence: `--config`, then `--profile`, then the scenario's own profile.
pub fn resolve_config(
    spec: &ScenarioSpec,
    config_path: Option<&Path>,
    profile: Option<&str>,
) -> Result<(InteractionConfig, ConfigSource)> {
    if let Some(path) = config_path {
        let config = InteractionConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        return Ok((config, ConfigSource::File(path.display().to_string())));
    }
    if let Some(name) = profile {
        let config = InteractionConfig::from_profile(name)
            .with_context(|| format!("Unknown profile {}", name))?;
        return Ok((config, ConfigSource::Profile(name.to_string())));
    }
    let config = spec.config().context("Failed to resolve scenario profile")?;
    Ok((config, ConfigSource::Scenario))
}

/// JSON export of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// RFC 3339
    pub generated_at: String,
    pub version: String,
    pub config_source: ConfigSource,
    pub passed: bool,
    pub report: ScenarioReport,
}

impl RunSummary {
    pub fn new(report: ScenarioReport, config_source: ConfigSource) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            version: reach_core::VERSION.to_string(),
            config_source,
            passed: report.passed(),
            report,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run summary")
    }
}

/// Human-readable phase timeline.
pub fn render_text(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scenario: {} ({} frames)", report.id, report.frames);
    if report.transitions.is_empty() {
        let _ = writeln!(out, "   (no transitions)");
    }
    for t in &report.transitions {
        let _ = writeln!(
            out,
            "   frame {:>5}  t={:>7.2}s  {:<8} -> {}",
            t.frame, t.time, t.from, t.to
        );
    }
    let _ = writeln!(out, "Final phase:    {}", report.final_phase);
    let _ = writeln!(out, "Peak IK weight: {:.3}", report.peak_ik_weight);
    if report.passed() {
        let _ = writeln!(out, "Result:         PASS");
    } else {
        let _ = writeln!(out, "Result:         FAIL");
        for failure in &report.assertion_failures {
            let _ = writeln!(out, "   - {}", failure);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reach_core::{InteractionPhase, TransitionRecord};

    fn spec(raw: &str) -> ScenarioSpec {
        ScenarioSpec::from_json_str(raw).unwrap()
    }

    fn report(failures: Vec<String>) -> ScenarioReport {
        ScenarioReport {
            id: "demo".to_string(),
            frames: 40,
            transitions: vec![TransitionRecord {
                frame: 19,
                time: 2.0,
                from: InteractionPhase::Reset,
                to: InteractionPhase::Search,
            }],
            final_phase: InteractionPhase::Search,
            peak_ik_weight: 0.0,
            assertion_failures: failures,
        }
    }

    #[test]
    fn test_config_precedence() {
        let s = spec(r#"{"id":"x","frames":1,"profile":"cautious"}"#);

        let (config, source) = resolve_config(&s, None, None).unwrap();
        assert_eq!(source, ConfigSource::Scenario);
        assert_eq!(config.search.approach_distance, 1.5);

        let (config, source) = resolve_config(&s, None, Some("responsive")).unwrap();
        assert_eq!(source, ConfigSource::Profile("responsive".to_string()));
        assert_eq!(config.touch.hold_duration, 0.3);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reach.yaml");
        std::fs::write(&path, "touch:\n  hold_duration: 0.75\n").unwrap();
        let (config, source) = resolve_config(&s, Some(&path), Some("responsive")).unwrap();
        assert!(matches!(source, ConfigSource::File(_)));
        assert_eq!(config.touch.hold_duration, 0.75);

        assert!(resolve_config(&s, None, Some("turbo")).is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&report(Vec::new()));
        assert!(text.contains("Scenario: demo (40 frames)"));
        assert!(text.contains("reset    -> search"));
        assert!(text.contains("PASS"));

        let text = render_text(&report(vec!["final phase search (expected touch)".to_string()]));
        assert!(text.contains("FAIL"));
        assert!(text.contains("   - final phase search (expected touch)"));
    }

    #[test]
    fn test_summary_json() {
        let summary = RunSummary::new(report(Vec::new()), ConfigSource::Scenario);
        let json = summary.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["passed"], true);
        assert_eq!(value["report"]["final_phase"], "search");
        assert_eq!(value["config_source"]["kind"], "scenario");
        assert!(chrono::DateTime::parse_from_rfc3339(value["generated_at"].as_str().unwrap()).is_ok());
    }
}
