//! reach CLI
//!
//! Runs interaction scenarios and inspects configuration presets.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "reach")]
#[command(about = "Run and inspect environment-interaction scenarios", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose library logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file and print its phase timeline
    Run {
        /// Scenario file (.json, .yaml or .yml)
        scenario: PathBuf,

        /// Configuration file; takes precedence over --profile
        #[arg(long)]
        config: Option<PathBuf>,

        /// Configuration preset (default, responsive, cautious)
        #[arg(long)]
        profile: Option<String>,

        /// Print a JSON report instead of the timeline
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print a configuration preset as YAML
    Config {
        /// Preset name; falls back to REACH_CONFIG_PROFILE
        #[arg(long)]
        profile: Option<String>,
    },

    /// Load and validate a configuration file
    Validate {
        /// Configuration file (.json, .yaml or .yml)
        config: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn init_logging(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_directive = if debug {
        "reach_core=debug,reach=debug,info"
    } else {
        "reach_core=info,reach=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Commands::Run { scenario, config, profile, json } => {
            let passed = run_scenario(&scenario, config.as_deref(), profile.as_deref(), json)?;
            if !passed {
                std::process::exit(2);
            }
        }
        Commands::Config { profile } => {
            let config = match profile {
                Some(name) => reach_core::InteractionConfig::from_profile(&name)
                    .with_context(|| format!("Unknown profile {}", name))?,
                None => reach_core::InteractionConfig::from_env_or_default(),
            };
            print!("{}", config.to_yaml()?);
        }
        Commands::Validate { config } => {
            reach_core::InteractionConfig::load_from_path(&config)
                .with_context(|| format!("Invalid config {}", config.display()))?;
            println!("✅ {} is valid", config.display());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn run_scenario(
    path: &std::path::Path,
    config_path: Option<&std::path::Path>,
    profile: Option<&str>,
    json: bool,
) -> Result<bool> {
    let spec = reach_core::ScenarioSpec::load_from_path(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    let (config, source) = reach_cli::resolve_config(&spec, config_path, profile)?;
    tracing::info!(scenario = %spec.id, source = ?source, "running");

    let report = spec.run(config).with_context(|| format!("Scenario {} failed to run", spec.id))?;
    let passed = report.passed();

    if json {
        println!("{}", reach_cli::RunSummary::new(report, source).to_json()?);
    } else {
        print!("{}", reach_cli::render_text(&report));
    }
    Ok(passed)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("reach CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
