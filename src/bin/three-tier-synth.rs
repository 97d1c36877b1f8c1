// Copyright (c) 2025 - Cowboy AI, Inc.
//! Three-Tier Synthesizer
//!
//! Declares the three-tier stack, validates it and writes the manifest JSON.
//!
//! Run with: cargo run --bin three-tier-synth
//!
//! Environment:
//! - `STACK_ACCOUNT`, `STACK_REGION`, `STACK_NAME`: deployment target
//! - `POLICY_GAP_MODE`: `deny` (default) or `warn`
//! - `STACK_PROPS`: optional JSON file overriding the stack properties
//! - `SYNTH_OUTPUT`: manifest path, stdout when unset
//! - `RUST_LOG`: log filter (logs go to stderr)

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use tracing::{debug, info};

use three_tier_topology::{synthesize, SynthConfig, ThreeTierProps};

fn load_props(config: &SynthConfig) -> Result<ThreeTierProps> {
    let Some(path) = &config.props else {
        debug!("No STACK_PROPS set, using default properties");
        return Ok(ThreeTierProps::default());
    };

    info!("📋 Loading stack properties from {}", path.display());
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read stack properties from {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse stack properties in {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("🚀 Starting three-tier synthesis");

    let config = SynthConfig::from_env().context("Invalid synthesis configuration")?;
    info!("📋 Configuration loaded:");
    info!("  - Account: {}", config.environment.account());
    info!("  - Region: {}", config.environment.region());
    info!("  - Stack: {}", config.environment.stack_name());
    info!("  - Policy gap mode: {}", config.gap_mode);

    let props = load_props(&config)?;

    let manifest = synthesize(&config.environment, &props, config.gap_mode)
        .context("Failed to synthesize stack")?;
    let json = manifest
        .to_json_pretty()
        .context("Failed to serialize manifest")?;

    match &config.output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
            info!("✅ Manifest written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write manifest to stdout")?;
            info!("✅ Manifest written to stdout");
        }
    }

    info!(
        "🏁 Stack {} synthesized with {} declarations",
        manifest.stack_id,
        manifest.graph.len()
    );
    Ok(())
}
