//! # Deployer Configuration Validator
//!
//! Command-line tool for validating deployer configuration files across environments.
//! Catches bad budgets, intervals and unsupported format/storage pairs before a deployer
//! process starts.

use anyhow::Context;
use clap::{Parser, Subcommand};
use deployer_core::config::ConfigManager;
use deployer_core::templates::DeploymentTarget;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate deployer configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration
    Validate,

    /// Print the merged configuration with secrets masked
    Show,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match cli.command {
        Some(Commands::Show) => show_config(&cli),
        Some(Commands::Validate) | None => validate_config(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            println!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> anyhow::Result<Arc<ConfigManager>> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigManager::detect_environment);

    ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &environment)
        .with_context(|| format!("failed to load configuration for environment {environment}"))
}

fn validate_config(cli: &Cli) -> anyhow::Result<()> {
    println!("🔧 Validating Deployer Configuration");

    let manager = load(cli)?;
    let config = manager.config();
    println!("Environment: {}", manager.environment());
    println!("Config Directory: {}", manager.config_directory().display());
    println!("✅ Configuration loaded and validated");

    let target = DeploymentTarget::from_tags(&config.api.image_format, &config.worker.image_storage)
        .context("image format and storage cannot be deployed")?;
    println!(
        "✅ Deployment target: {target:?} (template {})",
        target.template_name()
    );

    let poll = config.poll_policy();
    println!(
        "✅ Stack polling: {} attempts, first wait {:?}, growth {}{}",
        poll.max_attempts,
        poll.initial_interval,
        poll.growth_factor,
        poll.max_interval
            .map(|ceiling| format!(", ceiling {ceiling:?}"))
            .unwrap_or_default()
    );

    let probe = config.probe_policy();
    println!(
        "✅ Readiness probing: {} attempts every {:?}, connect timeout {:?}",
        probe.max_attempts, probe.retry_interval, probe.connect_timeout
    );

    Ok(())
}

fn show_config(cli: &Cli) -> anyhow::Result<()> {
    let manager = load(cli)?;
    let rendered = serde_json::to_string_pretty(&manager.debug_config())
        .context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
