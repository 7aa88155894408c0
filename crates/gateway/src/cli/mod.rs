pub mod config;
pub mod doctor;

use clap::{Parser, Subcommand};

/// The Plan-and-Execute workflow gateway.
#[derive(Debug, Parser)]
#[command(name = "pax-gateway", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP + WebSocket server (default when no subcommand is given).
    Serve,
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors; exit code reflects pass/fail.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Loads configuration from the path named by `PAX_CONFIG` (or `config.toml`
/// by default). Shared by `serve`, `doctor`, and `config` subcommands.
pub fn load_config() -> anyhow::Result<(pax_domain::config::Config, String)> {
    let config_path = std::env::var("PAX_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let path = std::path::Path::new(&config_path);
    let config = pax_domain::config::Config::load(Some(path))
        .map_err(|e| anyhow::anyhow!("loading {config_path}: {e}"))?;
    Ok((config, config_path))
}
