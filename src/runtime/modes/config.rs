//! Config mode

use std::path::Path;

use anyhow::{Result, bail};
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::StaticConfig;

/// Default output of `config generate`
pub const SAMPLE_CONFIG_PATH: &str = "config.example.toml";

pub fn run_config_command(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Generate { output_path, force } => config_generate(output_path, force),
    }
}

/// Generate example configuration file
pub fn config_generate(output_path: Option<String>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or_else(|| SAMPLE_CONFIG_PATH.to_string());

    if !force && Path::new(&path).exists() {
        bail!("File already exists: {} (use --force to overwrite)", path);
    }

    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );

    StaticConfig::save_sample_config(&path)?;

    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    println!(
        "  {}",
        "Set api.token and api.inverters, then start the exporter".yellow()
    );
    Ok(())
}
