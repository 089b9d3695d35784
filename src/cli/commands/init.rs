//! Init and Config commands.

use anyhow::{Context as _, bail};

use super::Context;
use crate::cli::output::Status;
use reposcope::config::CONFIG_DIR;

/// Write `.reposcope/settings.toml` under the root with default settings.
pub fn run_init(ctx: &Context, force: bool) -> anyhow::Result<Status> {
    let config_path = ctx.root.join(CONFIG_DIR).join("settings.toml");

    if config_path.exists() && !force {
        bail!(
            "configuration file already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    reposcope::Settings::default()
        .save(&config_path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("cannot write {}", config_path.display()))?;

    println!("Created configuration file at: {}", config_path.display());
    println!("Edit this file to customize your settings.");
    Ok(Status::Success)
}

/// Print the effective configuration.
pub fn run_config(ctx: &Context) -> anyhow::Result<Status> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(ctx.settings.as_ref())?);
    } else {
        println!("{}", toml::to_string_pretty(ctx.settings.as_ref())?);
    }
    Ok(Status::Success)
}
