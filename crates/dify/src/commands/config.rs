//! Config command - inspect and write client configuration.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::{Style, style};
use dify_config::ClientConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show the user configuration file path
    Path,

    /// Write a configuration file
    Init {
        /// Server URL
        #[arg(long)]
        host: Option<String>,

        /// App API key
        #[arg(long)]
        api_key: Option<String>,

        /// End-user identifier
        #[arg(long)]
        user: Option<String>,

        /// Write ./dify.toml instead of the user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Init {
            host,
            api_key,
            user,
            local,
            force,
        } => cmd_init(
            ClientConfig {
                host,
                api_key,
                user,
                ..Default::default()
            },
            local,
            force,
        ),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let mut shown = ctx.config.clone();
    shown.api_key = shown.api_key.map(|key| redact(&key));

    if ctx.json_output {
        println!(
            "{}",
            serde_json::json!({
                "host": shown.host,
                "api_key": shown.api_key,
                "user": shown.user,
                "timeout_secs": shown.timeout_secs,
                "stream_timeout_secs": shown.stream_timeout_secs,
            })
        );
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", style("Dify Configuration").bold());
    println!("{}", dim.apply_to(format!("# from {}", ctx.config_path)));
    print!("{}", shown.to_toml()?);
    if let Err(e) = ctx.config.resolve(&ctx.config_path) {
        println!();
        println!("{} {}", Style::new().yellow().apply_to("Warning:"), e);
    }
    Ok(())
}

fn cmd_path() -> Result<()> {
    match dify_config::xdg_config_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("could not determine the config directory"),
    }
    Ok(())
}

fn cmd_init(config: ClientConfig, local: bool, force: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("dify.toml")
    } else {
        dify_config::xdg_config_path().context("could not determine the config directory")?
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    dify_config::save_config(&config, &path)?;
    let green = Style::new().green();
    println!("{} Wrote {}", green.apply_to("✓"), path.display());
    Ok(())
}

/// Keep a short prefix of a secret so users can tell keys apart.
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    if prefix.len() < key.len() {
        format!("{}…", prefix)
    } else {
        "…".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(redact("app-1234567890"), "app-12…");
        assert_eq!(redact("short"), "…");
    }
}
