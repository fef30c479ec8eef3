//! `retag` command-line front end.
//!
//! ## Commands
//!
//! - `retag migrate` - walk the selected resources and report or commit tag changes
//! - `retag check-config` - validate the run config and print the plan, offline
//!
//! ## Exit Codes
//! - 0: Success
//! - 1: Fatal error (configuration, listing failure, strict-mode abort)
//! - 2: Invalid arguments (reported by clap)
//! - 3: Run finished but at least one resource failed

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use retag_core::api::{DEFAULT_SITE, EU_SITE, parse_base_url, site_base_url};
use retag_core::config::DEFAULT_CONFIG_FILE;
use retag_core::{RunConfig, RunMode};
use url::Url;

pub mod check_config_cmd;
pub mod migrate_cmd;
pub mod render;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FATAL: u8 = 1;
pub const EXIT_RESOURCE_FAILURES: u8 = 3;

/// Migrate Datadog tags across dashboards, monitors and synthetic tests
#[derive(Debug, Parser)]
#[command(name = "retag", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Runs the selected command and returns the process exit code.
    pub async fn run(self) -> Result<u8> {
        match self.command {
            Command::Migrate(args) => migrate_cmd::run_migrate(args).await,
            Command::CheckConfig(args) => check_config_cmd::run_check_config(args),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite tags in every selected resource
    ///
    /// In report mode nothing is written; the output lists what would change.
    Migrate(migrate_cmd::MigrateArgs),

    /// Validate the run config and print the plan without calling the API
    CheckConfig(check_config_cmd::CheckConfigArgs),
}

/// Run config file and mode.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Run config with the tag mapping and per-family id lists
    #[arg(long, env = "RETAG_CONFIG", value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// report (dry run) or commit; test/prod are accepted as aliases
    #[arg(long, env = "RUN_MODE", default_value = "report")]
    pub mode: String,
}

impl RunArgs {
    pub fn load(&self) -> Result<(RunConfig, RunMode)> {
        let mode = self.mode.parse::<RunMode>()?;
        let config = RunConfig::load(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        Ok((config, mode))
    }
}

/// Where and how to reach the API.
#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Datadog site, e.g. datadoghq.com or datadoghq.eu
    #[arg(long, env = "DD_SITE")]
    pub site: Option<String>,

    /// Full API base URL; overrides --site
    #[arg(long, env = "DD_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Use the EU site when no --site is given
    #[arg(
        long,
        env = "EU_CUSTOMER",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub eu: bool,

    /// Per-request timeout
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ApiArgs {
    pub fn base_url(&self) -> Result<Url> {
        let url = match (&self.api_url, &self.site) {
            (Some(url), _) => parse_base_url(url)?,
            (None, Some(site)) => site_base_url(site)?,
            (None, None) if self.eu => site_base_url(EU_SITE)?,
            (None, None) => site_base_url(DEFAULT_SITE)?,
        };
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
