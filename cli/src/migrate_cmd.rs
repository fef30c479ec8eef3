use anyhow::{Context, Result};
use clap::Args;
use retag_core::{Credentials, DatadogClient, RunController};

use crate::render::{render_json, render_report};
use crate::{ApiArgs, EXIT_OK, EXIT_RESOURCE_FAILURES, RunArgs};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Abort on the first resource that fails instead of continuing
    #[arg(long)]
    pub strict: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<u8> {
    let (config, mode) = args.run.load()?;
    let credentials = Credentials::from_env()?;
    let client = DatadogClient::new(credentials, args.api.base_url()?, args.api.timeout())?;
    tracing::info!(
        %mode,
        base_url = %client.base_url(),
        strict = args.strict,
        "starting tag migration"
    );

    let report = RunController::new(&client, config.tags.clone(), mode)
        .strict(args.strict)
        .run(&config)
        .await
        .with_context(|| format!("{mode} run aborted"))?;

    let rendered = if args.json {
        render_json(&report)?
    } else {
        render_report(&report)
    };
    println!("{rendered}");

    if report.has_failures() {
        Ok(EXIT_RESOURCE_FAILURES)
    } else {
        Ok(EXIT_OK)
    }
}
