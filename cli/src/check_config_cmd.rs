use anyhow::Result;
use clap::Args;

use crate::render::render_plan;
use crate::{ApiArgs, EXIT_OK, RunArgs};

#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Loads and validates everything a migrate run would, short of credentials
/// and network access.
pub fn run_check_config(args: CheckConfigArgs) -> Result<u8> {
    let (config, mode) = args.run.load()?;
    let base_url = args.api.base_url()?;
    println!("{}", render_plan(&config, mode, &base_url));
    Ok(EXIT_OK)
}
