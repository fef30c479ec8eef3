use std::process::ExitCode;

use clap::Parser;
use retag_cli::{Cli, EXIT_FATAL};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so env-backed flags see values from .env.
    match dotenvy::dotenv() {
        Err(err) if !err.not_found() => eprintln!("warning: failed to load .env: {err}"),
        _ => {}
    }

    let cli = Cli::parse();
    init_logging();

    match cli.run().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_logging() {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
