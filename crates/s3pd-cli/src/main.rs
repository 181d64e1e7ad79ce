//! `s3pd` - parallel ranged download of one S3 object.

use std::process::ExitCode;

use clap::Parser;
use s3pd_cli::{Cli, bootstrap, handlers, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so env-backed flags pick it up
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Warning: {e:#}");
    }

    let ctx = bootstrap(&cli).await;
    match handlers::download::execute(&ctx, &cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
