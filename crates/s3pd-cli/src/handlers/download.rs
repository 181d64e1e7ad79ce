//! The download command.

use std::io::Write;

use s3pd_core::TransferResult;

use crate::bootstrap::{CliContext, OutputMode};
use crate::error::CliError;
use crate::parser::Cli;
use crate::presentation::{failure_json, format_summary, success_json};

/// Run the transfer described by `cli` and print its result to stdout.
pub async fn execute(ctx: &CliContext, cli: &Cli) -> Result<(), CliError> {
    let result = ctx.coordinator.run_uri(&cli.s3_uri, &cli.local_path).await;
    let mut stdout = std::io::stdout().lock();
    report(&result, ctx.output, &mut stdout)
}

/// Print `result` in the requested format and convert failures.
///
/// In text mode only success is printed here; failures are reported by the
/// caller on stderr.
pub fn report(
    result: &TransferResult,
    output: OutputMode,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let printed = match (output, result) {
        (OutputMode::Json, Ok(summary)) => writeln!(out, "{}", success_json(summary)),
        (OutputMode::Json, Err(err)) => writeln!(out, "{}", failure_json(err)),
        (OutputMode::Text, Ok(summary)) => writeln!(out, "{}", format_summary(summary)),
        (OutputMode::Text, Err(_)) => Ok(()),
    };
    if let Err(e) = printed {
        tracing::warn!(error = %e, "Failed to print transfer result");
    }

    match result {
        Ok(_) => Ok(()),
        Err(err) => Err(CliError::from(err.clone())),
    }
}
