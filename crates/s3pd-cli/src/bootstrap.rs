//! Composition root for the CLI.
//!
//! Wires the S3 adapter, the download coordinator and the progress reporter
//! from parsed arguments. Handlers receive a ready [`CliContext`] and never
//! construct infrastructure themselves.

use std::sync::Arc;

use anyhow::anyhow;
use s3pd_core::{NoopObserver, ObjectStorePort, TransferObserver};
use s3pd_download::DownloadCoordinator;
use s3pd_s3::S3ObjectStore;
use tracing_subscriber::EnvFilter;

use crate::parser::Cli;
use crate::presentation::ProgressReporter;

/// How the final result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One human-readable line.
    Text,
    /// A JSON document on stdout.
    Json,
}

/// Dependencies a command handler needs.
pub struct CliContext {
    /// Configured download engine.
    pub coordinator: DownloadCoordinator,
    /// Result formatting.
    pub output: OutputMode,
}

impl CliContext {
    /// Assemble a context around an existing store.
    pub fn with_store(
        cli: &Cli,
        store: Arc<dyn ObjectStorePort>,
        observer: Arc<dyn TransferObserver>,
    ) -> Self {
        let coordinator =
            DownloadCoordinator::new(store, cli.transfer_config()).with_observer(observer);
        let output = if cli.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        Self {
            coordinator,
            output,
        }
    }
}

/// Build the production context: real S3 client plus progress bar.
pub async fn bootstrap(cli: &Cli) -> CliContext {
    let store = S3ObjectStore::connect(&cli.s3_config()).await;
    let observer: Arc<dyn TransferObserver> = if cli.show_progress() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(NoopObserver)
    };
    CliContext::with_store(cli, Arc::new(store), observer)
}

/// Log filter used when `RUST_LOG` is unset.
pub const fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,s3pd=debug"
    } else {
        "warn,s3pd=info"
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `verbose`. Third-party crates (the AWS
/// SDK in particular) stay at `warn` unless `RUST_LOG` says otherwise.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}
