//! Command-line argument definition.

use std::path::PathBuf;

use clap::Parser;

use s3pd_core::{DEFAULT_CONCURRENCY, TransferConfig};
use s3pd_s3::S3ClientConfig;

use crate::utils::parse_size;

/// Download one S3 object by fetching byte ranges in parallel.
///
/// The object is split into fixed-size chunks that are fetched concurrently
/// and written straight into their place in a pre-sized local file.
#[derive(Debug, Parser)]
#[command(name = "s3pd")]
#[command(version)]
#[command(about = "Parallel ranged download of a single S3 object")]
pub struct Cli {
    /// Object to download, as s3://bucket/key
    #[arg(value_name = "S3_URI")]
    pub s3_uri: String,

    /// Destination file, or an existing directory to place the object in
    #[arg(value_name = "LOCAL_PATH")]
    pub local_path: PathBuf,

    /// Bytes per ranged request (B, K/KiB, M/MiB, G/GiB)
    #[arg(
        short = 'c',
        long = "chunk-size",
        env = "S3PD_CHUNK_SIZE",
        default_value = "5MiB",
        value_parser = parse_size
    )]
    pub chunk_size: u64,

    /// Maximum number of chunks downloading at once
    #[arg(
        short = 'j',
        long = "concurrency",
        env = "S3PD_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY
    )]
    pub concurrency: usize,

    /// Extra attempts per chunk after a transient failure
    #[arg(long = "retries", env = "S3PD_RETRIES", default_value_t = 0)]
    pub retries: u32,

    /// Stop all outstanding chunks as soon as one fails
    #[arg(long = "fail-fast", env = "S3PD_FAIL_FAST")]
    pub fail_fast: bool,

    /// AWS region of the bucket
    #[arg(long = "region", env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores
    #[arg(long = "endpoint-url", env = "S3PD_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing (needed by most S3-compatible stores)
    #[arg(long = "path-style")]
    pub path_style: bool,

    /// Named AWS profile
    #[arg(long = "profile", env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Print the final result as JSON on stdout
    #[arg(long = "json")]
    pub json: bool,

    /// Do not show a progress bar
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Transfer settings selected on the command line.
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig::new(self.chunk_size)
            .with_concurrency(self.concurrency)
            .with_max_retries(self.retries)
            .with_fail_fast(self.fail_fast)
    }

    /// S3 client overrides selected on the command line.
    pub fn s3_config(&self) -> S3ClientConfig {
        let mut config = S3ClientConfig::new().with_force_path_style(self.path_style);
        if let Some(region) = &self.region {
            config = config.with_region(region);
        }
        if let Some(url) = &self.endpoint_url {
            config = config.with_endpoint_url(url);
        }
        if let Some(profile) = &self.profile {
            config = config.with_profile(profile);
        }
        config
    }

    /// Whether to draw a progress bar.
    pub const fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}
