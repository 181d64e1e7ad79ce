//! Library surface of the `s3pd` command-line tool.
//!
//! The binary is a thin shell around these modules:
//!
//! - `parser` - clap argument definition
//! - `bootstrap` - composition root and logging setup
//! - `handlers` - command execution
//! - `presentation` - progress bar and final report
//! - `error` - `CliError` and exit codes
//! - `utils` - size parsing

#![deny(unused_crate_dependencies)]

// Used by the binary target only
use dotenvy as _;
use tokio as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod utils;

pub use bootstrap::{CliContext, OutputMode, bootstrap, init_logging};
pub use error::CliError;
pub use parser::Cli;
