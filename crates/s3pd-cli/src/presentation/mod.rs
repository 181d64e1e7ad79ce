//! Terminal output: progress bar and final report.

pub mod progress;
pub mod summary;

pub use progress::ProgressReporter;
pub use summary::{failure_json, format_summary, success_json};
