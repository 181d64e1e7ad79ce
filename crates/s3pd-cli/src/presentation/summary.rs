//! Final transfer report, as text or JSON.

use std::time::Duration;

use indicatif::{HumanBytes, HumanDuration};
use s3pd_core::{TransferError, TransferSummary};
use serde_json::{Value, json};

/// One-line human summary of a successful transfer.
pub fn format_summary(summary: &TransferSummary) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rate = summary.throughput_bps() as u64;
    format!(
        "Downloaded {} -> {} ({} in {}, {}/s, {} chunks, {} retries)",
        summary.locator,
        summary.path.display(),
        HumanBytes(summary.bytes_written),
        HumanDuration(Duration::from_millis(summary.elapsed_ms)),
        HumanBytes(rate),
        summary.chunks,
        summary.retries,
    )
}

/// JSON report for a successful transfer.
pub fn success_json(summary: &TransferSummary) -> Value {
    json!({
        "status": "ok",
        "summary": summary,
    })
}

/// JSON report for a failed transfer.
pub fn failure_json(err: &TransferError) -> Value {
    json!({
        "status": "failed",
        "message": err.user_message(),
        "failed_chunks": err.failed_indices(),
        "error": err,
    })
}
