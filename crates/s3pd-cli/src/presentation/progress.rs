//! Progress bar driven by transfer events.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use s3pd_core::{TransferEvent, TransferObserver};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                            {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

/// Draws one byte-level progress bar for a transfer.
///
/// The bar is created on `Started`, so nothing is drawn when the transfer
/// fails before the destination is ready.
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
    visible: bool,
}

impl ProgressReporter {
    /// Reporter that draws to stderr.
    pub const fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            visible: true,
        }
    }

    /// Reporter that tracks progress without drawing.
    pub const fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            visible: false,
        }
    }

    /// Bytes currently counted as downloaded.
    pub fn position(&self) -> u64 {
        self.bar
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(ProgressBar::position))
            .unwrap_or(0)
    }

    fn create_bar(&self, total: u64) -> ProgressBar {
        if !self.visible {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        bar
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferObserver for ProgressReporter {
    fn emit(&self, event: TransferEvent) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };

        match event {
            TransferEvent::Started {
                locator,
                total_size,
                chunks,
                ..
            } => {
                let bar = self.create_bar(total_size);
                bar.set_message(format!("{locator} in {chunks} chunks"));
                *guard = Some(bar);
            }
            TransferEvent::ChunkProgress { bytes, .. } => {
                if let Some(bar) = guard.as_ref() {
                    bar.inc(bytes);
                }
            }
            TransferEvent::ChunkRetrying {
                index,
                attempt,
                discarded_bytes,
                ..
            } => {
                if let Some(bar) = guard.as_ref() {
                    bar.set_position(bar.position().saturating_sub(discarded_bytes));
                    bar.set_message(format!("retrying chunk {index} (attempt {})", attempt + 1));
                }
            }
            TransferEvent::ChunkFailed { index, .. } => {
                if let Some(bar) = guard.as_ref() {
                    bar.set_message(format!("chunk {index} failed"));
                }
            }
            TransferEvent::Finished { failed_chunks, .. } => {
                if let Some(bar) = guard.as_ref() {
                    if failed_chunks == 0 {
                        bar.finish_with_message("done");
                    } else {
                        bar.abandon_with_message(format!("{failed_chunks} chunks failed"));
                    }
                }
            }
            TransferEvent::ChunkCompleted { .. } => {}
        }
    }
}
