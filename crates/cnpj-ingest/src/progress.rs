//! Load progress reporting
//!
//! The loader reports `(processed, total)` after every appended batch.
//! How that is shown is up to the observer.

use cnpj_common::text::{format_count, percent};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use tracing::info;

/// Progress of one file load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate<'a> {
    /// Destination table
    pub label: &'a str,
    pub processed: u64,
    pub total: u64,
}

impl ProgressUpdate<'_> {
    pub fn percent(&self) -> f64 {
        percent(self.processed, self.total)
    }
}

/// Receives loader progress
pub trait ProgressObserver: Send + Sync {
    /// A file with `total` records is about to be loaded
    fn on_start(&self, _label: &str, _total: u64) {}

    fn on_progress(&self, update: &ProgressUpdate<'_>);

    /// The file load ended, successfully or not
    fn on_finish(&self, _label: &str) {}
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _update: &ProgressUpdate<'_>) {}
}

/// Emits one `info!` event per batch; suits JSON logs and non-interactive runs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_start(&self, label: &str, total: u64) {
        info!(table = label, total, "Loading file");
    }

    fn on_progress(&self, update: &ProgressUpdate<'_>) {
        info!(
            table = update.label,
            processed = update.processed,
            total = update.total,
            percent = format!("{:.2}", update.percent()),
            "Load progress"
        );
    }
}

/// Single rewritable status line per file
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        // A poisoned lock only means a previous update panicked mid-draw
        let mut guard = match self.bar.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }
}

impl ProgressObserver for BarProgress {
    fn on_start(&self, label: &str, total: u64) {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{prefix:<18} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_prefix(label.to_string());
        pb.set_message(format!("{:6.2}%  0/{}", percent(0, total), format_count(total)));
        self.with_bar(|bar| *bar = Some(pb));
    }

    fn on_progress(&self, update: &ProgressUpdate<'_>) {
        let message = format!(
            "{:6.2}%  {}/{}",
            update.percent(),
            format_count(update.processed),
            format_count(update.total)
        );
        self.with_bar(|bar| {
            if let Some(pb) = bar {
                pb.set_position(update.processed);
                pb.set_message(message);
            }
        });
    }

    fn on_finish(&self, _label: &str) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.take() {
                pb.finish();
            }
        });
    }
}
