// Progress sinks for the stream copy

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::traits::ProgressSink;

const BAR_TEMPLATE: &str =
    "{msg} {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes} ({bytes_per_sec})";

/// Terminal rendering: a bar when the total is known, a spinner otherwise
#[derive(Default)]
pub struct TerminalProgress {
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(total: Option<u64>) -> ProgressBar {
        match total {
            Some(len) if len > 0 => {
                let bar = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar
            }
            _ => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                    bar.set_style(style);
                }
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        }
    }

    /// Whether the current bar has a known length
    pub fn is_determinate(&self) -> bool {
        self.bar
            .as_ref()
            .and_then(|b| b.length())
            .is_some_and(|len| len > 0)
    }
}

impl ProgressSink for TerminalProgress {
    fn start(&mut self, total: Option<u64>, description: &str) {
        let bar = Self::build(total);
        bar.set_message(description.to_string());
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }

    fn abandon(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}

/// Discards all updates (`--quiet`)
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: Option<u64>, _description: &str) {}

    fn advance(&mut self, _bytes: u64) {}

    fn finish(&mut self) {}

    fn abandon(&mut self) {}
}
