//! Spinner display for turn progress

use colored::*;
use conduit_core::{DisplayHandler, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Renders orchestrator events as a terminal spinner
pub struct SpinnerDisplay {
    bar: ProgressBar,
    verbose: bool,
}

impl SpinnerDisplay {
    pub fn new(verbose: bool) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar, verbose }
    }

    fn start(&self, message: String) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_message(message);
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn stop(&self) {
        self.bar.finish_and_clear();
        self.bar.reset();
    }
}

impl DisplayHandler for SpinnerDisplay {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { model, .. } => {
                self.start(format!("Asking {}...", model));
            }
            ProgressEvent::CacheHit { .. } => {
                self.stop();
                if self.verbose {
                    eprintln!("{}", "(answered from cache)".dimmed());
                }
            }
            ProgressEvent::Retrying {
                attempt,
                delay,
                reason,
                ..
            } => {
                self.bar.set_message(format!(
                    "Retrying in {:.1}s (attempt {}): {}",
                    delay.as_secs_f64(),
                    attempt,
                    reason
                ));
            }
            ProgressEvent::Completed {
                duration_ms,
                input_tokens,
                output_tokens,
                ..
            } => {
                self.stop();
                if self.verbose {
                    eprintln!(
                        "{}",
                        format!(
                            "({} ms, {} in / {} out tokens)",
                            duration_ms, input_tokens, output_tokens
                        )
                        .dimmed()
                    );
                }
            }
            ProgressEvent::Failed { .. } => self.stop(),
        }
    }
}
