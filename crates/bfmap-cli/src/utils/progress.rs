use bfmap::engine::progress::{Progress, ProgressCallback};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Drives one progress bar per mapped file.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::bar_style())
            .with_message("Waiting...");
        pb.set_draw_target(ProgressDrawTarget::stderr());

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    /// Creates a handler whose bar is drawn as part of `multi`, so that parallel runs
    /// do not overwrite each other.
    pub fn in_group(multi: &MultiProgress) -> Self {
        let handler = Self::new();
        if let Ok(mut pb) = handler.pb.lock() {
            *pb = multi.add(pb.clone());
        }
        handler
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::FileStart { path, total_bytes } => {
                    pb_guard.reset();
                    pb_guard.set_length(total_bytes);
                    pb_guard.set_position(0);
                    pb_guard.set_message(path);
                }
                Progress::LineProcessed { bytes, .. } => {
                    pb_guard.inc(bytes);
                }
                Progress::FileFinish { stats } => {
                    if let Some(length) = pb_guard.length() {
                        pb_guard.set_position(length);
                    }
                    pb_guard.finish_with_message(format!(
                        "✓ {} lines, {} rewritten, {} placeholders",
                        stats.lines, stats.rewritten, stats.placeholders
                    ));
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    /// Stops the bar in place after a failed run, leaving `reason` as its message.
    pub fn abandon(&self, reason: impl Into<String>) {
        match self.pb.lock() {
            Ok(pb) => pb.abandon_with_message(format!("✗ {}", reason.into())),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot abandon progress."),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<40} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
