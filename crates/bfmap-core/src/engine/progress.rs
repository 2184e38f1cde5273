use crate::core::io::traits::{LineOutcome, RewriteStats};

/// Events emitted by the mapping driver while it drains a structure file.
#[derive(Debug, Clone)]
pub enum Progress {
    FileStart { path: String, total_bytes: u64 },
    /// One source line was handled; `bytes` includes its terminator.
    LineProcessed { bytes: u64, outcome: LineOutcome },
    FileFinish { stats: RewriteStats },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback. Without one, reporting is a no-op.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
