//! Progress tracking for the parallel evaluation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// A progress update event.
#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// Evaluation has started.
    Started {
        /// Rendering of the expression being computed.
        label: String,
        /// Number of tiles that will be evaluated.
        total_tiles: usize,
    },
    /// One tile finished.
    TileCompleted {
        /// Tiles finished so far.
        completed: usize,
        /// Total tile count.
        total: usize,
    },
    /// Evaluation finished.
    Completed {
        /// Wall-clock duration in milliseconds.
        total_duration_ms: u64,
        /// Tiles evaluated.
        tiles_processed: usize,
    },
    /// Evaluation was cancelled.
    Cancelled,
    /// An error occurred inside a worker.
    Error {
        /// The error's display string.
        message: String,
    },
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Tracks tile completion and carries the cooperative cancellation flag.
pub struct ProgressTracker {
    total_tiles: usize,
    completed: AtomicU64,
    cancelled: AtomicBool,
    start_time: Option<Instant>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Create a tracker for the given tile count.
    pub fn new(total_tiles: usize) -> Self {
        Self {
            total_tiles,
            completed: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            start_time: None,
            callback: None,
        }
    }

    /// Attach a callback for progress updates.
    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Start tracking; `label` names the computation.
    pub fn start(&mut self, label: &str) {
        self.start_time = Some(Instant::now());
        self.send(ProgressUpdate::Started {
            label: label.to_string(),
            total_tiles: self.total_tiles,
        });
    }

    /// Report one finished tile.
    pub fn tile_completed(&self) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) as usize + 1;
        self.send(ProgressUpdate::TileCompleted {
            completed,
            total: self.total_tiles,
        });
    }

    /// Whether workers should stop picking up tiles.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation; in-flight tiles run to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.send(ProgressUpdate::Cancelled);
    }

    /// Report a worker error.
    pub fn report_error(&self, message: String) {
        self.send(ProgressUpdate::Error { message });
    }

    /// Report completion.
    pub fn complete(&self) {
        let duration = self
            .start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.send(ProgressUpdate::Completed {
            total_duration_ms: duration,
            tiles_processed: self.completed.load(Ordering::Relaxed) as usize,
        });
    }

    /// Fraction of tiles finished, as a percentage.
    pub fn percent(&self) -> f32 {
        if self.total_tiles == 0 {
            return 100.0;
        }
        let completed = self.completed.load(Ordering::Relaxed) as f32;
        completed / self.total_tiles as f32 * 100.0
    }

    fn send(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(update);
        }
    }
}
