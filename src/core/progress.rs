//! Progress tracking for pipeline runs and batches.
//!
//! A single optimization reports a 0-100 signal through [`ProgressReporter`].
//! The reporter enforces the externally observable contract: values never
//! regress, and every run ends at exactly 100 whether the pipeline optimized,
//! skipped, or fell back at every stage.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Fixed checkpoints of the single-file pipeline.
///
/// The compression stage owns the [`RESIZED`]..[`COMPRESSED`] band; its
/// native 0-100 signal is remapped into that range with
/// [`remap_progress`](super::remap_progress).
pub mod checkpoint {
    /// Input validated, options resolved
    pub const VALIDATED: u8 = 5;
    /// Dimension probe finished (successfully or not)
    pub const PROBED: u8 = 10;
    /// Preparatory downsample finished; compression band starts here
    pub const RESIZED: u8 = 15;
    /// Compression band ends here
    pub const COMPRESSED: u8 = 65;
    /// WebP conversion attempted
    pub const CONVERTED: u8 = 90;
    /// Terminal value on every exit path
    pub const DONE: u8 = 100;
}

/// Linearly remap a native 0-100 progress value into `[lo, hi]`.
///
/// 0 maps to `lo`, 100 maps to `hi`, intermediate values round to nearest.
pub fn remap_progress(native: u8, lo: u8, hi: u8) -> u8 {
    let native = native.min(100) as u32;
    let span = (hi as u32).saturating_sub(lo as u32);
    (lo as u32 + (native * span + 50) / 100) as u8
}

/// Monotone 0-100 progress sink for a single pipeline run.
///
/// Cheap to clone and safe to hand into `spawn_blocking` closures. Stages
/// report sequentially; a value at or below the current high-water mark is
/// dropped instead of being re-emitted, so the observer only ever sees a
/// non-decreasing sequence.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    reported: AtomicU8,
    sink: Option<Box<dyn Fn(u8) + Send + Sync>>,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                reported: AtomicU8::new(0),
                sink: Some(Box::new(sink)),
            }),
        }
    }

    /// Reporter that tracks the high-water mark but notifies no one.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                reported: AtomicU8::new(0),
                sink: None,
            }),
        }
    }

    /// Report a checkpoint. Values above 100 are clamped; values that do not
    /// advance the high-water mark are dropped.
    pub fn report(&self, value: u8) {
        let value = value.min(checkpoint::DONE);
        let previous = self.inner.reported.fetch_max(value, Ordering::AcqRel);
        if value > previous {
            if let Some(sink) = &self.inner.sink {
                sink(value);
            }
        }
    }

    /// Jump to the terminal value.
    pub fn finish(&self) {
        self.report(checkpoint::DONE);
    }

    /// The highest value reported so far.
    pub fn current(&self) -> u8 {
        self.inner.reported.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("reported", &self.current())
            .field("has_sink", &self.inner.sink.is_some())
            .finish()
    }
}

/// Per-item progress event for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Number of files finished so far
    pub completed_files: usize,
    /// Total number of files in the batch
    pub total_files: usize,
    /// Batch progress percentage (0-100)
    pub progress_percentage: usize,
    /// Current status message
    pub status: String,
    /// Optional additional metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl BatchProgress {
    pub fn new(completed_files: usize, total_files: usize, status: &str) -> Self {
        let progress_percentage = if total_files > 0 {
            (completed_files * 100) / total_files
        } else {
            0
        };

        Self {
            completed_files,
            total_files,
            progress_percentage,
            status: status.to_string(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_reporter() -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::new(move |value| {
            sink.lock().unwrap().push(value);
        });
        (reporter, seen)
    }

    #[test]
    fn remap_maps_endpoints_exactly() {
        assert_eq!(remap_progress(0, 15, 65), 15);
        assert_eq!(remap_progress(100, 15, 65), 65);
        assert_eq!(remap_progress(50, 15, 65), 40);
        // Out-of-range native values clamp to the top of the band
        assert_eq!(remap_progress(250, 15, 65), 65);
    }

    #[test]
    fn reporter_drops_regressions() {
        let (reporter, seen) = recording_reporter();
        reporter.report(5);
        reporter.report(40);
        reporter.report(20);
        reporter.report(40);
        reporter.report(100);
        assert_eq!(*seen.lock().unwrap(), vec![5, 40, 100]);
        assert_eq!(reporter.current(), 100);
    }

    #[test]
    fn reporter_clamps_above_terminal() {
        let (reporter, seen) = recording_reporter();
        reporter.report(130);
        reporter.finish();
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn clones_share_the_high_water_mark() {
        let (reporter, seen) = recording_reporter();
        let clone = reporter.clone();
        clone.report(30);
        reporter.report(10);
        assert_eq!(*seen.lock().unwrap(), vec![30]);
    }

    #[test]
    fn batch_progress_computes_percentage() {
        let progress = BatchProgress::new(1, 4, "processing");
        assert_eq!(progress.progress_percentage, 25);

        let empty = BatchProgress::new(0, 0, "idle");
        assert_eq!(empty.progress_percentage, 0);
    }
}
