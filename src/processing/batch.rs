//! Batch dispatch over the single-file pipeline.

use tracing::{info, warn};

use crate::core::{BatchItem, BatchProgress, ImageFile, OptimizationOptions, ProgressReporter};
use crate::processing::ImageOptimizer;

impl ImageOptimizer {
    /// Optimize a batch of files sequentially.
    ///
    /// A rejected input becomes a failed [`BatchItem`] and the batch moves
    /// on; one item comes back per input, in order.
    pub async fn optimize_batch(
        &self,
        files: Vec<ImageFile>,
        options: &OptimizationOptions,
    ) -> Vec<BatchItem> {
        self.optimize_batch_with_progress(files, options, |_| {})
            .await
    }

    /// Optimize a batch, emitting one [`BatchProgress`] event per finished
    /// file. Successful events carry the file's summary as metadata.
    pub async fn optimize_batch_with_progress(
        &self,
        files: Vec<ImageFile>,
        options: &OptimizationOptions,
        on_progress: impl Fn(BatchProgress) + Send + Sync,
    ) -> Vec<BatchItem> {
        let total = files.len();
        let mut items: Vec<BatchItem> = Vec::with_capacity(total);
        let mut total_original: u64 = 0;
        let mut total_optimized: u64 = 0;

        for (index, file) in files.into_iter().enumerate() {
            let name = file.name.clone();
            match self
                .optimize_with_report(file, options, ProgressReporter::disabled())
                .await
            {
                Ok((file, summary)) => {
                    total_original += summary.original_size;
                    total_optimized += summary.optimized_size;

                    let event = BatchProgress::new(index + 1, total, &format!("optimized {name}"));
                    let event = match serde_json::to_value(&summary) {
                        Ok(metadata) => event.with_metadata(metadata),
                        Err(_) => event,
                    };
                    on_progress(event);

                    items.push(BatchItem {
                        name,
                        success: true,
                        error: None,
                        summary: Some(summary),
                        file: Some(file),
                    });
                }
                Err(e) => {
                    warn!("batch item '{}' rejected: {}", name, e);
                    on_progress(BatchProgress::new(index + 1, total, &format!("failed {name}")));
                    items.push(BatchItem {
                        name,
                        success: false,
                        error: Some(e.to_string()),
                        summary: None,
                        file: None,
                    });
                }
            }
        }

        let succeeded = items.iter().filter(|item| item.success).count();
        info!(
            "batch finished: {}/{} files optimized, {} -> {} bytes",
            succeeded, total, total_original, total_optimized
        );

        items
    }
}
