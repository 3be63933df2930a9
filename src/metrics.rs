//! Ingestion and fit metrics.
//!
//! Lightweight counters for monitoring the staged fit: how much data has
//! flowed through each buffer, how many fit attempts succeeded or failed,
//! and — importantly, because the drop is otherwise silent by policy — how
//! many labels were discarded beyond the sample budget.
//!
//! Collection is gated by
//! [`collect_metrics`](crate::config::PipelineConfig::collect_metrics); when
//! disabled, every record call is a no-op and
//! [`MetricsCollector::statistics`] returns zeroes.

use serde::{Deserialize, Serialize};

/// Aggregate statistics snapshot for a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStatistics {
    /// Raw feature vectors accepted into the raw buffer or transformed
    /// directly.
    pub raw_samples_ingested: u64,

    /// Transformed feature vectors appended to the transformed buffer.
    pub transformed_samples: u64,

    /// Labels accepted into the label buffer.
    pub labels_accepted: u64,

    /// Labels silently dropped beyond the sample budget.
    pub labels_dropped: u64,

    /// Kernel approximator fit attempts (successes + failures).
    pub approximator_fit_attempts: u64,

    /// Kernel approximator fit failures.
    pub approximator_fit_failures: u64,

    /// Classifier fit attempts, including those aborted by a label count
    /// mismatch.
    pub classifier_fit_attempts: u64,

    /// Classifier fit failures (component errors and pairing mismatches).
    pub classifier_fit_failures: u64,

    /// Predictions served before the classifier was fit (placeholder
    /// random distributions).
    pub cold_start_predictions: u64,

    /// Predictions served by the fitted classifier.
    pub fitted_predictions: u64,
}

/// Collects pipeline metrics when enabled.
#[derive(Debug)]
pub struct MetricsCollector {
    enabled: bool,
    stats: PipelineStatistics,
}

impl MetricsCollector {
    /// Creates a collector; when `enabled` is false all recording is a no-op.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stats: PipelineStatistics::default(),
        }
    }

    /// Returns whether collection is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records raw samples entering the pipeline.
    pub fn record_raw_ingest(&mut self, count: usize) {
        if self.enabled {
            self.stats.raw_samples_ingested += count as u64;
        }
    }

    /// Records transformed samples appended to the transformed buffer.
    pub fn record_transformed(&mut self, count: usize) {
        if self.enabled {
            self.stats.transformed_samples += count as u64;
        }
    }

    /// Records a label batch: `accepted` buffered, `dropped` discarded.
    pub fn record_labels(&mut self, accepted: usize, dropped: usize) {
        if self.enabled {
            self.stats.labels_accepted += accepted as u64;
            self.stats.labels_dropped += dropped as u64;
        }
    }

    /// Records a kernel approximator fit attempt.
    pub fn record_approximator_fit(&mut self, success: bool) {
        if self.enabled {
            self.stats.approximator_fit_attempts += 1;
            if !success {
                self.stats.approximator_fit_failures += 1;
            }
        }
    }

    /// Records a classifier fit attempt.
    pub fn record_classifier_fit(&mut self, success: bool) {
        if self.enabled {
            self.stats.classifier_fit_attempts += 1;
            if !success {
                self.stats.classifier_fit_failures += 1;
            }
        }
    }

    /// Records a served prediction batch.
    pub fn record_prediction(&mut self, count: usize, cold_start: bool) {
        if self.enabled {
            if cold_start {
                self.stats.cold_start_predictions += count as u64;
            } else {
                self.stats.fitted_predictions += count as u64;
            }
        }
    }

    /// Returns a snapshot of the collected statistics.
    #[must_use]
    pub fn statistics(&self) -> PipelineStatistics {
        self.stats.clone()
    }
}
