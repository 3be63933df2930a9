//! Error types for the staged fitting pipeline.
//!
//! The taxonomy distinguishes errors that are fatal to the pipeline from
//! errors that are fatal only to the current fit attempt:
//!
//! - **Configuration errors** (`DegenerateBudget`, `Config`) are raised at
//!   construction time. A pipeline with a zero sample budget would collect
//!   forever without making progress, so it is rejected before any data is
//!   ingested rather than discovered later as a stall.
//! - **Fit errors** (`Fit`) surface a component failure verbatim. The
//!   pipeline leaves the source buffer intact, so the next call that crosses
//!   the threshold retries the fit.
//! - **Pairing errors** (`LabelCountMismatch`) abort the current classifier
//!   fit attempt without clearing any buffer; the caller can supply the
//!   missing labels (or features) and the fit retries on a later call.
//!
//! The only condition the pipeline handles silently is label overflow beyond
//! the sample budget, which is a documented drop policy, not an error.

use thiserror::Error;

/// Errors raised by the staged fitting pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configured budgets cannot ever trigger a fit.
    ///
    /// Raised at construction time when the component budget, sample budget,
    /// or class count is zero. A degenerate budget would leave the pipeline
    /// in perpetual collection with no progress.
    #[error("degenerate budget configuration: {detail}")]
    DegenerateBudget {
        /// Which budget is degenerate and why.
        detail: String,
    },

    /// An external component's fit call failed.
    ///
    /// Surfaced verbatim from the kernel approximator or classifier. Fatal
    /// to this fit attempt only: the source buffer is left intact and the
    /// next threshold crossing retries.
    #[error("{component} fit failed: {reason}")]
    Fit {
        /// The component whose fit failed (`"kernel approximator"` or
        /// `"classifier"`).
        component: &'static str,
        /// Failure description from the component.
        reason: String,
    },

    /// Transformed-feature and label counts differ at classifier-fit time.
    ///
    /// Fatal to the current fit attempt, non-fatal to the pipeline. Buffers
    /// are not cleared; a later call with a consistent pairing retries.
    #[error("label count mismatch at classifier fit: {features} transformed features vs {labels} labels")]
    LabelCountMismatch {
        /// Number of buffered transformed feature vectors.
        features: usize,
        /// Number of buffered labels.
        labels: usize,
    },

    /// Component state export or import failed.
    #[error("state encoding error: {detail}")]
    StateEncoding {
        /// Description of the encoding failure.
        detail: String,
    },

    /// Reading or writing a persisted state file failed.
    #[error("state i/o error: {detail}")]
    StateIo {
        /// Description of the I/O failure.
        detail: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {detail}")]
    Config {
        /// Description of the configuration issue.
        detail: String,
    },
}

impl PipelineError {
    /// Returns whether the pipeline can continue ingesting after this error.
    ///
    /// Fit and pairing failures leave the buffers intact and are retried on
    /// a later threshold crossing; everything else is fatal to the pipeline
    /// or to the operation that raised it.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            PipelineError::Fit { .. } | PipelineError::LabelCountMismatch { .. }
        )
    }
}

/// Result type used throughout the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(PipelineError::Fit {
            component: "classifier",
            reason: "singular".to_string()
        }
        .is_retriable());
        assert!(PipelineError::LabelCountMismatch {
            features: 8,
            labels: 5
        }
        .is_retriable());
        assert!(!PipelineError::DegenerateBudget {
            detail: "zero sample budget".to_string()
        }
        .is_retriable());
    }

    #[test]
    fn test_mismatch_message_carries_counts() {
        let err = PipelineError::LabelCountMismatch {
            features: 8,
            labels: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('8'));
        assert!(msg.contains('5'));
    }
}
