//! Pipeline stage state machine.
//!
//! The staged fit progresses through three durable stages, advancing on each
//! fit milestone and never regressing:
//!
//! ```text
//! COLLECTING ──(approximator fit)──▶ ACCUMULATING ──(classifier fit)──▶ FITTED
//! ```
//!
//! - **Collecting**: raw feature vectors are buffered until enough arrive to
//!   fit the kernel approximator.
//! - **Accumulating**: incoming batches are transformed immediately and the
//!   results buffered until enough arrive to fit the classifier.
//! - **Fitted**: both components are frozen; the pipeline is a pure function.
//!
//! The bulk transform of the just-consumed raw buffer happens inside the
//! Collecting → Accumulating transition and is never observable between
//! calls, so it is not a stage of its own.
//!
//! Modelling the progression as an enum rather than a pair of booleans makes
//! the "each buffer is cleared exactly once" invariant mechanically
//! checkable: a transition drains its source buffer, and there is no path
//! back into a stage that could refill it.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// The durable stages of a staged fitting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Buffering raw feature vectors; neither component is fit.
    Collecting,

    /// Kernel approximator fit; buffering transformed samples for the
    /// classifier.
    Accumulating,

    /// Both components fit; the pipeline is frozen.
    Fitted,
}

impl Stage {
    /// Returns a human-readable name for the stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Collecting => "collecting",
            Stage::Accumulating => "accumulating",
            Stage::Fitted => "fitted",
        }
    }

    /// Returns whether the kernel approximator has been fit in this stage.
    #[must_use]
    pub fn approximator_fitted(&self) -> bool {
        matches!(self, Stage::Accumulating | Stage::Fitted)
    }

    /// Returns whether the classifier has been fit in this stage.
    #[must_use]
    pub fn classifier_fitted(&self) -> bool {
        matches!(self, Stage::Fitted)
    }

    /// Returns whether raw batches are buffered untransformed in this stage.
    #[must_use]
    pub fn buffers_raw(&self) -> bool {
        matches!(self, Stage::Collecting)
    }

    /// Reconstructs the stage from the persisted boolean pair.
    ///
    /// The persisted state shape is two booleans; a classifier can only have
    /// been fit after the approximator, so the `(false, true)` combination
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StateEncoding`] for the impossible flag
    /// combination.
    pub fn from_flags(approximator_fitted: bool, classifier_fitted: bool) -> PipelineResult<Self> {
        match (approximator_fitted, classifier_fitted) {
            (false, false) => Ok(Stage::Collecting),
            (true, false) => Ok(Stage::Accumulating),
            (true, true) => Ok(Stage::Fitted),
            (false, true) => Err(PipelineError::StateEncoding {
                detail: "classifier fitted without kernel approximator fitted".to_string(),
            }),
        }
    }
}

/// Validates that a stage transition is legal.
///
/// The staged fit is strictly one-way: each stage may hold or advance to its
/// immediate successor, and nothing ever moves backwards. A fit milestone
/// drains its source buffer, so a regression would imply refilling a buffer
/// that was cleared exactly once.
///
/// # Errors
///
/// Returns [`PipelineError::StateEncoding`] if the transition is not allowed.
pub fn validate_transition(from: Stage, to: Stage) -> PipelineResult<()> {
    let valid = match (from, to) {
        // Holding the current stage is always fine
        (a, b) if a == b => true,

        // Fit milestones advance by exactly one stage
        (Stage::Collecting, Stage::Accumulating) => true,
        (Stage::Accumulating, Stage::Fitted) => true,

        // No skips, no regressions
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(PipelineError::StateEncoding {
            detail: format!(
                "stage transition from {} to {} is not allowed",
                from.name(),
                to.name()
            ),
        })
    }
}
