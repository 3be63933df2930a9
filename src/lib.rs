//! # staged-fit-pipeline-rs
//!
//! A trainable classification pipeline that wraps a batch-mode classifier
//! and a fixed-size kernel-feature approximator so that both can be fit from
//! a *stream* of mini-batches rather than from one materialized dataset.
//!
//! ## Overview
//!
//! Classical batch-mode components want the whole training set at once. This
//! crate buffers just enough of the stream to satisfy each component, fits
//! each exactly once at its threshold, and releases the buffered data the
//! moment it has been consumed. A training loop can feed batches one at a
//! time without ever materializing the full dataset, while the components
//! underneath keep their one-shot batch-fit semantics.
//!
//! ## Stages
//!
//! The pipeline advances through three one-way stages:
//!
//! ```text
//!              ingest_raw                 ingest_raw / ingest_label
//!                  │                                │
//!                  ▼                                ▼
//!           ┌────────────┐  approximator    ┌──────────────┐  classifier   ┌────────┐
//!           │ COLLECTING │──────fit────────▶│ ACCUMULATING │──────fit─────▶│ FITTED │
//!           └────────────┘  (raw buffer     └──────────────┘ (transformed  └────────┘
//!                            drained)                         + label
//!                                                             buffers drained)
//! ```
//!
//! 1. **Collecting** — raw feature vectors are buffered. When the buffer
//!    reaches the effective component budget, the kernel approximator is fit
//!    on the *entire* buffer (overshoot included), the buffer is transformed
//!    in bulk into the transformed buffer, and the raw buffer is cleared
//!    forever.
//! 2. **Accumulating** — each incoming batch is transformed immediately; no
//!    raw data is retained. When the transformed buffer reaches the sample
//!    budget, the classifier is fit from the transformed/label pair and both
//!    buffers are cleared forever.
//! 3. **Fitted** — the pipeline is a pure frozen function; further ingestion
//!    is a no-op.
//!
//! Labels arrive on their own timeline via [`StagedFitPipeline::ingest_label`]
//! and are paired positionally with the transformed features at fit time.
//!
//! ## Cold start
//!
//! [`StagedFitPipeline::predict`] is callable at any time. Before the
//! classifier is fit it returns one uniformly random score vector of
//! `num_classes` entries per input — never an error, never a zero vector —
//! so a surrounding training loop that expects a fixed output contract never
//! breaks.
//!
//! ## Quick start
//!
//! ```no_run
//! use staged_fit_pipeline_rs::config::PipelineConfig;
//! use staged_fit_pipeline_rs::models::{NearestCentroidClassifier, RbfLandmarkApproximator};
//! use staged_fit_pipeline_rs::StagedFitPipeline;
//!
//! let config = PipelineConfig::builder()
//!     .component_budget(100)
//!     .sample_budget(1000)
//!     .num_classes(10)
//!     .build();
//!
//! let kernel = RbfLandmarkApproximator::new(100, 0.5);
//! let classifier = NearestCentroidClassifier::new(10);
//! let mut pipeline = StagedFitPipeline::new(kernel, classifier, config)?;
//!
//! // Training loop
//! // for (features, labels) in batches {
//! //     pipeline.ingest_raw(features)?;
//! //     pipeline.ingest_label(labels)?;
//! //     let scores = pipeline.predict(&eval_batch)?;
//! // }
//! # Ok::<(), staged_fit_pipeline_rs::error::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Budgets, class count, and construction-time validation
//! - [`error`] - Error taxonomy with retriability
//! - [`stage`] - One-way stage state machine
//! - [`metrics`] - Ingestion/fit counters, including the dropped-label count
//! - [`state`] - Persisted state shape and file round-trip
//! - [`models`] - Reference kernel approximator and classifier
//!
//! ## Concurrency
//!
//! Single-threaded and synchronous: every operation runs to completion on
//! the caller's thread, and all mutation goes through `&mut self`. There is
//! no internal locking; callers that share a pipeline across threads must
//! serialize access themselves.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
// Allow precision loss casts - acceptable in ML numerical code
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]

// Core modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod stage;
pub mod state;

// Reference component implementations
pub mod models;

// Internal buffer bookkeeping
mod buffers;

// Re-exports for convenient access
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use metrics::PipelineStatistics;
pub use stage::Stage;
pub use state::PipelineState;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffers::{RawAccumulator, TransformedAccumulator};
use crate::metrics::MetricsCollector;

/// A raw feature vector: a flattened, fixed-length sequence of reals.
pub type FeatureVector = Vec<f32>;

/// A feature vector mapped into the kernel-approximated space.
pub type TransformedVector = Vec<f32>;

/// A class index associated with one feature vector.
pub type Label = usize;

/// Per-class scores for one input vector, of length `num_classes`.
pub type LabelDistribution = Vec<f32>;

/// A fixed-size kernel-feature approximator.
///
/// Fit exactly once from a landmark subset of the raw stream, thereafter a
/// pure mapping from raw feature space into the transformed space. The
/// pipeline treats the implementation as an opaque black box; any concrete
/// kernel approximation can be substituted without touching pipeline logic.
///
/// # State
///
/// Implementations own their internal landmark state and expose it only as
/// an opaque blob through [`export_state`](KernelApproximator::export_state)
/// / [`import_state`](KernelApproximator::import_state), which the pipeline
/// embeds verbatim in its persisted state.
pub trait KernelApproximator: Send {
    /// Fits the approximator from the given landmark set.
    ///
    /// Called exactly once per pipeline lifetime, with the entire raw buffer
    /// at the moment the component budget was crossed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fit`] on malformed input. The pipeline keeps
    /// its raw buffer intact on failure so a later threshold crossing can
    /// retry (implementations should be stateless on failure for the retry
    /// to be meaningful).
    fn fit(&mut self, landmarks: &[FeatureVector]) -> PipelineResult<()>;

    /// Maps a batch of raw feature vectors into the transformed space.
    ///
    /// Only called after a successful [`fit`](KernelApproximator::fit).
    fn transform(&self, batch: &[FeatureVector]) -> PipelineResult<Vec<TransformedVector>>;

    /// Exports the full internal state as an opaque blob.
    fn export_state(&self) -> PipelineResult<serde_json::Value>;

    /// Restores the internal state from a blob produced by
    /// [`export_state`](KernelApproximator::export_state).
    fn import_state(&mut self, state: serde_json::Value) -> PipelineResult<()>;
}

/// A batch-mode classifier over transformed feature vectors.
///
/// Fit exactly once from the full transformed buffer, thereafter a pure
/// mapping from transformed vectors to per-class score distributions.
pub trait Classifier: Send {
    /// Fits the classifier from positionally paired features and labels.
    ///
    /// The pipeline guarantees `features.len() == labels.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fit`] on malformed input. The pipeline keeps
    /// both buffers intact on failure so a later call can retry.
    fn fit(&mut self, features: &[TransformedVector], labels: &[Label]) -> PipelineResult<()>;

    /// Predicts one score distribution per input vector.
    ///
    /// Only called after a successful [`fit`](Classifier::fit).
    fn predict(&self, features: &[TransformedVector]) -> PipelineResult<Vec<LabelDistribution>>;

    /// Exports the full internal state as an opaque blob.
    fn export_state(&self) -> PipelineResult<serde_json::Value>;

    /// Restores the internal state from a blob produced by
    /// [`export_state`](Classifier::export_state).
    fn import_state(&mut self, state: serde_json::Value) -> PipelineResult<()>;
}

/// Staged, memory-bounded fitting pipeline over a kernel approximator and a
/// batch-mode classifier.
///
/// # Type Parameters
///
/// - `K`: the kernel approximator implementation
/// - `C`: the classifier implementation
///
/// # Ownership
///
/// The pipeline exclusively owns both components and all buffers. Callers
/// transfer feature and label data by value on each ingestion call.
///
/// # Example
///
/// ```no_run
/// use staged_fit_pipeline_rs::config::PipelineConfig;
/// use staged_fit_pipeline_rs::models::{NearestCentroidClassifier, RbfLandmarkApproximator};
/// use staged_fit_pipeline_rs::{Stage, StagedFitPipeline};
///
/// let config = PipelineConfig::builder()
///     .component_budget(4)
///     .sample_budget(8)
///     .num_classes(2)
///     .build();
/// let mut pipeline = StagedFitPipeline::new(
///     RbfLandmarkApproximator::new(4, 0.5),
///     NearestCentroidClassifier::new(2),
///     config,
/// )?;
/// assert_eq!(pipeline.stage(), Stage::Collecting);
/// # Ok::<(), staged_fit_pipeline_rs::error::PipelineError>(())
/// ```
pub struct StagedFitPipeline<K, C> {
    /// The kernel approximator; unfit until the component budget is crossed,
    /// frozen forever after.
    kernel: K,

    /// The classifier; unfit until the sample budget is crossed, frozen
    /// forever after.
    classifier: C,

    /// Pipeline configuration.
    config: PipelineConfig,

    /// Current stage of the one-way state machine.
    stage: Stage,

    /// Raw feature buffer; drained exactly once, on approximator fit.
    raw: RawAccumulator,

    /// Transformed feature + label buffers; drained exactly once, on
    /// classifier fit.
    transformed: TransformedAccumulator,

    /// Ingestion/fit counters.
    metrics: MetricsCollector,

    /// Randomness source for cold-start predictions. Injectable for
    /// deterministic tests; never part of the persisted state.
    rng: StdRng,

    /// Training-mode flag; ingestion is a no-op in evaluation mode.
    training: bool,
}

impl<K, C> StagedFitPipeline<K, C>
where
    K: KernelApproximator,
    C: Classifier,
{
    /// Creates a new pipeline in the Collecting stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateBudget`] if any budget or the
    /// class count is zero.
    pub fn new(kernel: K, classifier: C, config: PipelineConfig) -> PipelineResult<Self> {
        Self::with_rng(kernel, classifier, config, StdRng::from_os_rng())
    }

    /// Creates a new pipeline with an explicit cold-start randomness source.
    ///
    /// Placeholder predictions made before the classifier is fit draw from
    /// this source. Injecting a seeded generator makes cold-start output
    /// reproducible for tests; the default constructor seeds from OS
    /// entropy, and nothing about the generator is persisted either way.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateBudget`] if any budget or the
    /// class count is zero.
    pub fn with_rng(
        kernel: K,
        classifier: C,
        config: PipelineConfig,
        rng: StdRng,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let raw = RawAccumulator::new(config.effective_component_budget());
        let transformed = TransformedAccumulator::new(config.sample_budget);
        let metrics = MetricsCollector::new(config.collect_metrics);
        Ok(Self {
            kernel,
            classifier,
            config,
            stage: Stage::Collecting,
            raw,
            transformed,
            metrics,
            rng,
            training: true,
        })
    }

    /// Ingests a batch of raw feature vectors.
    ///
    /// Routing depends on the current stage: buffered raw while Collecting,
    /// transformed immediately while Accumulating, ignored once Fitted or in
    /// evaluation mode. Crossing a budget threshold triggers the
    /// corresponding fit within this call.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Fit`] if a component fit fails; the source buffer
    ///   is left intact and a later threshold crossing retries.
    /// - [`PipelineError::LabelCountMismatch`] if the transformed buffer
    ///   crossed the sample budget but the label buffer does not pair with
    ///   it; buffers are left intact and a later call retries.
    pub fn ingest_raw(&mut self, batch: Vec<FeatureVector>) -> PipelineResult<()> {
        if !self.training || self.stage.classifier_fitted() {
            return Ok(());
        }
        self.metrics.record_raw_ingest(batch.len());

        match self.stage {
            Stage::Collecting => {
                self.raw.push_batch(batch);
                if self.raw.is_over_budget() {
                    self.fit_approximator()?;
                }
            }
            Stage::Accumulating => {
                let mapped = self.kernel.transform(&batch)?;
                self.metrics.record_transformed(mapped.len());
                self.transformed.push_features(mapped);
            }
            // Unreachable: handled by the early return above
            Stage::Fitted => {}
        }

        self.maybe_fit_classifier(true)
    }

    /// Ingests a batch of labels.
    ///
    /// Labels fill independently of the transform timeline and are paired
    /// positionally at classifier-fit time. Labels beyond the sample budget
    /// are silently dropped (a budget policy, not an error) and counted in
    /// [`dropped_labels`](StagedFitPipeline::dropped_labels). Ignored once
    /// the classifier is fit or in evaluation mode.
    ///
    /// If the transformed buffer has already crossed the sample budget and
    /// this batch completes the pairing, the classifier fit retries here.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fit`] if a retried classifier fit fails.
    pub fn ingest_label(&mut self, batch: Vec<Label>) -> PipelineResult<()> {
        if !self.training || self.stage.classifier_fitted() {
            return Ok(());
        }
        let total = batch.len();
        let dropped = self.transformed.push_labels(batch);
        self.metrics.record_labels(total - dropped, dropped);
        if dropped > 0 {
            tracing::debug!(
                dropped,
                buffered = self.transformed.label_count(),
                "dropped labels beyond sample budget"
            );
        }

        // Retry path: only attempt when the pairing is exact, so a lagging
        // label stream does not error on every call while it catches up.
        self.maybe_fit_classifier(false)
    }

    /// Predicts one score distribution per input vector.
    ///
    /// Callable at any time, training or not. Once the classifier is fit,
    /// the batch is transformed and classified deterministically. Before
    /// that, each input gets a fresh uniformly random score vector of
    /// `num_classes` entries in `[0, 1)` — a well-shaped placeholder, not an
    /// error — re-randomized on every call.
    ///
    /// # Errors
    ///
    /// Propagates component transform/predict failures once fitted.
    pub fn predict(&mut self, batch: &[FeatureVector]) -> PipelineResult<Vec<LabelDistribution>> {
        if self.stage.classifier_fitted() {
            let mapped = self.kernel.transform(batch)?;
            let scores = self.classifier.predict(&mapped)?;
            self.metrics.record_prediction(batch.len(), false);
            Ok(scores)
        } else {
            let scores = batch
                .iter()
                .map(|_| {
                    (0..self.config.num_classes)
                        .map(|_| self.rng.random::<f32>())
                        .collect()
                })
                .collect();
            self.metrics.record_prediction(batch.len(), true);
            Ok(scores)
        }
    }

    /// Exports the persisted state: the two fitted booleans plus the opaque
    /// component blobs. Buffers are transient and excluded.
    ///
    /// # Errors
    ///
    /// Propagates component [`export_state`](KernelApproximator::export_state)
    /// failures.
    pub fn export_state(&self) -> PipelineResult<PipelineState> {
        Ok(PipelineState {
            version: state::STATE_VERSION,
            approximator_fitted: self.stage.approximator_fitted(),
            classifier_fitted: self.stage.classifier_fitted(),
            kernel_state: self.kernel.export_state()?,
            classifier_state: self.classifier.export_state()?,
        })
    }

    /// Restores a previously exported state.
    ///
    /// Components receive their blobs, the stage is rebuilt from the fitted
    /// booleans, and all buffers start empty. Given the same state,
    /// [`predict`](StagedFitPipeline::predict) results are identical before
    /// export and after import.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StateEncoding`] on a version mismatch or an
    /// impossible flag combination, and propagates component import
    /// failures.
    pub fn import_state(&mut self, state: PipelineState) -> PipelineResult<()> {
        if state.version != state::STATE_VERSION {
            return Err(PipelineError::StateEncoding {
                detail: format!(
                    "unsupported state version {} (expected {})",
                    state.version,
                    state::STATE_VERSION
                ),
            });
        }
        let stage = Stage::from_flags(state.approximator_fitted, state.classifier_fitted)?;
        self.kernel.import_state(state.kernel_state)?;
        self.classifier.import_state(state.classifier_state)?;
        self.stage = stage;
        self.raw = RawAccumulator::new(self.config.effective_component_budget());
        self.transformed = TransformedAccumulator::new(self.config.sample_budget);
        Ok(())
    }

    /// Saves the exported state to a JSON file.
    ///
    /// # Errors
    ///
    /// Propagates export and file I/O failures.
    pub fn save_state<P: AsRef<std::path::Path>>(&self, path: P) -> PipelineResult<()> {
        self.export_state()?.save(path)
    }

    /// Loads a state file and restores it into this pipeline.
    ///
    /// # Errors
    ///
    /// Propagates file I/O, decoding, and import failures.
    pub fn load_state<P: AsRef<std::path::Path>>(&mut self, path: P) -> PipelineResult<()> {
        self.import_state(PipelineState::load(path)?)
    }

    /// Fits the kernel approximator from the entire raw buffer, then flushes
    /// the buffer through the fresh transform into the transformed buffer.
    ///
    /// The landmark set is everything buffered at the crossing, overshoot
    /// included. On fit failure the raw buffer stays intact for retry.
    fn fit_approximator(&mut self) -> PipelineResult<()> {
        if let Err(e) = self.kernel.fit(self.raw.contents()) {
            self.metrics.record_approximator_fit(false);
            tracing::warn!(
                buffered = self.raw.len(),
                error = %e,
                "kernel approximator fit failed; raw buffer retained for retry"
            );
            return Err(e);
        }
        self.metrics.record_approximator_fit(true);

        debug_assert!(stage::validate_transition(self.stage, Stage::Accumulating).is_ok());
        self.stage = Stage::Accumulating;

        let landmarks = self.raw.take_all();
        tracing::info!(
            landmarks = landmarks.len(),
            "kernel approximator fit; flushing raw buffer through transform"
        );
        let mapped = self.kernel.transform(&landmarks)?;
        self.metrics.record_transformed(mapped.len());
        self.transformed.push_features(mapped);
        Ok(())
    }

    /// Attempts the classifier fit if the sample budget has been crossed.
    ///
    /// `strict` controls the mismatch policy: the feature-ingestion path
    /// raises [`PipelineError::LabelCountMismatch`] when labels do not pair,
    /// while the label-ingestion retry path simply waits for the pairing to
    /// become exact.
    fn maybe_fit_classifier(&mut self, strict: bool) -> PipelineResult<()> {
        if self.stage != Stage::Accumulating || !self.transformed.is_over_budget() {
            return Ok(());
        }

        if !self.transformed.counts_match() {
            if strict {
                self.metrics.record_classifier_fit(false);
                return Err(PipelineError::LabelCountMismatch {
                    features: self.transformed.feature_count(),
                    labels: self.transformed.label_count(),
                });
            }
            return Ok(());
        }

        let (features, labels) = self.transformed.pairs();
        if let Err(e) = self.classifier.fit(features, labels) {
            self.metrics.record_classifier_fit(false);
            tracing::warn!(
                samples = features.len(),
                error = %e,
                "classifier fit failed; buffers retained for retry"
            );
            return Err(e);
        }
        self.metrics.record_classifier_fit(true);

        debug_assert!(stage::validate_transition(self.stage, Stage::Fitted).is_ok());
        let (features, labels) = self.transformed.take_pairs();
        self.stage = Stage::Fitted;
        tracing::info!(
            samples = features.len(),
            labels = labels.len(),
            "classifier fit; pipeline frozen"
        );
        Ok(())
    }

    /// Returns the current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns whether the kernel approximator has been fit.
    #[must_use]
    pub fn is_approximator_fitted(&self) -> bool {
        self.stage.approximator_fitted()
    }

    /// Returns whether the classifier has been fit.
    #[must_use]
    pub fn is_classifier_fitted(&self) -> bool {
        self.stage.classifier_fitted()
    }

    /// Number of raw feature vectors currently buffered.
    #[must_use]
    pub fn raw_buffered(&self) -> usize {
        self.raw.len()
    }

    /// Number of transformed feature vectors currently buffered.
    #[must_use]
    pub fn transformed_buffered(&self) -> usize {
        self.transformed.feature_count()
    }

    /// Number of labels currently buffered.
    #[must_use]
    pub fn labels_buffered(&self) -> usize {
        self.transformed.label_count()
    }

    /// Total labels silently dropped beyond the sample budget.
    #[must_use]
    pub fn dropped_labels(&self) -> u64 {
        self.transformed.dropped_labels()
    }

    /// Returns a snapshot of the collected statistics.
    #[must_use]
    pub fn statistics(&self) -> PipelineStatistics {
        self.metrics.statistics()
    }

    /// Switches between training and evaluation mode.
    ///
    /// Ingestion is a no-op in evaluation mode;
    /// [`predict`](StagedFitPipeline::predict) works in either.
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    /// Returns whether the pipeline is in training mode.
    #[must_use]
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use staged_fit_pipeline_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Classifier, FeatureVector, KernelApproximator, Label, LabelDistribution, PipelineConfig,
        PipelineError, PipelineResult, PipelineState, Stage, StagedFitPipeline, TransformedVector,
    };
}
