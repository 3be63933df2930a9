//! Buffer accumulators backing the staged fit.
//!
//! Two accumulators hold the training bookkeeping between fit milestones:
//!
//! - [`RawAccumulator`] buffers un-transformed feature vectors until the
//!   kernel approximator's threshold is crossed, then drains exactly once.
//! - [`TransformedAccumulator`] buffers transformed feature vectors and
//!   labels (which arrive on independent timelines) until the classifier's
//!   threshold is crossed, then drains both exactly once.
//!
//! The thresholds are "at-least" policies: the fit uses everything buffered
//! at the moment of crossing, including any overshoot from the batch that
//! crossed it. Labels are the exception — they are capped at the sample
//! budget on the way in, and the excess is dropped and counted.

use crate::{FeatureVector, Label, TransformedVector};

/// Append-only buffer of raw feature vectors, drained exactly once.
#[derive(Debug)]
pub(crate) struct RawAccumulator {
    buffer: Vec<FeatureVector>,
    budget: usize,
}

impl RawAccumulator {
    /// Creates an accumulator with the given effective component budget.
    pub(crate) fn new(budget: usize) -> Self {
        Self {
            buffer: Vec::new(),
            budget,
        }
    }

    /// Appends a batch, taking ownership of the vectors.
    pub(crate) fn push_batch(&mut self, batch: Vec<FeatureVector>) {
        self.buffer.extend(batch);
    }

    /// Number of buffered samples.
    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the buffer has reached (or overshot) the fit threshold.
    pub(crate) fn is_over_budget(&self) -> bool {
        self.buffer.len() >= self.budget
    }

    /// Borrows the full contents for a fit attempt.
    ///
    /// The buffer stays intact so a failed fit can retry on a later call.
    pub(crate) fn contents(&self) -> &[FeatureVector] {
        &self.buffer
    }

    /// Drains the entire buffer. The one-way stage machine guarantees this
    /// is called at most once; the buffer is never repopulated afterward.
    pub(crate) fn take_all(&mut self) -> Vec<FeatureVector> {
        std::mem::take(&mut self.buffer)
    }
}

/// Parallel buffers of transformed feature vectors and labels.
///
/// Features and labels fill independently: labels may arrive detached from
/// the transform timeline. Labels are capped at the sample budget on entry;
/// transformed features are not (the threshold is at-least, so the crossing
/// batch's overshoot is kept and used in the fit).
#[derive(Debug)]
pub(crate) struct TransformedAccumulator {
    features: Vec<TransformedVector>,
    labels: Vec<Label>,
    budget: usize,
    dropped_labels: u64,
}

impl TransformedAccumulator {
    /// Creates an accumulator with the given sample budget.
    pub(crate) fn new(budget: usize) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            budget,
            dropped_labels: 0,
        }
    }

    /// Appends transformed feature vectors.
    pub(crate) fn push_features(&mut self, batch: Vec<TransformedVector>) {
        self.features.extend(batch);
    }

    /// Appends labels up to the sample budget; drops and counts the rest.
    ///
    /// Returns the number of labels dropped from this batch.
    pub(crate) fn push_labels(&mut self, batch: Vec<Label>) -> usize {
        let room = self.budget.saturating_sub(self.labels.len());
        let dropped = batch.len().saturating_sub(room);
        self.labels.extend(batch.into_iter().take(room));
        self.dropped_labels += dropped as u64;
        dropped
    }

    pub(crate) fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Total labels silently dropped beyond the sample budget.
    pub(crate) fn dropped_labels(&self) -> u64 {
        self.dropped_labels
    }

    /// Whether the feature buffer has reached the classifier fit threshold.
    pub(crate) fn is_over_budget(&self) -> bool {
        self.features.len() >= self.budget
    }

    /// Whether a classifier fit would be well-formed right now.
    pub(crate) fn counts_match(&self) -> bool {
        self.features.len() == self.labels.len()
    }

    /// Borrows both buffers for a fit attempt, leaving them intact so a
    /// failed fit can retry later.
    pub(crate) fn pairs(&self) -> (&[TransformedVector], &[Label]) {
        (&self.features, &self.labels)
    }

    /// Drains both buffers. Called exactly once, on classifier fit success.
    pub(crate) fn take_pairs(&mut self) -> (Vec<TransformedVector>, Vec<Label>) {
        (
            std::mem::take(&mut self.features),
            std::mem::take(&mut self.labels),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vecs(n: usize) -> Vec<FeatureVector> {
        (0..n).map(|i| vec![i as f32, 0.0]).collect()
    }

    #[test]
    fn test_raw_threshold_is_at_least() {
        let mut raw = RawAccumulator::new(4);
        raw.push_batch(vecs(3));
        assert!(!raw.is_over_budget());
        raw.push_batch(vecs(4)); // overshoot to 7
        assert!(raw.is_over_budget());
        assert_eq!(raw.len(), 7);

        // The drain takes everything, overshoot included
        let landmarks = raw.take_all();
        assert_eq!(landmarks.len(), 7);
        assert!(raw.is_empty());
    }

    #[test]
    fn test_label_overflow_is_dropped_and_counted() {
        let mut acc = TransformedAccumulator::new(2);
        assert_eq!(acc.push_labels(vec![0]), 0);
        assert_eq!(acc.push_labels(vec![1]), 0);
        assert_eq!(acc.push_labels(vec![2]), 1);
        assert_eq!(acc.label_count(), 2);
        assert_eq!(acc.dropped_labels(), 1);

        // A whole batch beyond the budget is dropped wholesale
        assert_eq!(acc.push_labels(vec![0, 1, 2]), 3);
        assert_eq!(acc.label_count(), 2);
        assert_eq!(acc.dropped_labels(), 4);
    }

    #[test]
    fn test_partial_label_batch_is_truncated() {
        let mut acc = TransformedAccumulator::new(4);
        acc.push_labels(vec![0, 1, 2]);
        assert_eq!(acc.push_labels(vec![3, 4, 5]), 2);
        assert_eq!(acc.label_count(), 4);
        assert_eq!(acc.dropped_labels(), 2);
    }

    #[test]
    fn test_counts_match_and_drain() {
        let mut acc = TransformedAccumulator::new(2);
        acc.push_features(vecs(2));
        acc.push_labels(vec![0]);
        assert!(acc.is_over_budget());
        assert!(!acc.counts_match());

        acc.push_labels(vec![1]);
        assert!(acc.counts_match());

        let (features, labels) = acc.take_pairs();
        assert_eq!(features.len(), 2);
        assert_eq!(labels, vec![0, 1]);
        assert_eq!(acc.feature_count(), 0);
        assert_eq!(acc.label_count(), 0);
    }
}
