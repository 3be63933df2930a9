//! Nearest-centroid classifier over transformed feature vectors.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::{Classifier, Label, LabelDistribution, TransformedVector};

const COMPONENT: &str = "classifier";

/// Classifies by distance to per-class centroids.
///
/// `fit` computes the mean transformed vector of each class; `predict` emits
/// a one-hot distribution for the class whose centroid is nearest in squared
/// Euclidean distance. Classes absent from the training pairs never win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroidClassifier {
    /// Number of output classes (distribution width).
    num_classes: usize,

    /// Per-class centroid; `None` for classes with no training samples.
    /// Empty until fit.
    centroids: Vec<Option<Vec<f32>>>,
}

impl NearestCentroidClassifier {
    /// Creates an unfit classifier with the given class count.
    #[must_use]
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            centroids: Vec::new(),
        }
    }

    /// Returns whether the classifier has been fit.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.centroids.is_empty()
    }

    fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }
}

impl Classifier for NearestCentroidClassifier {
    fn fit(&mut self, features: &[TransformedVector], labels: &[Label]) -> PipelineResult<()> {
        if features.is_empty() {
            return Err(PipelineError::Fit {
                component: COMPONENT,
                reason: "empty training set".to_string(),
            });
        }
        if features.len() != labels.len() {
            return Err(PipelineError::Fit {
                component: COMPONENT,
                reason: format!(
                    "{} features but {} labels",
                    features.len(),
                    labels.len()
                ),
            });
        }
        let dim = features[0].len();
        let mut sums: Vec<Vec<f32>> = vec![vec![0.0; dim]; self.num_classes];
        let mut counts = vec![0usize; self.num_classes];

        for (i, (x, &y)) in features.iter().zip(labels.iter()).enumerate() {
            if x.len() != dim {
                return Err(PipelineError::Fit {
                    component: COMPONENT,
                    reason: format!(
                        "inconsistent feature dimensionality: vector {i} has {} entries, expected {dim}",
                        x.len()
                    ),
                });
            }
            if y >= self.num_classes {
                return Err(PipelineError::Fit {
                    component: COMPONENT,
                    reason: format!(
                        "label {y} out of range for {} classes",
                        self.num_classes
                    ),
                });
            }
            for (s, v) in sums[y].iter_mut().zip(x.iter()) {
                *s += v;
            }
            counts[y] += 1;
        }

        self.centroids = sums
            .into_iter()
            .zip(counts.iter())
            .map(|(sum, &count)| {
                if count == 0 {
                    None
                } else {
                    Some(sum.into_iter().map(|s| s / count as f32).collect())
                }
            })
            .collect();
        Ok(())
    }

    fn predict(&self, features: &[TransformedVector]) -> PipelineResult<Vec<LabelDistribution>> {
        if !self.is_fitted() {
            return Err(PipelineError::Fit {
                component: COMPONENT,
                reason: "predict called before fit".to_string(),
            });
        }
        features
            .iter()
            .map(|x| {
                let best = self
                    .centroids
                    .iter()
                    .enumerate()
                    .filter_map(|(class, c)| {
                        c.as_ref()
                            .map(|c| (class, Self::squared_distance(x, c)))
                    })
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(class, _)| class)
                    .ok_or_else(|| PipelineError::Fit {
                        component: COMPONENT,
                        reason: "no class centroids available".to_string(),
                    })?;

                let mut scores = vec![0.0; self.num_classes];
                scores[best] = 1.0;
                Ok(scores)
            })
            .collect()
    }

    fn export_state(&self) -> PipelineResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| PipelineError::StateEncoding {
            detail: format!("failed to export classifier state: {e}"),
        })
    }

    fn import_state(&mut self, state: serde_json::Value) -> PipelineResult<()> {
        *self = serde_json::from_value(state).map_err(|e| PipelineError::StateEncoding {
            detail: format!("failed to import classifier state: {e}"),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_data() -> (Vec<TransformedVector>, Vec<Label>) {
        (
            vec![
                vec![0.0, 0.1],
                vec![0.1, 0.0],
                vec![5.0, 5.1],
                vec![5.1, 5.0],
            ],
            vec![0, 0, 1, 1],
        )
    }

    #[test]
    fn test_fit_predict_one_hot() {
        let (features, labels) = two_cluster_data();
        let mut clf = NearestCentroidClassifier::new(2);
        clf.fit(&features, &labels).unwrap();

        let scores = clf
            .predict(&[vec![0.05, 0.05], vec![5.05, 5.05]])
            .unwrap();
        assert_eq!(scores[0], vec![1.0, 0.0]);
        assert_eq!(scores[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_unseen_class_never_wins() {
        let (features, labels) = two_cluster_data();
        let mut clf = NearestCentroidClassifier::new(3);
        clf.fit(&features, &labels).unwrap();

        let scores = clf.predict(&[vec![100.0, 100.0]]).unwrap();
        assert_eq!(scores[0].len(), 3);
        assert!((scores[0][2] - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_malformed_training_sets_rejected() {
        let mut clf = NearestCentroidClassifier::new(2);
        assert!(clf.fit(&[], &[]).is_err());
        assert!(clf.fit(&[vec![0.0]], &[0, 1]).is_err());
        assert!(clf.fit(&[vec![0.0]], &[5]).is_err());
        assert!(clf
            .fit(&[vec![0.0, 1.0], vec![0.0]], &[0, 1])
            .is_err());
    }

    #[test]
    fn test_predict_before_fit_is_an_error() {
        let clf = NearestCentroidClassifier::new(2);
        assert!(clf.predict(&[vec![0.0]]).is_err());
    }

    #[test]
    fn test_state_round_trip_preserves_predictions() {
        let (features, labels) = two_cluster_data();
        let mut clf = NearestCentroidClassifier::new(2);
        clf.fit(&features, &labels).unwrap();
        let before = clf.predict(&features).unwrap();

        let blob = clf.export_state().unwrap();
        let mut restored = NearestCentroidClassifier::new(2);
        restored.import_state(blob).unwrap();
        let after = restored.predict(&features).unwrap();
        assert_eq!(before, after);
    }
}
