//! Landmark-subset RBF kernel feature approximator.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::{FeatureVector, KernelApproximator, TransformedVector};

const COMPONENT: &str = "kernel approximator";

/// Approximates an RBF kernel feature map against a subset of landmarks.
///
/// `fit` keeps up to `n_components` evenly strided vectors from the landmark
/// set; `transform` maps an input `x` to the vector of kernel evaluations
/// `exp(-gamma * ||x - l_i||^2)` over the kept landmarks. The output
/// dimensionality is therefore `min(n_components, landmark_set_len)` and is
/// fixed once fit.
///
/// # Example
///
/// ```
/// use staged_fit_pipeline_rs::models::RbfLandmarkApproximator;
/// use staged_fit_pipeline_rs::KernelApproximator;
///
/// let mut kernel = RbfLandmarkApproximator::new(2, 0.5);
/// kernel.fit(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]])?;
/// let mapped = kernel.transform(&[vec![0.0, 0.0]])?;
/// assert_eq!(mapped[0].len(), 2);
/// // A point sitting on a landmark evaluates the kernel at 1 there
/// assert!((mapped[0][0] - 1.0).abs() < 1e-6);
/// # Ok::<(), staged_fit_pipeline_rs::error::PipelineError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbfLandmarkApproximator {
    /// Maximum number of landmarks to keep at fit time.
    n_components: usize,

    /// RBF kernel width parameter.
    gamma: f32,

    /// Kept landmarks; empty until fit.
    landmarks: Vec<FeatureVector>,
}

impl RbfLandmarkApproximator {
    /// Creates an unfit approximator.
    ///
    /// `n_components` is the maximum number of landmarks kept at fit time
    /// (the transformed dimensionality); `gamma` is the RBF width.
    #[must_use]
    pub fn new(n_components: usize, gamma: f32) -> Self {
        Self {
            n_components,
            gamma,
            landmarks: Vec::new(),
        }
    }

    /// Returns the transformed dimensionality, or 0 before fit.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.landmarks.len()
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

impl KernelApproximator for RbfLandmarkApproximator {
    fn fit(&mut self, landmarks: &[FeatureVector]) -> PipelineResult<()> {
        if landmarks.is_empty() {
            return Err(PipelineError::Fit {
                component: COMPONENT,
                reason: "empty landmark set".to_string(),
            });
        }
        let dim = landmarks[0].len();
        if dim == 0 {
            return Err(PipelineError::Fit {
                component: COMPONENT,
                reason: "zero-dimensional feature vectors".to_string(),
            });
        }
        for (i, v) in landmarks.iter().enumerate() {
            if v.len() != dim {
                return Err(PipelineError::Fit {
                    component: COMPONENT,
                    reason: format!(
                        "inconsistent feature dimensionality: vector {i} has {} entries, expected {dim}",
                        v.len()
                    ),
                });
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(PipelineError::Fit {
                    component: COMPONENT,
                    reason: format!("non-finite value in landmark vector {i}"),
                });
            }
        }

        // Evenly strided subset keeps the landmarks spread across the
        // arrival order of the set.
        let kept = self.n_components.min(landmarks.len()).max(1);
        self.landmarks = (0..kept)
            .map(|i| landmarks[i * landmarks.len() / kept].clone())
            .collect();
        Ok(())
    }

    fn transform(&self, batch: &[FeatureVector]) -> PipelineResult<Vec<TransformedVector>> {
        if self.landmarks.is_empty() {
            return Err(PipelineError::Fit {
                component: COMPONENT,
                reason: "transform called before fit".to_string(),
            });
        }
        let dim = self.landmarks[0].len();
        batch
            .iter()
            .map(|x| {
                if x.len() != dim {
                    return Err(PipelineError::Fit {
                        component: COMPONENT,
                        reason: format!(
                            "input has {} entries, expected {dim}",
                            x.len()
                        ),
                    });
                }
                Ok(self
                    .landmarks
                    .iter()
                    .map(|l| (-self.gamma * Self::squared_distance(x, l)).exp())
                    .collect())
            })
            .collect()
    }

    fn export_state(&self) -> PipelineResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| PipelineError::StateEncoding {
            detail: format!("failed to export kernel approximator state: {e}"),
        })
    }

    fn import_state(&mut self, state: serde_json::Value) -> PipelineResult<()> {
        *self = serde_json::from_value(state).map_err(|e| PipelineError::StateEncoding {
            detail: format!("failed to import kernel approximator state: {e}"),
        })?;
        Ok(())
    }
}
