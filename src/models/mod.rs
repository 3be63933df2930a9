//! Reference component implementations.
//!
//! The pipeline is generic over any [`KernelApproximator`] and
//! [`Classifier`] implementation; these two small, dependency-free models
//! make it usable end to end out of the box and serve as the canonical
//! examples of the component contracts, including opaque state export and
//! import.
//!
//! - [`RbfLandmarkApproximator`] — RBF kernel features against a strided
//!   landmark subset.
//! - [`NearestCentroidClassifier`] — per-class centroids in transformed
//!   space, one-hot output.
//!
//! [`KernelApproximator`]: crate::KernelApproximator
//! [`Classifier`]: crate::Classifier

mod nearest_centroid;
mod rbf_landmark;

pub use nearest_centroid::NearestCentroidClassifier;
pub use rbf_landmark::RbfLandmarkApproximator;
