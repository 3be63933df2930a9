//! Persisted pipeline state.
//!
//! A [`PipelineState`] captures everything needed to reconstruct a
//! pipeline's *fitted* behavior: the two fitted booleans and the opaque,
//! component-specific state blobs of the kernel approximator and classifier.
//!
//! # What's NOT persisted
//!
//! The three buffers (raw, transformed, labels) are transient training
//! bookkeeping and are excluded; after an import they start empty. The
//! cold-start randomness source is also excluded — placeholder predictions
//! are not reproducible from persisted state.
//!
//! # Format
//!
//! JSON via `serde_json`. The component blobs are `serde_json::Value`s
//! produced by the components themselves, so any implementation of the
//! crate's traits can round-trip without the pipeline knowing its internals.
//!
//! # Guarantee
//!
//! Given the same fitted booleans and component states, `predict` results
//! are identical before export and after import.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Current state format version.
pub(crate) const STATE_VERSION: u32 = 1;

/// Exported state of a staged fitting pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// State format version for compatibility checking.
    pub version: u32,

    /// Whether the kernel approximator has been fit.
    pub approximator_fitted: bool,

    /// Whether the classifier has been fit.
    pub classifier_fitted: bool,

    /// Opaque kernel approximator state.
    pub kernel_state: serde_json::Value,

    /// Opaque classifier state.
    pub classifier_state: serde_json::Value,
}

impl PipelineState {
    /// Saves the state to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StateIo`] if the file cannot be created, or
    /// [`PipelineError::StateEncoding`] if serialization fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        let file = File::create(path.as_ref()).map_err(|e| PipelineError::StateIo {
            detail: format!("failed to create state file: {e}"),
        })?;
        serde_json::to_writer(BufWriter::new(file), self).map_err(|e| {
            PipelineError::StateEncoding {
                detail: format!("failed to serialize state: {e}"),
            }
        })
    }

    /// Loads a state from a JSON file, checking the format version.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StateIo`] if the file cannot be opened,
    /// [`PipelineError::StateEncoding`] if deserialization fails or the
    /// version is unsupported.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| PipelineError::StateIo {
            detail: format!("failed to open state file: {e}"),
        })?;
        let state: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PipelineError::StateEncoding {
                detail: format!("failed to deserialize state: {e}"),
            }
        })?;
        if state.version != STATE_VERSION {
            return Err(PipelineError::StateEncoding {
                detail: format!(
                    "unsupported state version {} (expected {})",
                    state.version, STATE_VERSION
                ),
            });
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> PipelineState {
        PipelineState {
            version: STATE_VERSION,
            approximator_fitted: true,
            classifier_fitted: false,
            kernel_state: serde_json::json!({ "gamma": 0.5 }),
            classifier_state: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_json_round_trip() {
        let state = sample_state();
        let encoded = serde_json::to_string(&state).unwrap();
        let decoded: PipelineState = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.version, STATE_VERSION);
        assert!(decoded.approximator_fitted);
        assert!(!decoded.classifier_fitted);
        assert_eq!(decoded.kernel_state["gamma"], serde_json::json!(0.5));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut state = sample_state();
        state.version = 99;
        let dir = std::env::temp_dir().join("staged_fit_state_version_test.json");
        let file = File::create(&dir).unwrap();
        serde_json::to_writer(BufWriter::new(file), &state).unwrap();

        let err = PipelineState::load(&dir).unwrap_err();
        assert!(matches!(err, PipelineError::StateEncoding { .. }));
        let _ = std::fs::remove_file(&dir);
    }
}
