//! Persisted-state round-trip tests: export/import equality and file I/O.

use staged_fit_pipeline_rs::models::{NearestCentroidClassifier, RbfLandmarkApproximator};
use staged_fit_pipeline_rs::prelude::*;

fn fresh_pipeline() -> StagedFitPipeline<RbfLandmarkApproximator, NearestCentroidClassifier> {
    let config = PipelineConfig::builder()
        .component_budget(4)
        .sample_budget(8)
        .num_classes(2)
        .build();
    StagedFitPipeline::new(
        RbfLandmarkApproximator::new(4, 0.5),
        NearestCentroidClassifier::new(2),
        config,
    )
    .unwrap()
}

/// Drives a pipeline all the way to the Fitted stage with two well-separated
/// clusters.
fn fitted_pipeline() -> StagedFitPipeline<RbfLandmarkApproximator, NearestCentroidClassifier> {
    let mut p = fresh_pipeline();
    let features: Vec<FeatureVector> = (0..8)
        .map(|i| {
            if i < 4 {
                vec![i as f32 * 0.1, 0.0]
            } else {
                vec![20.0 + i as f32 * 0.1, 20.0]
            }
        })
        .collect();
    p.ingest_label(vec![0, 0, 0, 0, 1, 1, 1, 1]).unwrap();
    p.ingest_raw(features).unwrap();
    assert!(p.is_classifier_fitted());
    p
}

fn probe() -> Vec<FeatureVector> {
    vec![vec![0.15, 0.0], vec![20.2, 20.0], vec![5.0, 5.0]]
}

#[test]
fn test_import_reproduces_predictions() {
    let fitted = fitted_pipeline();
    let expected = {
        let mut p = fitted_pipeline();
        p.predict(&probe()).unwrap()
    };

    let state = fitted.export_state().unwrap();
    let mut restored = fresh_pipeline();
    restored.import_state(state).unwrap();

    assert_eq!(restored.stage(), Stage::Fitted);
    assert_eq!(restored.predict(&probe()).unwrap(), expected);
}

#[test]
fn test_export_reflects_stage_flags() {
    let mut p = fresh_pipeline();
    let state = p.export_state().unwrap();
    assert!(!state.approximator_fitted);
    assert!(!state.classifier_fitted);

    p.ingest_raw((0..4).map(|i| vec![i as f32, 0.0]).collect())
        .unwrap();
    let state = p.export_state().unwrap();
    assert!(state.approximator_fitted);
    assert!(!state.classifier_fitted);

    let state = fitted_pipeline().export_state().unwrap();
    assert!(state.approximator_fitted);
    assert!(state.classifier_fitted);
}

#[test]
fn test_import_clears_buffers() {
    // Buffers are transient bookkeeping: whatever was buffered before an
    // import is gone afterward.
    let mut p = fresh_pipeline();
    p.ingest_raw(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
    p.ingest_label(vec![0, 1]).unwrap();
    assert_eq!(p.raw_buffered(), 2);
    assert_eq!(p.labels_buffered(), 2);

    let unfit_state = fresh_pipeline().export_state().unwrap();
    p.import_state(unfit_state).unwrap();
    assert_eq!(p.raw_buffered(), 0);
    assert_eq!(p.transformed_buffered(), 0);
    assert_eq!(p.labels_buffered(), 0);
    assert_eq!(p.stage(), Stage::Collecting);
}

#[test]
fn test_impossible_flag_combination_rejected() {
    let mut state = fitted_pipeline().export_state().unwrap();
    state.approximator_fitted = false; // classifier fitted without approximator
    let mut p = fresh_pipeline();
    assert!(matches!(
        p.import_state(state),
        Err(PipelineError::StateEncoding { .. })
    ));
}

#[test]
fn test_version_mismatch_rejected() {
    let mut state = fitted_pipeline().export_state().unwrap();
    state.version += 1;
    let mut p = fresh_pipeline();
    assert!(matches!(
        p.import_state(state),
        Err(PipelineError::StateEncoding { .. })
    ));
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline_state.json");

    let fitted = fitted_pipeline();
    fitted.save_state(&path).unwrap();

    let expected = {
        let mut p = fitted_pipeline();
        p.predict(&probe()).unwrap()
    };

    let mut restored = fresh_pipeline();
    restored.load_state(&path).unwrap();
    assert_eq!(restored.stage(), Stage::Fitted);
    assert_eq!(restored.predict(&probe()).unwrap(), expected);
}

#[test]
fn test_missing_state_file_is_an_io_error() {
    let mut p = fresh_pipeline();
    let err = p.load_state("/nonexistent/state.json").unwrap_err();
    assert!(matches!(err, PipelineError::StateIo { .. }));
}
