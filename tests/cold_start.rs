//! Cold-start contract and label-budget policy tests.

use rand::rngs::StdRng;
use rand::SeedableRng;
use staged_fit_pipeline_rs::models::{NearestCentroidClassifier, RbfLandmarkApproximator};
use staged_fit_pipeline_rs::prelude::*;

fn pipeline(
    component_budget: usize,
    sample_budget: usize,
    num_classes: usize,
    seed: u64,
) -> StagedFitPipeline<RbfLandmarkApproximator, NearestCentroidClassifier> {
    let config = PipelineConfig::builder()
        .component_budget(component_budget)
        .sample_budget(sample_budget)
        .num_classes(num_classes)
        .build();
    StagedFitPipeline::with_rng(
        RbfLandmarkApproximator::new(component_budget, 0.5),
        NearestCentroidClassifier::new(num_classes),
        config,
        StdRng::seed_from_u64(seed),
    )
    .unwrap()
}

fn sample(i: usize) -> FeatureVector {
    vec![i as f32, (i * i) as f32]
}

#[test]
fn test_cold_start_shape_invariant() {
    // Before any fitting, predict returns one well-shaped distribution per
    // input: length num_classes, entries non-negative.
    let mut p = pipeline(4, 8, 5, 42);

    for batch_size in [1, 3, 7] {
        let batch: Vec<_> = (0..batch_size).map(sample).collect();
        let scores = p.predict(&batch).unwrap();
        assert_eq!(scores.len(), batch_size);
        for dist in &scores {
            assert_eq!(dist.len(), 5);
            assert!(dist.iter().all(|&s| (0.0..1.0).contains(&s)));
        }
    }
}

#[test]
fn test_cold_start_rerandomizes_each_call() {
    let mut p = pipeline(4, 8, 4, 42);
    let probe = vec![sample(0)];
    let first = p.predict(&probe).unwrap();
    let second = p.predict(&probe).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_cold_start_is_seed_deterministic() {
    let probe = vec![sample(0), sample(1)];
    let mut a = pipeline(4, 8, 4, 123);
    let mut b = pipeline(4, 8, 4, 123);
    assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
}

#[test]
fn test_cold_start_persists_through_approximator_fit() {
    // The contract holds in every pre-classifier stage, including after the
    // approximator has been fit.
    let mut p = pipeline(2, 100, 3, 1);
    p.ingest_raw(vec![sample(0), sample(1)]).unwrap();
    assert!(p.is_approximator_fitted());
    assert!(!p.is_classifier_fitted());

    let scores = p.predict(&[sample(5)]).unwrap();
    assert_eq!(scores[0].len(), 3);
}

#[test]
fn test_label_overflow_silently_dropped() {
    // Scenario C: sampleBudget=2, three size-1 label batches before any
    // transformed feature - the third is dropped, the buffer holds 2.
    let mut p = pipeline(2, 2, 2, 0);
    p.ingest_label(vec![0]).unwrap();
    p.ingest_label(vec![1]).unwrap();
    p.ingest_label(vec![0]).unwrap();

    assert_eq!(p.labels_buffered(), 2);
    assert_eq!(p.dropped_labels(), 1);
    assert_eq!(p.statistics().labels_dropped, 1);
}

#[test]
fn test_label_mismatch_is_retriable() {
    // Raw batches cross the sample budget without matching labels: the
    // crossing call fails with a mismatch, buffers stay intact, and the
    // pairing completes later.
    let mut p = pipeline(2, 4, 2, 0);

    let err = p.ingest_raw((0..4).map(sample).collect()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::LabelCountMismatch {
            features: 4,
            labels: 0
        }
    ));
    assert!(err.is_retriable());
    assert!(p.is_approximator_fitted());
    assert!(!p.is_classifier_fitted());
    assert_eq!(p.transformed_buffered(), 4);

    // Labels catching up one at a time must not error; the fit retries on
    // the call that completes the pairing.
    p.ingest_label(vec![0]).unwrap();
    p.ingest_label(vec![0]).unwrap();
    p.ingest_label(vec![1]).unwrap();
    assert!(!p.is_classifier_fitted());

    p.ingest_label(vec![1]).unwrap();
    assert!(p.is_classifier_fitted());
    assert_eq!(p.transformed_buffered(), 0);
    assert_eq!(p.labels_buffered(), 0);
}

#[test]
fn test_fitted_predictions_are_deterministic() {
    let mut p = pipeline(2, 4, 2, 0);
    p.ingest_label(vec![0, 0, 1, 1]).unwrap();
    p.ingest_raw(vec![
        vec![0.0, 0.0],
        vec![0.5, 0.5],
        vec![10.0, 10.0],
        vec![10.5, 10.5],
    ])
    .unwrap();
    assert!(p.is_classifier_fitted());

    let probe = vec![vec![0.2, 0.2], vec![10.2, 10.2]];
    let first = p.predict(&probe).unwrap();
    let second = p.predict(&probe).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0], vec![1.0, 0.0]);
    assert_eq!(first[1], vec![0.0, 1.0]);
}
