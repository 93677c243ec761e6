//! End-to-end pipeline tests: determinism, imbalance handling, and the
//! preprocessing → encode → kernel → train → evaluate flow.

use entrelazar::prelude::*;
use entrelazar::preprocessing::{top_variance_indices, AngleScaler};

fn clustered() -> (Matrix<f64>, Vec<usize>) {
    let x = Matrix::from_vec(
        6,
        2,
        vec![
            0.5, 1.0, //
            0.5, 1.0, //
            0.6, 1.1, //
            4.0, 5.5, //
            4.0, 5.5, //
            4.1, 5.4,
        ],
    )
    .expect("matrix");
    (x, vec![0, 0, 0, 1, 1, 1])
}

fn fit_and_score() -> Vector<f64> {
    let (x, y) = clustered();
    let mut clf = QuantumClassifier::new(
        StatevectorBackend::new(),
        EncoderConfig::new(),
        KernelConfig::new(),
    );
    clf.fit(&x, &y).expect("fit");
    clf.decision_function(&x).expect("scores")
}

#[test]
fn test_exact_backend_pipeline_is_deterministic() {
    // Same data, same configuration, fresh everything: bitwise-equal scores.
    assert_eq!(fit_and_score(), fit_and_score());
}

#[test]
fn test_sampled_backend_reproducible_for_fixed_seed() {
    let run = |seed: u64| {
        let (x, y) = clustered();
        let mut clf = QuantumClassifier::new(
            SampledBackend::new(512, seed),
            EncoderConfig::new(),
            KernelConfig::new(),
        );
        clf.fit(&x, &y).expect("fit");
        clf.decision_function(&x).expect("scores")
    };
    assert_eq!(run(3), run(3));
}

#[test]
fn test_imbalanced_evaluation_and_threshold_tuning() {
    // 8 negatives, 2 positives; the positive cluster sits far away.
    let x = Matrix::from_vec(
        10,
        2,
        vec![
            0.2, 0.3, //
            0.2, 0.3, //
            0.3, 0.2, //
            0.3, 0.2, //
            0.4, 0.4, //
            0.4, 0.4, //
            0.5, 0.3, //
            0.5, 0.3, //
            4.5, 5.0, //
            4.5, 5.0,
        ],
    )
    .expect("matrix");
    let y = vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1];

    let mut clf = QuantumClassifier::new(
        StatevectorBackend::new(),
        EncoderConfig::new(),
        KernelConfig::new(),
    );
    clf.fit(&x, &y).expect("fit");
    let scores = clf.decision_function(&x).expect("scores");

    // The two positives must outrank every negative.
    assert!((roc_auc(&y, scores.as_slice()) - 1.0).abs() < 1e-12);
    assert!((average_precision(&y, scores.as_slice()) - 1.0).abs() < 1e-12);

    let threshold = best_f1_threshold(&y, scores.as_slice()).expect("positives present");
    let metrics = clf.evaluate(&x, &y, threshold).expect("evaluate");
    assert!((metrics.f1 - 1.0).abs() < 1e-12);
    assert_eq!(metrics.fn_, 0);
}

#[test]
fn test_preprocessed_raw_features_flow_through_pipeline() {
    // Raw features on wild scales, one dead column; the pipeline input is
    // the variance-selected, angle-scaled view.
    let raw = Matrix::from_vec(
        4,
        3,
        vec![
            10.0, 7.0, -500.0, //
            11.0, 7.0, -480.0, //
            95.0, 7.0, 520.0, //
            94.0, 7.0, 505.0,
        ],
    )
    .expect("matrix");
    let y = vec![0, 0, 1, 1];

    let selected = top_variance_indices(&raw, 2).expect("selection");
    assert_eq!(selected, vec![0, 2]);
    let narrowed = raw.select_columns(&selected).expect("select");

    let mut scaler = AngleScaler::new();
    let x = scaler.fit_transform(&narrowed).expect("scale");

    let mut clf = QuantumClassifier::new(
        StatevectorBackend::new(),
        EncoderConfig::new().with_entanglement(Entanglement::Linear),
        KernelConfig::new(),
    );
    clf.fit(&x, &y).expect("fit");
    assert_eq!(clf.predict(&x, 0.0).expect("predict"), y);
}

#[test]
fn test_saved_model_round_trip_preserves_scores() {
    let (x, y) = clustered();
    let mut clf = QuantumClassifier::new(
        StatevectorBackend::new(),
        EncoderConfig::new(),
        KernelConfig::new(),
    );
    clf.fit(&x, &y).expect("fit");
    let expected = clf.decision_function(&x).expect("scores");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("model.json");
    clf.model().expect("model").save(&path).expect("save");

    let loaded = TrainedModel::load(&path).expect("load");
    assert_eq!(loaded.encoder_config, *clf.encoder());
    let mut restored = QuantumClassifier::from_model(
        StatevectorBackend::new(),
        KernelConfig::new(),
        &loaded,
        x.clone(),
    )
    .expect("restore");
    let scores = restored.decision_function(&x).expect("scores");
    for (a, b) in expected.iter().zip(scores.iter()) {
        assert!((a - b).abs() < 1e-12);
    }
}
