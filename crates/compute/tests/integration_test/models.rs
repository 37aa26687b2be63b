use twin_compute::models::{Autoencoder, LinearTrend, RandomForest, SequenceModel};
use twin_compute::{CancelToken, MinMaxScaler, ModelAdapter, ModelSettings, OutputScale};
use twin_core::error::ErrorCategory;
use twin_core::TwinError;

fn ramp(n: usize) -> Vec<f64> {
    (0..n).map(|i| 20.0 + 0.5 * i as f64 + (i as f64 * 0.9).sin()).collect()
}

fn settings(window: usize) -> ModelSettings {
    ModelSettings {
        window,
        forest_trees: 12,
        sequence_epochs: 2,
        sequence_hidden: 5,
        autoencoder_epochs: 2,
        ..ModelSettings::default()
    }
}

#[test]
fn sequence_output_length_is_n_minus_window() {
    for (n, w) in [(11, 10), (25, 10), (40, 3)] {
        let model = SequenceModel::new(&settings(w), CancelToken::new());
        let out = model.run(&ramp(n), None).unwrap();
        assert_eq!(out.actual.len(), n - w, "n={n} w={w}");
        assert_eq!(out.predicted.len(), n - w, "n={n} w={w}");
        assert_eq!(out.scale, OutputScale::Original);
    }
}

#[test]
fn sequence_predictions_are_in_original_units() {
    let signal = ramp(30);
    let mut scaler = MinMaxScaler::new();
    let out = SequenceModel::new(&settings(5), CancelToken::new())
        .run(&signal, Some(&mut scaler))
        .unwrap();
    // Round-trip through the fitted scaler recovers the actual values.
    let back = scaler
        .inverse_transform(&scaler.transform(&out.actual).unwrap())
        .unwrap();
    for (a, b) in out.actual.iter().zip(&back) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn short_signal_is_insufficient_data_not_a_crash() {
    let err = SequenceModel::new(&settings(10), CancelToken::new())
        .run(&ramp(8), None)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InsufficientData);
    assert!(err.to_string().contains("need more than 10"));
}

#[test]
fn reconstruction_stays_normalized() {
    let signal = ramp(40);
    let out = Autoencoder::new(&settings(5), CancelToken::new())
        .run(&signal, None)
        .unwrap();
    assert_eq!(out.scale, OutputScale::Normalized);
    assert_eq!(out.len(), signal.len());
    let max = out.actual.iter().copied().fold(f64::MIN, f64::max);
    assert!((max - 1.0).abs() < 1e-12);
}

#[test]
fn regression_models_keep_full_length() {
    let signal = ramp(50);
    let linear = LinearTrend.run(&signal, None).unwrap();
    let forest = RandomForest::new(12, 42).run(&signal, None).unwrap();
    for out in [linear, forest] {
        assert_eq!(out.actual, signal);
        assert_eq!(out.predicted.len(), signal.len());
        assert_eq!(out.offset, 0);
    }
}

#[test]
fn forest_seed_changes_the_fit() {
    let signal = ramp(50);
    let a = RandomForest::new(5, 1).run(&signal, None).unwrap();
    let b = RandomForest::new(5, 2).run(&signal, None).unwrap();
    assert_ne!(a.predicted, b.predicted);
}

#[test]
fn deadline_cancels_learned_models() {
    let token = CancelToken::with_timeout(std::time::Duration::ZERO);
    let err = Autoencoder::new(&settings(5), token)
        .run(&ramp(20), None)
        .unwrap_err();
    assert!(matches!(err, TwinError::Cancelled { .. }));
    assert_eq!(err.category(), ErrorCategory::Cancelled);
}

#[test]
fn non_finite_signal_is_rejected_by_every_model() {
    let mut signal = ramp(20);
    signal[7] = f64::INFINITY;
    let settings = settings(5);
    let models: Vec<Box<dyn ModelAdapter>> = vec![
        Box::new(LinearTrend),
        Box::new(RandomForest::new(3, 0)),
        Box::new(SequenceModel::new(&settings, CancelToken::new())),
        Box::new(Autoencoder::new(&settings, CancelToken::new())),
    ];
    for model in models {
        let err = model.run(&signal, None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ModelFit, "{}", model.kind());
    }
}
