use twin_compute::{CancelToken, Pipeline, PipelineRequest, PipelineSettings, StatusThresholds};
use twin_core::frame::simulated_frame;
use twin_core::{ModelKind, RawFrame, StatusLevel, TwinError};

use crate::helpers::{fast_settings, plant_frame, sensors, write_csv};

#[test]
fn csv_with_gaps_runs_end_to_end() {
    let (_dir, path) = write_csv(
        "time,temperature,vibration,site\n\
         t0,50.0,30.0,a\n\
         t1,NA,30.4,a\n\
         t2,50.6,,b\n\
         t3,50.9,30.2,b\n\
         t4,51.1,30.1,a\n\
         t5,51.5,29.8,b\n",
    );
    let frame = RawFrame::from_csv_path(&path).unwrap();
    assert_eq!(frame.default_selection(), sensors(&["temperature", "vibration"]));

    let request = PipelineRequest::new(frame.default_selection(), ModelKind::Linear);
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();

    // 2 missing of 12 cells.
    assert!((run.quality.missing_pct - 100.0 * 2.0 / 12.0).abs() < 1e-9);
    assert_eq!(run.fused.len(), 6);
    assert!(run.fused.iter().all(|v| v.is_finite()));
}

#[test]
fn spike_is_flagged_at_its_index() {
    let frame = plant_frame(200, Some(120));
    let request = PipelineRequest::new(sensors(&["temperature"]), ModelKind::Linear);
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();

    assert_eq!(run.anomalies.anomaly_indices, vec![120]);
    assert_eq!(run.status, StatusLevel::Healthy);
    let flagged: Vec<usize> = run
        .series()
        .iter()
        .filter(|p| p.anomaly)
        .map(|p| p.index)
        .collect();
    assert_eq!(flagged, vec![120]);
}

#[test]
fn tight_anomaly_limit_forces_critical() {
    let frame = plant_frame(200, Some(50));
    let mut request = PipelineRequest::new(sensors(&["temperature"]), ModelKind::Linear);
    request.thresholds = StatusThresholds {
        health_threshold: 0.0,
        anomaly_limit: 0,
    };
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();
    assert_eq!(run.status, StatusLevel::Critical);
}

#[test]
fn every_model_runs_on_simulated_data() {
    let frame = simulated_frame(60, 7);
    let pipeline = Pipeline::new(fast_settings());
    for kind in ModelKind::ALL {
        let request = PipelineRequest::new(sensors(&["temperature", "pressure"]), kind);
        let run = pipeline.run(&frame, &request).unwrap();

        assert_eq!(run.summary.model, kind);
        assert_eq!(run.output.actual.len(), run.output.predicted.len());
        assert_eq!(run.anomalies.error.len(), run.output.len());
        assert!((0.0..=100.0).contains(&run.anomalies.health));
        match kind {
            ModelKind::Sequence => assert_eq!(run.output.len(), 60 - 5),
            _ => assert_eq!(run.output.len(), 60),
        }
        if kind.supports_horizon() {
            assert_eq!(run.forecast.len(), request.horizon);
        } else {
            assert!(run.forecast.is_empty());
        }
    }
}

#[test]
fn sequence_series_starts_at_window() {
    let frame = simulated_frame(30, 1);
    let request = PipelineRequest::new(sensors(&["vibration"]), ModelKind::Sequence);
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();
    let series = run.series();
    assert_eq!(series[0].index, 5);
    assert_eq!(series.len(), 25 + request.horizon);
}

#[test]
fn too_few_rows_for_window_is_insufficient_data() {
    let frame = simulated_frame(4, 3);
    let request = PipelineRequest::new(sensors(&["temperature"]), ModelKind::Sequence);
    let err = Pipeline::new(fast_settings()).run(&frame, &request).unwrap_err();
    assert!(matches!(
        err,
        TwinError::InsufficientData { required: 5, available: 4, .. }
    ));
}

#[test]
fn all_null_sensor_fails_quality_stage() {
    let (_dir, path) = write_csv("a,b\n1,\n2,\n3,\n");
    // Empty cells are missing, so `b` is numeric with nothing observed.
    let frame = RawFrame::from_csv_path(&path).unwrap();
    let request = PipelineRequest::new(sensors(&["a", "b"]), ModelKind::Linear);
    let err = Pipeline::new(PipelineSettings::default())
        .run(&frame, &request)
        .unwrap_err();
    assert!(matches!(err, TwinError::AllMissing { ref column } if column == "b"));
}

#[test]
fn cancelled_pipeline_reports_cancellation() {
    let token = CancelToken::new();
    let pipeline = Pipeline::new(fast_settings()).with_cancel(token.clone());
    token.cancel();

    let frame = simulated_frame(40, 2);
    let request = PipelineRequest::new(sensors(&["temperature"]), ModelKind::Reconstruction);
    let err = pipeline.run(&frame, &request).unwrap_err();
    assert!(matches!(err, TwinError::Cancelled { epoch: 1, .. }));

    // Closed-form models never check the token.
    let request = PipelineRequest::new(sensors(&["temperature"]), ModelKind::Linear);
    assert!(pipeline.run(&frame, &request).is_ok());
}

#[test]
fn run_ids_are_unique() {
    let frame = simulated_frame(20, 5);
    let request = PipelineRequest::new(sensors(&["temperature"]), ModelKind::Linear);
    let pipeline = Pipeline::new(fast_settings());
    let a = pipeline.run(&frame, &request).unwrap();
    let b = pipeline.run(&frame, &request).unwrap();
    assert_ne!(a.run_id, b.run_id);
    assert_eq!(a.output.predicted, b.output.predicted);
}
