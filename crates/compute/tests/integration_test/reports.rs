use twin_compute::{Pipeline, PipelineRequest};
use twin_core::frame::simulated_frame;
use twin_core::{ModelKind, ReportFormat, SummaryRecord};

use crate::helpers::{fast_settings, sensors};

#[test]
fn run_summary_round_trips_through_json() {
    let frame = simulated_frame(50, 11);
    let request = PipelineRequest::new(sensors(&["temperature", "vibration"]), ModelKind::Forest);
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();

    let json = run.summary.render(ReportFormat::Json).unwrap();
    let parsed = SummaryRecord::from_json(&json).unwrap();
    assert_eq!(parsed, run.summary);
}

#[test]
fn csv_report_has_header_and_one_row() {
    let frame = simulated_frame(50, 11);
    let request = PipelineRequest::new(sensors(&["pressure"]), ModelKind::Linear);
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();

    let csv = run.summary.render(ReportFormat::Csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "timestamp,model,health,status,anomalies,prediction_horizon"
    );
    assert!(lines[1].contains(",Linear Regression,"));
}

#[test]
fn text_report_lists_every_key() {
    let frame = simulated_frame(50, 11);
    let request = PipelineRequest::new(sensors(&["pressure"]), ModelKind::Linear);
    let run = Pipeline::new(fast_settings()).run(&frame, &request).unwrap();

    let text = run.summary.render(ReportFormat::Text).unwrap();
    let keys: Vec<&str> = text
        .lines()
        .filter_map(|line| line.split(": ").next())
        .collect();
    assert_eq!(
        keys,
        vec!["timestamp", "model", "health", "status", "anomalies", "prediction_horizon"]
    );
}
