use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use twin_compute::{Pipeline, PipelineRequest, PipelineRun, PipelineSettings, SeriesPoint};
use twin_core::frame::simulated_frame;
use twin_core::{RawFrame, ReportFormat, TwinConfig};

use crate::cli::RunArgs;
use crate::terminal::Terminal;

/// Execute `twin run`: load data, run the pipeline, emit report and series.
pub fn execute(config: &TwinConfig, args: RunArgs, terminal: &Terminal) -> Result<()> {
    let seed = args.seed.unwrap_or(config.models.random_seed);

    let frame = match &args.input {
        Some(path) => RawFrame::from_csv_path(path)
            .with_context(|| format!("failed to load sensor data from {}", path.display()))?,
        None => {
            info!(rows = args.rows, seed, "Using simulated plant data");
            simulated_frame(args.rows, seed)
        }
    };

    let sensors = if args.sensors.is_empty() {
        frame.default_selection()
    } else {
        args.sensors.clone()
    };

    let mut pipeline_config = config.pipeline.clone();
    if let Some(model) = args.model {
        pipeline_config.model = model;
    }
    if let Some(horizon) = args.horizon {
        pipeline_config.prediction_horizon = horizon;
    }
    if let Some(threshold) = args.health_threshold {
        pipeline_config.health_threshold = threshold;
    }
    if let Some(limit) = args.anomaly_limit {
        pipeline_config.anomaly_limit = limit;
    }
    let format = args.format.unwrap_or(pipeline_config.report_format);

    let mut settings = PipelineSettings::from(config);
    settings.models.seed = seed;

    let request = PipelineRequest::from_config(sensors, &pipeline_config);
    let run = Pipeline::new(settings)
        .run(&frame, &request)
        .context("pipeline run failed")?;

    terminal.print_run(&run)?;

    let report = run.summary.render(format)?;
    match &args.output {
        Some(path) => {
            let target = report_path(path, format);
            std::fs::write(&target, report)
                .with_context(|| format!("failed to write report: {}", target.display()))?;
            terminal.print_info(&format!("Report ({format}) written to {}", target.display()))?;
        }
        None => {
            println!();
            println!("{report}");
        }
    }

    if let Some(path) = &args.series {
        write_series(path, &run)?;
        terminal.print_info(&format!("Series written to {}", path.display()))?;
    }

    Ok(())
}

/// A directory gets the standard report file name inside it.
fn report_path(path: &Path, format: ReportFormat) -> PathBuf {
    if path.is_dir() {
        path.join(format.file_name())
    } else {
        path.to_path_buf()
    }
}

fn write_series(path: &Path, run: &PipelineRun) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create series file: {}", path.display()))?;
    let rows: Vec<SeriesPoint> = run.series();
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(rows = rows.len(), path = %path.display(), "Series written");
    Ok(())
}
