//! End-to-end run orchestrator.
//!
//! Stages, in order:
//!
//! - **Quality**: missing / noise / outlier metrics and mean imputation.
//! - **Fusion**: selected sensors reduced to one signal.
//! - **Model**: chosen adapter fitted, in-sample prediction produced.
//! - **Scoring**: residual anomalies, health, status, forecast, insights.

pub mod metrics;

use std::time::Duration;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use twin_core::config::PipelineConfig;
use twin_core::{ModelKind, RawFrame, Result, StatusLevel, SummaryRecord, TwinConfig, TwinError};

use crate::anomaly::{score, AnomalyReport, ScoringSettings};
use crate::forecast::flat_forecast;
use crate::fusion::fuse;
use crate::insight::structured_reasoning;
use crate::models::{CancelToken, Model, ModelAdapter, ModelOutput, ModelSettings};
use crate::quality::{assess, QualityReport, QualitySettings};
use crate::scaler::MinMaxScaler;
use crate::status::{classify, StatusThresholds};

use self::metrics::{RunMetrics, Stage};

/// Default number of forecast steps.
pub const DEFAULT_HORIZON: usize = 10;

/// Numeric settings that stay fixed across runs.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub quality: QualitySettings,
    pub scoring: ScoringSettings,
    pub models: ModelSettings,
    /// Budget for one learned-model fit.
    pub fit_timeout: Option<Duration>,
}

impl From<&TwinConfig> for PipelineSettings {
    fn from(config: &TwinConfig) -> Self {
        Self {
            quality: QualitySettings {
                outlier_z: config.scoring.outlier_z_threshold,
            },
            scoring: ScoringSettings {
                sigma: config.scoring.anomaly_sigma,
                epsilon: config.scoring.health_epsilon,
            },
            models: ModelSettings::from(&config.models),
            fit_timeout: config.models.fit_timeout(),
        }
    }
}

/// Operator choices for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    pub sensors: Vec<String>,
    pub model: ModelKind,
    pub thresholds: StatusThresholds,
    pub horizon: usize,
}

impl PipelineRequest {
    pub fn new(sensors: Vec<String>, model: ModelKind) -> Self {
        Self {
            sensors,
            model,
            thresholds: StatusThresholds::default(),
            horizon: DEFAULT_HORIZON,
        }
    }

    /// Request with model, thresholds and horizon taken from config.
    pub fn from_config(sensors: Vec<String>, config: &PipelineConfig) -> Self {
        Self {
            sensors,
            model: config.model,
            thresholds: StatusThresholds {
                health_threshold: config.health_threshold,
                anomaly_limit: config.anomaly_limit,
            },
            horizon: config.prediction_horizon,
        }
    }

    /// Reject a request before any computation runs.
    pub fn validate(&self, frame: &RawFrame) -> Result<()> {
        if self.sensors.is_empty() {
            return Err(TwinError::EmptySelection);
        }
        if let Some(unknown) = self.sensors.iter().find(|s| frame.column(s).is_none()) {
            return Err(TwinError::UnknownSensor(unknown.clone()));
        }
        if self.horizon == 0 {
            return Err(TwinError::Config(
                "prediction horizon must be at least 1".into(),
            ));
        }
        self.thresholds.validate()
    }
}

/// One row of the per-sample series. Forecast rows have no actual value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub index: usize,
    pub actual: Option<f64>,
    pub predicted: f64,
    pub error: Option<f64>,
    pub anomaly: bool,
}

/// Everything produced by one run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub quality: QualityReport,
    pub fused: Vec<f64>,
    pub output: ModelOutput,
    pub forecast: Vec<f64>,
    pub anomalies: AnomalyReport,
    pub status: StatusLevel,
    pub insights: Vec<String>,
    pub summary: SummaryRecord,
    pub metrics: RunMetrics,
}

impl PipelineRun {
    /// Per-sample rows (indices into the fused signal) followed by forecast rows.
    pub fn series(&self) -> Vec<SeriesPoint> {
        let offset = self.output.offset;
        let fitted = self
            .output
            .actual
            .iter()
            .zip(&self.output.predicted)
            .zip(&self.anomalies.error)
            .enumerate()
            .map(|(i, ((&actual, &predicted), &error))| SeriesPoint {
                index: offset + i,
                actual: Some(actual),
                predicted,
                error: Some(error),
                anomaly: self.anomalies.is_anomaly(i),
            });

        let start = offset + self.output.len();
        let forecast = self
            .forecast
            .iter()
            .enumerate()
            .map(move |(j, &predicted)| SeriesPoint {
                index: start + j,
                actual: None,
                predicted,
                error: None,
                anomaly: false,
            });

        fitted.chain(forecast).collect()
    }
}

pub struct Pipeline {
    settings: PipelineSettings,
    cancel: Option<CancelToken>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            cancel: None,
        }
    }

    /// Use `token` for every fit instead of a per-run timeout token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn run(&self, frame: &RawFrame, request: &PipelineRequest) -> Result<PipelineRun> {
        request.validate(frame)?;

        let run_id = Uuid::new_v4();
        let mut metrics = RunMetrics::start();
        info!(
            %run_id,
            model = %request.model,
            sensors = ?request.sensors,
            rows = frame.rows(),
            "Pipeline run started"
        );

        let quality = metrics.time(Stage::Quality, || {
            assess(frame, &request.sensors, &self.settings.quality)
        })?;
        info!(
            %run_id,
            missing_pct = quality.missing_pct,
            noise = quality.noise_level,
            outlier_pct = quality.outlier_pct,
            quality_score = quality.quality_score,
            "Quality assessed"
        );

        let fused = metrics.time(Stage::Fusion, || fuse(&quality.imputed, &request.sensors))?;
        metrics.samples = fused.len();

        let cancel = self
            .cancel
            .clone()
            .unwrap_or_else(|| CancelToken::from_timeout(self.settings.fit_timeout));
        let model = Model::build(request.model, &self.settings.models, cancel);
        let mut scaler = MinMaxScaler::new();
        let output = metrics.time(Stage::Model, || model.run(&fused, Some(&mut scaler)))?;
        info!(
            %run_id,
            model = %request.model,
            samples = output.len(),
            offset = output.offset,
            "Model fitted"
        );

        let (anomalies, status, forecast, insights) = metrics.time(Stage::Scoring, || {
            let anomalies = score(&output.actual, &output.predicted, &self.settings.scoring)?;
            let status = classify(anomalies.health, anomalies.anomaly_count(), &request.thresholds);
            let forecast = flat_forecast(&output.predicted, request.model, request.horizon);
            let insights = structured_reasoning(
                anomalies.health,
                anomalies.anomaly_count(),
                quality.noise_level,
            );
            Ok::<_, TwinError>((anomalies, status, forecast, insights))
        })?;

        let summary = SummaryRecord::new(
            request.model,
            anomalies.health,
            status,
            anomalies.anomaly_count(),
            request.horizon,
        );
        metrics.finish();

        info!(
            %run_id,
            health = anomalies.health,
            status = %status,
            anomalies = anomalies.anomaly_count(),
            total_ms = metrics.total_ms,
            "Pipeline run complete"
        );

        Ok(PipelineRun {
            run_id,
            quality,
            fused,
            output,
            forecast,
            anomalies,
            status,
            insights,
            summary,
            metrics,
        })
    }
}
