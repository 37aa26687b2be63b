use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Wall-clock timings of one pipeline run, filled in stage by stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
    /// Quality assessment and imputation.
    pub quality_ms: f64,
    /// Sensor fusion.
    pub fusion_ms: f64,
    /// Model fit and in-sample prediction.
    pub model_ms: f64,
    /// Residual scoring, classification, forecast and insights.
    pub scoring_ms: f64,
    /// Whole run.
    pub total_ms: f64,
    /// Samples in the fused signal.
    pub samples: usize,

    #[serde(skip)]
    start: Option<Instant>,
}

/// Pipeline stages that are timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Quality,
    Fusion,
    Model,
    Scoring,
}

impl RunMetrics {
    /// Begin timing a run.
    pub fn start() -> Self {
        Self {
            started_at: Some(Utc::now()),
            start: Some(Instant::now()),
            ..Self::default()
        }
    }

    /// Record how long `stage` took.
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        match stage {
            Stage::Quality => self.quality_ms = ms,
            Stage::Fusion => self.fusion_ms = ms,
            Stage::Model => self.model_ms = ms,
            Stage::Scoring => self.scoring_ms = ms,
        }
    }

    /// Time a closure as `stage`, returning its result.
    pub fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.record(stage, start.elapsed());
        out
    }

    /// Close the run and set `total_ms`.
    pub fn finish(&mut self) {
        if let Some(start) = self.start {
            self.total_ms = start.elapsed().as_secs_f64() * 1000.0;
        }
    }
}
