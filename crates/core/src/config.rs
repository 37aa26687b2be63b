use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TwinError};
use crate::report::ReportFormat;
use crate::types::ModelKind;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwinConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
    pub models: ModelConfig,
    pub auth: AuthConfig,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self::for_profile_with(|_| None)
    }
}

impl TwinConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TWIN_PROFILE`. When set (e.g. `PLANT_A`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("TWIN_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let mut config = Self::for_profile_with(|key| profiled_env_opt(&p, key));
        config.profile = p;
        config
    }

    /// Resolve every key through `lookup`, using defaults for misses.
    fn for_profile_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            profile: String::new(),
            pipeline: PipelineConfig::resolve(&lookup),
            scoring: ScoringConfig::resolve(&lookup),
            models: ModelConfig::resolve(&lookup),
            auth: AuthConfig::resolve(&lookup),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject values outside the ranges the pipeline accepts.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if p.prediction_horizon == 0 {
            return Err(TwinError::Config("prediction horizon must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&p.health_threshold) {
            return Err(TwinError::Config(format!(
                "health threshold must be within 0..=100, got {}",
                p.health_threshold
            )));
        }
        if p.anomaly_limit == 0 {
            return Err(TwinError::Config("anomaly limit must be at least 1".into()));
        }

        let m = &self.models;
        for (name, value) in [
            ("SEQUENCE_WINDOW", m.sequence_window),
            ("SEQUENCE_EPOCHS", m.sequence_epochs),
            ("SEQUENCE_HIDDEN", m.sequence_hidden),
            ("SEQUENCE_BATCH", m.sequence_batch),
            ("AUTOENCODER_EPOCHS", m.autoencoder_epochs),
            ("AUTOENCODER_BATCH", m.autoencoder_batch),
            ("FOREST_TREES", m.forest_trees),
        ] {
            if value == 0 {
                return Err(TwinError::Config(format!("{name} must be at least 1")));
            }
        }
        if !(m.learning_rate > 0.0 && m.learning_rate.is_finite()) {
            return Err(TwinError::Config("LEARNING_RATE must be positive".into()));
        }

        let s = &self.scoring;
        if s.outlier_z_threshold <= 0.0 || s.anomaly_sigma < 0.0 || s.health_epsilon <= 0.0 {
            return Err(TwinError::Config(
                "scoring thresholds must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  pipeline:    model={}, horizon={}, health_threshold={}, anomaly_limit={}, format={}",
            self.pipeline.model,
            self.pipeline.prediction_horizon,
            self.pipeline.health_threshold,
            self.pipeline.anomaly_limit,
            self.pipeline.report_format
        );
        tracing::info!(
            "  scoring:     outlier_z={}, anomaly_sigma={}",
            self.scoring.outlier_z_threshold,
            self.scoring.anomaly_sigma
        );
        tracing::info!(
            "  models:      seed={}, trees={}, window={}, timeout={}",
            self.models.random_seed,
            self.models.forest_trees,
            self.models.sequence_window,
            self.models
                .fit_timeout()
                .map(|d| format!("{}s", d.as_secs()))
                .unwrap_or_else(|| "(none)".to_string())
        );
        tracing::info!("  auth:        users_file={}", self.auth.users_file.display());
    }
}

// ── Pipeline ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub model: ModelKind,
    pub prediction_horizon: usize,
    pub health_threshold: f64,
    pub anomaly_limit: usize,
    pub report_format: ReportFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::resolve(&|_| None)
    }
}

impl PipelineConfig {
    fn resolve(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            model: parse_or(lookup, "TWIN_MODEL", ModelKind::Linear),
            prediction_horizon: parse_or(lookup, "PREDICTION_HORIZON", 10),
            health_threshold: parse_or(lookup, "HEALTH_THRESHOLD", 75.0),
            anomaly_limit: parse_or(lookup, "ANOMALY_LIMIT", 10),
            report_format: parse_or(lookup, "REPORT_FORMAT", ReportFormat::Csv),
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Per-cell |z| above which a data-quality outlier is counted.
    pub outlier_z_threshold: f64,
    /// Residual anomaly threshold = mean + sigma * std.
    pub anomaly_sigma: f64,
    /// Added to max error in the health denominator.
    pub health_epsilon: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::resolve(&|_| None)
    }
}

impl ScoringConfig {
    fn resolve(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            outlier_z_threshold: parse_or(lookup, "OUTLIER_Z_THRESHOLD", 3.0),
            anomaly_sigma: parse_or(lookup, "ANOMALY_SIGMA", 3.0),
            health_epsilon: parse_or(lookup, "HEALTH_EPSILON", 1e-6),
        }
    }
}

// ── Models ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub random_seed: u64,
    pub forest_trees: usize,
    pub sequence_window: usize,
    pub sequence_epochs: usize,
    pub sequence_hidden: usize,
    pub sequence_batch: usize,
    pub autoencoder_epochs: usize,
    pub autoencoder_batch: usize,
    pub learning_rate: f64,
    /// Wall-clock budget for a single learned-model fit, in seconds.
    pub fit_timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::resolve(&|_| None)
    }
}

impl ModelConfig {
    fn resolve(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            random_seed: parse_or(lookup, "RANDOM_SEED", 42),
            forest_trees: parse_or(lookup, "FOREST_TREES", 100),
            sequence_window: parse_or(lookup, "SEQUENCE_WINDOW", 10),
            sequence_epochs: parse_or(lookup, "SEQUENCE_EPOCHS", 10),
            sequence_hidden: parse_or(lookup, "SEQUENCE_HIDDEN", 50),
            sequence_batch: parse_or(lookup, "SEQUENCE_BATCH", 8),
            autoencoder_epochs: parse_or(lookup, "AUTOENCODER_EPOCHS", 30),
            autoencoder_batch: parse_or(lookup, "AUTOENCODER_BATCH", 16),
            learning_rate: parse_or(lookup, "LEARNING_RATE", 0.001),
            fit_timeout_secs: lookup("FIT_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
        }
    }

    pub fn fit_timeout(&self) -> Option<Duration> {
        self.fit_timeout_secs.map(Duration::from_secs)
    }
}

// ── Auth (credential store location) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub users_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::resolve(&|_| None)
    }
}

impl AuthConfig {
    fn resolve(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            users_file: PathBuf::from(
                lookup("USERS_FILE").unwrap_or_else(|| "data/users.json".to_string()),
            ),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
