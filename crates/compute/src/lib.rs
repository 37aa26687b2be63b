pub mod anomaly;
pub mod forecast;
pub mod fusion;
pub mod insight;
pub mod models;
pub mod pipeline;
pub mod quality;
pub mod scaler;
pub mod stats;
pub mod status;

pub use anomaly::{AnomalyReport, ScoringSettings};
pub use models::{CancelToken, Model, ModelAdapter, ModelOutput, ModelSettings, OutputScale};
pub use pipeline::{Pipeline, PipelineRequest, PipelineRun, PipelineSettings, SeriesPoint};
pub use quality::{QualityReport, QualitySettings};
pub use scaler::MinMaxScaler;
pub use status::StatusThresholds;
