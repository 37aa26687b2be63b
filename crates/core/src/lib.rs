pub mod config;
pub mod error;
pub mod frame;
pub mod report;
pub mod types;

pub use config::TwinConfig;
pub use error::*;
pub use frame::{Column, DenseFrame, RawFrame};
pub use report::{ReportFormat, SummaryRecord};
pub use types::{ModelKind, StatusLevel};
