use thiserror::Error;

#[derive(Error, Debug)]
pub enum TwinError {
    #[error("sensor selection is empty")]
    EmptySelection,

    #[error("unknown sensor column: {0}")]
    UnknownSensor(String),

    #[error("sensor column '{column}' has no values to impute from")]
    AllMissing { column: String },

    #[error("dataset has no numeric columns")]
    NoNumericColumns,

    #[error("residual series is empty")]
    EmptySeries,

    #[error("length mismatch: actual has {actual} samples, predicted has {predicted}")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("insufficient data for {model}: need more than {required} samples, got {available}")]
    InsufficientData {
        model: String,
        required: usize,
        available: usize,
    },

    #[error("model fit failed ({model}): {reason}")]
    ModelFit { model: String, reason: String },

    #[error("{model} fit cancelled after {epoch} epoch(s)")]
    Cancelled { model: String, epoch: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for TwinError {
    fn from(e: serde_json::Error) -> Self {
        TwinError::Serialize(e.to_string())
    }
}

/// Coarse error classes callers branch on when deciding how to adjust inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    InsufficientData,
    ModelFit,
    Cancelled,
    Io,
}

impl TwinError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TwinError::EmptySelection
            | TwinError::UnknownSensor(_)
            | TwinError::AllMissing { .. }
            | TwinError::NoNumericColumns
            | TwinError::EmptySeries
            | TwinError::LengthMismatch { .. }
            | TwinError::Config(_) => ErrorCategory::Input,
            TwinError::InsufficientData { .. } => ErrorCategory::InsufficientData,
            TwinError::ModelFit { .. } => ErrorCategory::ModelFit,
            TwinError::Cancelled { .. } => ErrorCategory::Cancelled,
            TwinError::Io(_) | TwinError::Csv(_) | TwinError::Serialize(_) => ErrorCategory::Io,
        }
    }

    pub fn model_fit(model: impl Into<String>, reason: impl Into<String>) -> Self {
        TwinError::ModelFit {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TwinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_window_and_length() {
        let err = TwinError::InsufficientData {
            model: "LSTM".into(),
            required: 10,
            available: 7,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for LSTM: need more than 10 samples, got 7"
        );
        assert_eq!(err.category(), ErrorCategory::InsufficientData);
    }

    #[test]
    fn input_errors_share_a_category() {
        assert_eq!(TwinError::EmptySelection.category(), ErrorCategory::Input);
        assert_eq!(
            TwinError::AllMissing { column: "temp".into() }.category(),
            ErrorCategory::Input
        );
        assert_eq!(TwinError::NoNumericColumns.category(), ErrorCategory::Input);
    }
}
