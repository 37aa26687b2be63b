//! Summary record of one pipeline run and its downloadable report formats.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TwinError};
use crate::types::{ModelKind, StatusLevel};

/// Immutable snapshot of a pipeline run.
///
/// Field order is the on-disk key order of every report format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub timestamp: DateTime<Utc>,
    pub model: ModelKind,
    pub health: f64,
    pub status: StatusLevel,
    pub anomalies: usize,
    pub prediction_horizon: usize,
}

impl SummaryRecord {
    pub fn new(
        model: ModelKind,
        health: f64,
        status: StatusLevel,
        anomalies: usize,
        prediction_horizon: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            model,
            health,
            status,
            anomalies,
            prediction_horizon,
        }
    }

    /// `(key, value)` pairs in report order.
    pub fn fields(&self) -> [(&'static str, String); 6] {
        [
            ("timestamp", self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            ("model", self.model.name().to_string()),
            ("health", self.health.to_string()),
            ("status", self.status.to_string()),
            ("anomalies", self.anomalies.to_string()),
            ("prediction_horizon", self.prediction_horizon.to_string()),
        ]
    }

    /// Serialize into the requested report format.
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Csv => self.to_csv(),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Single-row table with a header.
    pub fn to_csv(&self) -> Result<String> {
        let fields = self.fields();
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(fields.iter().map(|(k, _)| *k))?;
        wtr.write_record(fields.iter().map(|(_, v)| v.as_str()))?;
        let data = wtr
            .into_inner()
            .map_err(|e| TwinError::Serialize(format!("CSV writer error: {e}")))?;
        String::from_utf8(data).map_err(|e| TwinError::Serialize(e.to_string()))
    }

    /// Pretty-printed object, 2-space indent.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `key: value` lines joined by newline.
    pub fn to_text(&self) -> String {
        self.fields()
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Output format of the downloadable report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Csv,
    Json,
    Text,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Text => "text",
        }
    }

    pub fn file_name(&self) -> String {
        format!("digital_twin_report.{}", self.extension())
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Csv => "CSV",
            ReportFormat::Json => "JSON",
            ReportFormat::Text => "Text",
        })
    }
}

impl FromStr for ReportFormat {
    type Err = TwinError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" => Ok(ReportFormat::Text),
            other => Err(TwinError::Config(format!("unknown report format: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> SummaryRecord {
        SummaryRecord {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap(),
            model: ModelKind::Forest,
            health: 87.5,
            status: StatusLevel::Healthy,
            anomalies: 3,
            prediction_horizon: 10,
        }
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let original = record();
        let json = original.to_json().unwrap();
        let parsed = SummaryRecord::from_json(&json).unwrap();
        assert_eq!(parsed, original);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["timestamp"], "2026-03-14T09:26:53Z");
        assert_eq!(value["health"], 87.5);
        assert_eq!(value["model"], "Random Forest");
        assert_eq!(value["status"], "Healthy");
    }

    #[test]
    fn json_is_pretty_printed_in_key_order() {
        let json = record().to_json().unwrap();
        assert!(json.starts_with("{\n  \"timestamp\""));
        let keys: Vec<usize> = ["timestamp", "model", "health", "status", "anomalies", "prediction_horizon"]
            .iter()
            .map(|k| json.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn csv_is_one_row_with_header() {
        let csv = record().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "timestamp,model,health,status,anomalies,prediction_horizon"
        );
        assert_eq!(
            lines[1],
            "2026-03-14T09:26:53Z,Random Forest,87.5,Healthy,3,10"
        );
    }

    #[test]
    fn text_is_key_value_lines() {
        let text = record().to_text();
        assert_eq!(
            text,
            "timestamp: 2026-03-14T09:26:53Z\n\
             model: Random Forest\n\
             health: 87.5\n\
             status: Healthy\n\
             anomalies: 3\n\
             prediction_horizon: 10"
        );
    }

    #[test]
    fn formats_agree_on_timestamp() {
        let r = SummaryRecord {
            timestamp: record().timestamp + chrono::Duration::milliseconds(250),
            ..record()
        };
        let expected = "2026-03-14T09:26:53.250Z";
        let value: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(value["timestamp"], expected);
        assert!(r.to_csv().unwrap().lines().nth(1).unwrap().starts_with(expected));
        assert!(r.to_text().starts_with(&format!("timestamp: {expected}\n")));
    }

    #[test]
    fn render_dispatches_on_format() {
        let r = record();
        assert_eq!(r.render(ReportFormat::Text).unwrap(), r.to_text());
        assert_eq!(r.render(ReportFormat::Json).unwrap(), r.to_json().unwrap());
    }

    #[test]
    fn report_format_parsing_and_file_name() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("Text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Csv.file_name(), "digital_twin_report.csv");
    }
}
