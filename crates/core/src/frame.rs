//! Tabular sensor data: the raw frame read from CSV (may contain gaps) and
//! the dense frame produced by imputation.

use std::io::Read;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::error::{Result, TwinError};

/// Cell tokens treated as missing in addition to the empty string.
const MISSING_TOKENS: &[&str] = &["na", "n/a", "nan", "null", "none"];

/// A named numeric channel, one value per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column with no missing cells.
    pub fn dense(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Some).collect())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Rows are time steps, columns are numeric channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    columns: Vec<Column>,
}

impl RawFrame {
    /// Build a frame from columns. All columns must have the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
                return Err(TwinError::Config(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.values.len(),
                    rows
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Read a CSV document with a header row, keeping only numeric columns.
    ///
    /// A column is numeric when every non-missing cell parses as `f64`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut cells: Vec<Vec<Option<f64>>> = vec![Vec::new(); headers.len()];
        let mut numeric = vec![true; headers.len()];

        for record in rdr.records() {
            let record = record?;
            for (i, slot) in cells.iter_mut().enumerate() {
                let raw = record.get(i).unwrap_or("");
                if is_missing(raw) {
                    slot.push(None);
                    continue;
                }
                match raw.parse::<f64>() {
                    Ok(v) => slot.push(Some(v)),
                    Err(_) => {
                        numeric[i] = false;
                        slot.push(None);
                    }
                }
            }
        }

        let columns: Vec<Column> = headers
            .into_iter()
            .zip(cells)
            .zip(numeric.iter())
            .filter_map(|((name, values), &is_numeric)| {
                if is_numeric {
                    Some(Column::new(name, values))
                } else {
                    debug!(column = %name, "dropping non-numeric column");
                    None
                }
            })
            .collect();

        if columns.is_empty() {
            return Err(TwinError::NoNumericColumns);
        }

        let frame = Self::new(columns)?;
        info!(
            rows = frame.rows(),
            columns = frame.columns.len(),
            "loaded numeric frame"
        );
        Ok(frame)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// First two numeric columns, the default sensor selection.
    pub fn default_selection(&self) -> Vec<String> {
        self.columns.iter().take(2).map(|c| c.name.clone()).collect()
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || MISSING_TOKENS.contains(&raw.to_ascii_lowercase().as_str())
}

/// A frame with no missing cells, restricted to the selected sensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseFrame {
    columns: Vec<(String, Vec<f64>)>,
}

impl DenseFrame {
    pub fn new(columns: Vec<(String, Vec<f64>)>) -> Self {
        Self { columns }
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, v)| v.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

/// Default row count of the simulated dataset.
pub const SIMULATED_ROWS: usize = 200;

/// Synthetic three-sensor dataset: temperature, vibration and pressure, each
/// a constant baseline plus unit Gaussian noise.
pub fn simulated_frame(rows: usize, seed: u64) -> RawFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut channel = |base: f64| -> Vec<Option<f64>> {
        (0..rows).map(|_| Some(base + rng.sample::<f64, _>(StandardNormal))).collect()
    };
    let temperature = channel(50.0);
    let vibration = channel(30.0);
    let pressure = channel(100.0);

    RawFrame {
        columns: vec![
            Column::new("temperature", temperature),
            Column::new("vibration", vibration),
            Column::new("pressure", pressure),
        ],
    }
}
