//! Data quality estimation: missing cells, noise, z-score outliers, and
//! mean imputation over the selected sensors.
//!
//! Standard deviations here use the sample (`n - 1`) convention.

use tracing::{debug, warn};

use twin_core::{Column, DenseFrame, RawFrame, Result, TwinError};

use crate::stats::{mean, sample_std};

/// Default |z| above which a cell counts as an outlier.
pub const DEFAULT_OUTLIER_Z: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySettings {
    pub outlier_z: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            outlier_z: DEFAULT_OUTLIER_Z,
        }
    }
}

/// Quality metrics over the selected sensors plus the imputed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    /// Percentage of missing cells, 0..=100.
    pub missing_pct: f64,
    /// Mean of per-column standard deviations after imputation.
    pub noise_level: f64,
    /// Percentage of cells with |z| above the outlier threshold, 0..=100.
    pub outlier_pct: f64,
    /// `max(0, 100 - missing_pct - outlier_pct)`.
    pub quality_score: f64,
    pub imputed: DenseFrame,
}

impl QualityReport {
    fn degenerate() -> Self {
        Self {
            missing_pct: 0.0,
            noise_level: 0.0,
            outlier_pct: 0.0,
            quality_score: quality_score(0.0, 0.0),
            imputed: DenseFrame::default(),
        }
    }
}

/// Combine missing and outlier percentages. The two may overlap; the result
/// is clamped at zero.
pub fn quality_score(missing_pct: f64, outlier_pct: f64) -> f64 {
    (100.0 - missing_pct - outlier_pct).max(0.0)
}

/// Look up each selected column, failing on the first unknown name.
fn resolve<'a>(frame: &'a RawFrame, selection: &[String]) -> Result<Vec<&'a Column>> {
    selection
        .iter()
        .map(|name| {
            frame
                .column(name)
                .ok_or_else(|| TwinError::UnknownSensor(name.clone()))
        })
        .collect()
}

/// Percentage of missing cells across the selected columns.
pub fn missing_percentage(frame: &RawFrame, selection: &[String]) -> Result<f64> {
    let columns = resolve(frame, selection)?;
    let total = frame.rows() * columns.len();
    if total == 0 {
        return Ok(0.0);
    }
    let missing: usize = columns.iter().map(|c| c.missing_count()).sum();
    Ok(missing as f64 / total as f64 * 100.0)
}

/// Assess the selected sensors and mean-impute their gaps.
///
/// An empty selection yields a degenerate all-zero report. A selected column
/// with no observed values cannot be imputed and fails with `AllMissing`.
pub fn assess(
    frame: &RawFrame,
    selection: &[String],
    settings: &QualitySettings,
) -> Result<QualityReport> {
    let columns = resolve(frame, selection)?;
    if columns.is_empty() {
        return Ok(QualityReport::degenerate());
    }

    let rows = frame.rows();
    let total_cells = rows * columns.len();
    let missing_pct = missing_percentage(frame, selection)?;

    let mut imputed = Vec::with_capacity(columns.len());
    let mut std_sum = 0.0;
    let mut outliers = 0usize;

    for column in columns {
        let observed: Vec<f64> = column.values.iter().flatten().copied().collect();
        if observed.is_empty() && rows > 0 {
            return Err(TwinError::AllMissing {
                column: column.name.clone(),
            });
        }

        let fill = mean(&observed);
        let filled: Vec<f64> = column.values.iter().map(|v| v.unwrap_or(fill)).collect();
        let col_mean = mean(&filled);
        let col_std = sample_std(&filled);
        std_sum += col_std;

        let col_outliers = if col_std > 0.0 {
            filled
                .iter()
                .filter(|v| ((*v - col_mean) / col_std).abs() > settings.outlier_z)
                .count()
        } else {
            warn!(column = %column.name, "zero-variance column, skipping outlier check");
            0
        };
        outliers += col_outliers;

        debug!(
            column = %column.name,
            missing = column.missing_count(),
            std = col_std,
            outliers = col_outliers,
            "column quality"
        );
        imputed.push((column.name.clone(), filled));
    }

    let width = imputed.len();
    let outlier_pct = if total_cells > 0 {
        outliers as f64 / total_cells as f64 * 100.0
    } else {
        0.0
    };

    Ok(QualityReport {
        missing_pct,
        noise_level: std_sum / width as f64,
        outlier_pct,
        quality_score: quality_score(missing_pct, outlier_pct),
        imputed: DenseFrame::new(imputed),
    })
}
