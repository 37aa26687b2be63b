//! Mean-based multi-sensor fusion.

use twin_core::{DenseFrame, Result, TwinError};

/// Reduce the selected sensors to a single signal.
///
/// One sensor passes through unchanged; several are averaged row by row.
pub fn fuse(frame: &DenseFrame, selection: &[String]) -> Result<Vec<f64>> {
    let columns: Vec<&[f64]> = selection
        .iter()
        .map(|name| {
            frame
                .column(name)
                .ok_or_else(|| TwinError::UnknownSensor(name.clone()))
        })
        .collect::<Result<_>>()?;

    match columns.as_slice() {
        [] => Err(TwinError::EmptySelection),
        [single] => Ok(single.to_vec()),
        many => {
            let k = many.len() as f64;
            Ok((0..frame.rows())
                .map(|row| many.iter().map(|c| c[row]).sum::<f64>() / k)
                .collect())
        }
    }
}
