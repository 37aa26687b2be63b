use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

use twin_compute::{ModelSettings, PipelineSettings};
use twin_core::RawFrame;

/// Write `contents` to `sensors.csv` inside a fresh temp directory.
///
/// The directory handle must outlive any use of the returned path.
pub fn write_csv(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sensors.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

/// Smooth three-sensor frame with a single spike in `temperature` at `spike_at`.
pub fn plant_frame(rows: usize, spike_at: Option<usize>) -> RawFrame {
    let mut csv = String::from("timestamp,temperature,vibration,pressure\n");
    for i in 0..rows {
        let t = i as f64;
        let mut temperature = 50.0 + 0.02 * t + 0.1 * (t * 0.7).sin();
        if spike_at == Some(i) {
            temperature += 40.0;
        }
        let vibration = 30.0 + 0.1 * (t * 1.3).cos();
        let pressure = 100.0 + 0.05 * (t * 0.5).sin();
        csv.push_str(&format!(
            "2026-01-01T00:{:02}:{:02},{temperature},{vibration},{pressure}\n",
            i / 60,
            i % 60
        ));
    }
    RawFrame::from_csv_reader(csv.as_bytes()).unwrap()
}

/// Small, fast learned-model settings for tests.
pub fn fast_settings() -> PipelineSettings {
    PipelineSettings {
        models: ModelSettings {
            forest_trees: 10,
            window: 5,
            sequence_epochs: 2,
            sequence_hidden: 6,
            autoencoder_epochs: 3,
            learning_rate: 0.01,
            ..ModelSettings::default()
        },
        ..PipelineSettings::default()
    }
}

pub fn sensors(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
