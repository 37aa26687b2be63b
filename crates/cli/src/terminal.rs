use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use twin_compute::PipelineRun;
use twin_core::StatusLevel;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const LABEL: Color = Color::DarkGrey;
    const HEALTHY: Color = Color::Green;
    const WARNING: Color = Color::Yellow;
    const CRITICAL: Color = Color::Red;
    const INSIGHT: Color = Color::Cyan;
}

fn status_color(status: StatusLevel) -> Color {
    match status {
        StatusLevel::Healthy => Colors::HEALTHY,
        StatusLevel::Warning => Colors::WARNING,
        StatusLevel::Critical => Colors::CRITICAL,
    }
}

/// Human-facing run summary on stdout.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    fn kv(&self, label: &str, value: String) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::LABEL),
            Print(format!("{label:<16}")),
            ResetColor,
            Print(value),
            Print("\n"),
        )?;
        Ok(())
    }

    pub fn print_run(&self, run: &PipelineRun) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Hybrid Digital Twin"),
            ResetColor,
            SetForegroundColor(Colors::LABEL),
            Print(format!("  run {}\n", run.run_id)),
            ResetColor,
        )?;

        let q = &run.quality;
        self.kv("Model", run.summary.model.to_string())?;
        self.kv("Samples", run.fused.len().to_string())?;
        self.kv("Missing", format!("{:.2}%", q.missing_pct))?;
        self.kv("Noise", format!("{:.3}", q.noise_level))?;
        self.kv("Outliers", format!("{:.2}%", q.outlier_pct))?;
        self.kv("Data quality", format!("{:.1}", q.quality_score))?;
        self.kv("Mean error", format!("{:.4}", run.anomalies.mean_error()))?;
        self.kv("Health", format!("{:.1}", run.anomalies.health))?;
        self.kv("Anomalies", run.anomalies.anomaly_count().to_string())?;

        execute!(
            stdout,
            SetForegroundColor(Colors::LABEL),
            Print(format!("{:<16}", "Status")),
            SetForegroundColor(status_color(run.status)),
            Print(run.status.as_str()),
            ResetColor,
            Print("\n\n"),
        )?;

        for line in &run.insights {
            execute!(
                stdout,
                SetForegroundColor(Colors::INSIGHT),
                Print("  * "),
                ResetColor,
                Print(line),
                Print("\n"),
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::LABEL),
            Print(msg),
            Print("\n"),
            ResetColor,
        )?;
        Ok(())
    }

    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::CRITICAL),
            Print(format!("error: {msg}\n")),
            ResetColor,
        )?;
        Ok(())
    }
}
