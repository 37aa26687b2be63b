//! Rule-based reasoning lines attached to each run.

pub const DEGRADED_HEALTH: f64 = 60.0;
pub const FREQUENT_ANOMALIES: usize = 15;
pub const ELEVATED_NOISE: f64 = 10.0;

/// Explain a run's outcome in plain sentences, most severe first.
pub fn structured_reasoning(health: f64, anomalies: usize, noise: f64) -> Vec<String> {
    let mut reasons = Vec::new();

    if health < DEGRADED_HEALTH {
        reasons.push("System performance severely degraded.".to_string());
    }
    if anomalies > FREQUENT_ANOMALIES {
        reasons.push("High anomaly frequency detected.".to_string());
    }
    if noise > ELEVATED_NOISE {
        reasons.push("Elevated signal noise observed.".to_string());
    }
    if reasons.is_empty() {
        reasons.push("System operating within normal limits.".to_string());
    }

    reasons
}
