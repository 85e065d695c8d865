use std::io::Write;

use thiserror::Error;

use crate::tracker::{SessionStats, TrackerConfig};
use crate::types::TrackingMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads a tracker configuration from a JSON file.
pub fn load_config(file_path: &str) -> Result<TrackerConfig, ConfigError> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Serializes a tracker configuration to a JSON file.
pub fn save_config(output_path: &str, config: &TrackerConfig) -> Result<(), ConfigError> {
    let j = serde_json::to_string_pretty(config)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Writes an end-of-run summary of a tracking session to a text file.
pub fn write_session_report(
    output_path: &str,
    stats: &SessionStats,
    final_mode: TrackingMode,
) -> std::io::Result<()> {
    let mut s = String::new();
    s += "tracking session report\n\n";
    s += format!("final mode: {:?}\n\n", final_mode).as_str();
    s += format!("    ticks:                     {}\n", stats.ticks).as_str();
    s += format!("    poses emitted:             {}\n", stats.emitted).as_str();
    s += format!("    dropped (no frame):        {}\n", stats.no_frame).as_str();
    s += format!("    dropped (bad sample):      {}\n", stats.incomplete_samples).as_str();
    s += format!("    recenters:                 {}\n", stats.recenters).as_str();
    s += format!("    non-orthonormal rotations: {}\n", stats.nonorthonormal_rotations).as_str();
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(s.as_bytes())
}
