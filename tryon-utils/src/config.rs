//! Shared configuration types consumed across the try-on workspace.
//!
//! These structures provide a common representation for detection, asset, and
//! export settings that can be serialized to disk and reused by the CLI and
//! any embedding service.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Parameters controlling the landmark detection step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionSettings {
    /// Minimum detector confidence for a subject to be accepted.
    pub min_confidence: f32,
    /// Bounded timeout around a single detector call, in milliseconds.
    /// Zero disables the timeout wrapper.
    pub timeout_ms: u64,
    /// Reuse the most recent valid landmark set when a realtime frame has no
    /// detection. Visual continuity only; single-image requests ignore this.
    pub reuse_last_landmarks: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            timeout_ms: 2_000,
            reuse_last_landmarks: true,
        }
    }
}

/// Settings for exporting composited results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format: "png" or "jpeg".
    pub format: String,
    /// JPEG quality (1-100, only used when format is jpeg).
    pub jpeg_quality: u8,
    /// Directory where composited results are written.
    pub results_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            jpeg_quality: 90,
            results_dir: "results".to_string(),
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }

    /// Update the level string from a `LevelFilter` value.
    pub fn set_level(&mut self, level: LevelFilter) {
        let label = match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        };
        self.level = label.to_string();
    }
}

/// Persistent application settings consumed by the CLI front end.
///
/// This struct aggregates all user-configurable parameters, allowing them to
/// be loaded from and saved to a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Root directory of the overlay asset tree (one subfolder per category).
    pub asset_root: String,
    /// Landmark detection parameters.
    pub detection: DetectionSettings,
    /// Result export parameters.
    pub output: OutputSettings,
    /// Telemetry and diagnostics preferences.
    pub telemetry: TelemetrySettings,
    /// Seed for overlay variant selection. `None` picks a fresh seed per run;
    /// setting it makes variant choice reproducible.
    pub seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            asset_root: "assets".to_string(),
            detection: DetectionSettings::default(),
            output: OutputSettings::default(),
            telemetry: TelemetrySettings::default(),
            seed: None,
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file.
    ///
    /// If the file does not exist or cannot be parsed, an error is returned.
    /// The loaded settings are validated before being handed back; a
    /// malformed configuration is a startup failure, never a per-request one.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON.
    ///
    /// This will overwrite the file if it already exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        let path = path.as_ref();
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// Reject configurations that cannot possibly produce valid output.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.asset_root.trim().is_empty(), "asset_root is empty");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.detection.min_confidence),
            "detection.min_confidence must be within [0, 1], got {}",
            self.detection.min_confidence
        );
        anyhow::ensure!(
            (1..=100).contains(&self.output.jpeg_quality),
            "output.jpeg_quality must be within [1, 100], got {}",
            self.output.jpeg_quality
        );
        let format = self.output.format.to_ascii_lowercase();
        anyhow::ensure!(
            matches!(format.as_str(), "png" | "jpg" | "jpeg"),
            "output.format must be 'png' or 'jpeg', got '{}'",
            self.output.format
        );
        Ok(())
    }
}

/// Returns the default path for persisted settings (`config/tryon_settings.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/tryon_settings.json"))
        .unwrap_or_else(|_| PathBuf::from("config/tryon_settings.json"))
}
