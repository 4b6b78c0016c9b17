//! Common helpers shared across the try-on crates.

/// Application configuration and settings management.
pub mod config;
/// Test fixture loading and path resolution.
pub mod fixtures;
/// Image loading, decoding, and channel-layout helpers.
pub mod image_utils;
/// Result export helpers (encoding, collision-free naming, data URLs).
pub mod output;
/// Single 2D point with the vector operations the placement math needs.
pub mod point;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;
/// Webcam capture for the realtime try-on loop.
pub mod webcam;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use config::{AppSettings, DetectionSettings, OutputSettings, TelemetrySettings};
pub use fixtures::{fixture_path, fixtures_dir, load_fixture_image, load_fixture_json};
pub use image_utils::{decode_image, ensure_rgba, load_image};
pub use output::{
    OutputFormat, OutputOptions, encode_image, frame_to_data_url, save_frame, unique_output_name,
};
pub use point::Point;
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    timing_guard, timing_guard_if,
};

/// Initialize logging once for CLI environments.
///
/// This function respects the `RUST_LOG` environment variable if it is set.
/// Otherwise, it falls back to the provided default filter level.
///
/// # Arguments
///
/// * `default_filter` - The `LevelFilter` to use if `RUST_LOG` is not set.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module("tryon::telemetry", LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
///
/// # Arguments
///
/// * `path` - The path to validate and normalize.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
