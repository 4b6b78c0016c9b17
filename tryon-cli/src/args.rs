//! Command-line argument definitions for tryon-cli.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Composite a try-on overlay onto a photo or a webcam stream.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct TryOnArgs {
    /// Path to the input photo.
    #[arg(short, long, required_unless_present = "webcam")]
    pub input: Option<PathBuf>,

    /// Landmark sidecar JSON produced by the external detector.
    #[arg(short, long)]
    pub landmarks: Option<PathBuf>,

    /// Accessory or clothing tag (e.g. glasses, watch, m_shirt1).
    #[arg(short, long)]
    pub category: Option<String>,

    /// Specific overlay file within the category folder. Omit to let the
    /// system pick a variant.
    #[arg(long)]
    pub asset: Option<PathBuf>,

    /// Outfit top tag (e.g. m_shirt1, f_blouse).
    #[arg(long, conflicts_with = "category")]
    pub top: Option<String>,

    /// Outfit bottom tag (e.g. m_pant, f_skirt).
    #[arg(long, conflicts_with = "category")]
    pub bottom: Option<String>,

    /// Outfit dress tag (e.g. f_saree, m_suit).
    #[arg(long, conflicts_with = "category")]
    pub dress: Option<String>,

    /// Wearer group: male, female, kid_boy, kid_girl. Inferred from tag
    /// prefixes when omitted.
    #[arg(long)]
    pub wearer: Option<String>,

    /// Root of the overlay asset tree.
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Output file path. Defaults to a collision-free name in the results
    /// directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optional settings JSON. Defaults to `config/tryon_settings.json` when
    /// present, otherwise built-in parameters.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Variant-selection seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format override: png or jpeg.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Write the try-on report as JSON to this path instead of stdout.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Enable webcam loop mode (applies the overlay to captured frames).
    #[arg(long, conflicts_with = "input")]
    pub webcam: bool,

    /// Webcam device index.
    #[arg(long, default_value_t = 0, requires = "webcam")]
    pub webcam_device: u32,

    /// Webcam capture width.
    #[arg(long, default_value_t = 640, requires = "webcam")]
    pub webcam_width: u32,

    /// Webcam capture height.
    #[arg(long, default_value_t = 480, requires = "webcam")]
    pub webcam_height: u32,

    /// Webcam frame rate.
    #[arg(long, default_value_t = 30, requires = "webcam")]
    pub webcam_fps: u32,

    /// Number of frames to process in webcam mode (0 = continuous).
    #[arg(long, default_value_t = 0, requires = "webcam")]
    pub webcam_frames: u32,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,
}
