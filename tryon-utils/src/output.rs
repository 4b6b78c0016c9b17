//! Helpers for exporting composited frames.
//!
//! Centralizes format selection, encoding, collision-free result naming, and
//! the base64 data-URL payloads the realtime loop emits, so the CLI and any
//! embedding service share a single implementation.

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{
    ExtendedColorType, ImageEncoder, RgbImage,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};
use rand::Rng;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

/// Canonical image formats supported by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// Immutable export configuration.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub jpeg_quality: u8,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            jpeg_quality: 90,
        }
    }
}

/// Encode a frame into a byte payload in the requested format.
///
/// # Arguments
///
/// * `frame` - The frame to encode.
/// * `options` - Format and quality selection.
pub fn encode_image(frame: &RgbImage, options: &OutputOptions) -> Result<Vec<u8>> {
    let (width, height) = frame.dimensions();
    let mut bytes = Vec::new();
    match options.format {
        OutputFormat::Png => {
            PngEncoder::new(&mut bytes)
                .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgb8)
                .context("failed to encode PNG")?;
        }
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut bytes, options.jpeg_quality.clamp(1, 100))
                .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgb8)
                .context("failed to encode JPEG")?;
        }
    }
    Ok(bytes)
}

/// Save a frame to `destination`, creating parent directories as needed.
///
/// # Arguments
///
/// * `frame` - The frame to save.
/// * `destination` - Target file path.
/// * `options` - Format and quality selection.
pub fn save_frame(frame: &RgbImage, destination: &Path, options: &OutputOptions) -> Result<()> {
    if let Some(parent) = destination.parent().filter(|p| !p.exists()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    let file = File::create(destination)
        .with_context(|| format!("failed to create {}", destination.display()))?;
    let mut writer = BufWriter::new(file);
    let (width, height) = frame.dimensions();
    match options.format {
        OutputFormat::Png => PngEncoder::new(&mut writer)
            .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgb8)
            .with_context(|| format!("failed to write PNG {}", destination.display()))?,
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut writer, options.jpeg_quality.clamp(1, 100))
                .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgb8)
                .with_context(|| format!("failed to write JPEG {}", destination.display()))?
        }
    }
    Ok(())
}

/// Produce a result filename that will not collide with concurrent requests.
///
/// Combines the unix timestamp with a random suffix, e.g.
/// `tryon_1736630400_a1b2c3d4.png`.
///
/// # Arguments
///
/// * `prefix` - Leading name component (e.g. the category tag).
/// * `format` - Output format, which determines the extension.
pub fn unique_output_name(prefix: &str, format: OutputFormat) -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let suffix: u32 = rand::thread_rng().gen();
    format!(
        "{}_{}_{:08x}.{}",
        prefix,
        seconds,
        suffix,
        format.extension()
    )
}

/// Encode a frame as a `data:` URL for realtime frame responses.
///
/// # Arguments
///
/// * `frame` - The frame to encode.
/// * `options` - Format and quality selection.
pub fn frame_to_data_url(frame: &RgbImage, options: &OutputOptions) -> Result<String> {
    let bytes = encode_image(frame, options)?;
    Ok(format!(
        "data:{};base64,{}",
        options.format.mime_type(),
        BASE64.encode(bytes)
    ))
}
