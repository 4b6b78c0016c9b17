mod args;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use args::TryOnArgs;
use tryon_core::{
    AssetLibrary, AssetSelection, FrameRing, JsonLandmarkProvider, LandmarkProvider,
    OutfitSelection, StaticProvider, TimeoutProvider, TryOnPipeline, TryOnReport, Wearer,
};
use tryon_utils::{
    AppSettings, OutputFormat, OutputOptions, configure_telemetry, init_logging, normalize_path,
    output::{save_frame, unique_output_name},
    webcam::FrameSource,
};

type BoxedProvider = Box<dyn LandmarkProvider + Send + Sync>;

/// Result record emitted for each processed image.
#[derive(Debug, Serialize)]
struct RunRecord {
    input: Option<String>,
    output: String,
    report: TryOnReport,
}

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info)?;
    let args = TryOnArgs::parse();

    let settings = load_settings(args.config.as_ref())?;
    let telemetry_enabled = args.telemetry || settings.telemetry.enabled;
    let telemetry_level = args
        .telemetry_level
        .as_ref()
        .map(|level| tryon_utils::TelemetrySettings {
            enabled: true,
            level: level.clone(),
        })
        .unwrap_or_else(|| settings.telemetry.clone())
        .level_filter();
    configure_telemetry(telemetry_enabled, telemetry_level);

    let assets_root = args
        .assets_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.asset_root));
    let seed = args.seed.or(settings.seed);

    let provider = build_provider(&args, &settings)?;
    let mut pipeline = TryOnPipeline::new(provider, AssetLibrary::new(&assets_root), seed)
        .context("failed to assemble try-on pipeline")?;

    let output_options = output_options(&args, &settings)?;
    let results_dir = PathBuf::from(&settings.output.results_dir);

    if args.webcam {
        run_webcam(&args, &mut pipeline, &output_options, &results_dir)
    } else {
        run_single(&args, &mut pipeline, &output_options, &results_dir)
    }
}

/// Load settings from `--config`, the default path, or built-in defaults.
fn load_settings(config: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config {
        let path = normalize_path(path)?;
        info!("Loading settings from {}", path.display());
        return AppSettings::load_from_path(path);
    }

    let default_path = tryon_utils::config::default_settings_path();
    if default_path.exists() {
        info!("Loading settings from {}", default_path.display());
        AppSettings::load_from_path(default_path)
    } else {
        Ok(AppSettings::default())
    }
}

/// Build the landmark provider: a JSON sidecar when given, wrapped in the
/// configured detection timeout.
fn build_provider(args: &TryOnArgs, settings: &AppSettings) -> Result<BoxedProvider> {
    let inner: BoxedProvider = match args.landmarks.as_ref() {
        Some(path) => {
            let path = normalize_path(path)?;
            Box::new(
                JsonLandmarkProvider::from_path(&path)
                    .with_context(|| format!("failed to load landmarks {}", path.display()))?,
            )
        }
        None => {
            if !args.webcam {
                bail!("--landmarks is required for single-image mode");
            }
            warn!("no landmark file given; frames will pass through unchanged");
            Box::new(StaticProvider::empty())
        }
    };

    if settings.detection.timeout_ms > 0 {
        let timeout = Duration::from_millis(settings.detection.timeout_ms);
        Ok(Box::new(TimeoutProvider::new(inner, timeout)))
    } else {
        Ok(inner)
    }
}

fn output_options(args: &TryOnArgs, settings: &AppSettings) -> Result<OutputOptions> {
    let format: OutputFormat = args
        .format
        .as_deref()
        .unwrap_or(&settings.output.format)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    Ok(OutputOptions {
        format,
        jpeg_quality: settings.output.jpeg_quality,
    })
}

fn parse_wearer(value: &str) -> Result<Wearer> {
    match value.trim().to_ascii_lowercase().as_str() {
        "male" | "m" => Ok(Wearer::Male),
        "female" | "f" => Ok(Wearer::Female),
        "kid_boy" | "kidboy" | "kb" => Ok(Wearer::KidBoy),
        "kid_girl" | "kidgirl" | "kg" => Ok(Wearer::KidGirl),
        other => bail!("unknown wearer group '{other}'"),
    }
}

/// Run one try-on over a single photo.
fn run_single(
    args: &TryOnArgs,
    pipeline: &mut TryOnPipeline<BoxedProvider>,
    output_options: &OutputOptions,
    results_dir: &Path,
) -> Result<()> {
    let input = args
        .input
        .as_ref()
        .expect("clap enforces --input outside webcam mode");
    let input = normalize_path(input)?;

    let mut frame = tryon_utils::load_image(&input)?.to_rgb8();
    let report = apply_request(args, pipeline, &mut frame)?;

    if report.no_subject {
        warn!("no subject detected; writing the unchanged frame");
    }

    let destination = match args.output.as_ref() {
        Some(path) => path.clone(),
        None => {
            let prefix = args.category.as_deref().unwrap_or("outfit");
            results_dir.join(unique_output_name(prefix, output_options.format))
        }
    };
    save_frame(&frame, &destination, output_options)?;
    info!("Saved result to {}", destination.display());

    emit_record(
        args,
        RunRecord {
            input: Some(input.display().to_string()),
            output: destination.display().to_string(),
            report,
        },
    )
}

/// Apply the requested accessory or outfit to a frame.
fn apply_request(
    args: &TryOnArgs,
    pipeline: &mut TryOnPipeline<BoxedProvider>,
    frame: &mut image::RgbImage,
) -> Result<TryOnReport> {
    if let Some(category) = args.category.as_ref() {
        let selection = args
            .asset
            .as_ref()
            .map(|path| AssetSelection::Named(path.clone()));
        return pipeline
            .apply_tag(frame, category, selection)
            .with_context(|| format!("try-on failed for category '{category}'"));
    }

    let wearer = args.wearer.as_deref().map(parse_wearer).transpose()?;
    let selection = OutfitSelection::from_tags(
        args.top.as_deref(),
        args.bottom.as_deref(),
        args.dress.as_deref(),
        wearer,
    )
    .context("invalid outfit selection")?;
    if selection.is_empty() {
        bail!("nothing selected: pass --category or at least one of --top/--bottom/--dress");
    }
    pipeline
        .apply_outfit(frame, &selection)
        .context("outfit try-on failed")
}

/// Capture frames from the webcam, apply the overlay, and save each result.
fn run_webcam(
    args: &TryOnArgs,
    pipeline: &mut TryOnPipeline<BoxedProvider>,
    output_options: &OutputOptions,
    results_dir: &Path,
) -> Result<()> {
    let mut source = FrameSource::open(
        args.webcam_device,
        args.webcam_width,
        args.webcam_height,
        args.webcam_fps,
    )?;
    info!(
        "Capturing from device {} at {:?}",
        source.device_index(),
        source.resolution()
    );

    let ring = FrameRing::new();
    let mut processed: u32 = 0;
    loop {
        let captured = match source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("frame capture failed: {e}; stopping");
                break;
            }
        };
        // Mirror for a natural selfie view.
        let frame = image::imageops::flip_horizontal(&captured);
        ring.push(frame);

        let Some(mut frame) = ring.latest() else {
            continue;
        };
        let report = apply_request(args, pipeline, &mut frame)?;
        if !report.warnings.is_empty() {
            info!("frame {}: {} warnings", processed, report.warnings.len());
        }

        let destination = results_dir.join(format!(
            "frame_{:05}.{}",
            processed,
            output_options.format.extension()
        ));
        save_frame(&frame, &destination, output_options)?;

        processed += 1;
        if args.webcam_frames > 0 && processed >= args.webcam_frames {
            break;
        }
    }

    info!("Processed {} frames into {}", processed, results_dir.display());
    source.stop()?;
    Ok(())
}

fn emit_record(args: &TryOnArgs, record: RunRecord) -> Result<()> {
    let payload = serde_json::to_string_pretty(&record).context("failed to serialize report")?;
    match args.json.as_ref() {
        Some(path) => {
            std::fs::write(path, payload)
                .with_context(|| format!("failed to write report {}", path.display()))?;
            info!("Wrote report to {}", path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}
