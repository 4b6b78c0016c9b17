//! Shared fixtures for CLI integration tests.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage, Rgba, RgbaImage};

pub const HAND_POINTS: usize = 21;

/// Write a plain gray input photo.
pub fn write_frame(path: &Path, width: u32, height: u32) {
    let frame = RgbImage::from_pixel(width, height, Rgb([120, 120, 120]));
    frame.save(path).expect("write input frame");
}

/// Write a hand landmark sidecar with the wrist at (200, 300) and the
/// middle-finger base at (200, 250).
pub fn write_hand_landmarks(path: &Path) {
    let mut points = vec![[50.0f32, 50.0f32]; HAND_POINTS];
    points[0] = [200.0, 300.0]; // wrist
    points[9] = [200.0, 250.0]; // middle-finger MCP
    let record = serde_json::json!({
        "subject": "hand",
        "normalized": false,
        "points": points,
    });
    std::fs::write(path, serde_json::to_string(&record).unwrap()).expect("write landmarks");
}

/// Write a pose landmark sidecar for a subject standing mid-frame.
pub fn write_pose_landmarks(path: &Path) {
    let mut points = vec![[50.0f32, 50.0f32]; 33];
    points[11] = [140.0, 200.0]; // left shoulder
    points[12] = [260.0, 200.0]; // right shoulder
    points[23] = [150.0, 350.0]; // left hip
    points[24] = [250.0, 350.0]; // right hip
    points[31] = [155.0, 395.0]; // left toe
    points[32] = [245.0, 395.0]; // right toe
    let record = serde_json::json!({
        "subject": "pose",
        "normalized": false,
        "points": points,
    });
    std::fs::write(path, serde_json::to_string(&record).unwrap()).expect("write landmarks");
}

/// Create an asset tree containing a single solid-color overlay.
pub fn write_asset(root: &Path, category_slug: &str, name: &str, rgba: [u8; 4]) -> PathBuf {
    let folder = root.join(category_slug);
    std::fs::create_dir_all(&folder).expect("category dir");
    let path = folder.join(name);
    let asset = RgbaImage::from_pixel(90, 90, Rgba(rgba));
    asset.save(&path).expect("write asset");
    path
}

/// Invoke the CLI binary with the given arguments.
pub fn run_cli(args: &[&str]) -> std::process::Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_tryon-cli"))
        .args(args)
        .output()
        .expect("execute CLI")
}

/// Assert success, printing stderr on failure for debuggability.
pub fn assert_success(output: &std::process::Output, message: &str) {
    if !output.status.success() {
        eprintln!("CLI stderr: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "{}", message);
}
