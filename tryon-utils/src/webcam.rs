//! Webcam capture for the realtime try-on loop.

use anyhow::{Context, Result, anyhow};
use image::{ImageBuffer, Rgb, RgbImage};
use log::{debug, info, warn};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};

/// Represents a webcam device with capture capabilities.
pub struct FrameSource {
    camera: Camera,
    device_index: u32,
    resolution: (u32, u32),
}

impl FrameSource {
    /// Open a capture device.
    ///
    /// # Arguments
    ///
    /// * `device_index` - Camera device index (0 for default camera)
    /// * `width` - Requested frame width (may be adjusted by driver)
    /// * `height` - Requested frame height (may be adjusted by driver)
    /// * `fps` - Requested frames per second
    pub fn open(device_index: u32, width: u32, height: u32, fps: u32) -> Result<Self> {
        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        debug!(
            "Opening capture device {} with requested resolution {}x{} @ {} fps",
            device_index, width, height, fps
        );

        let mut camera = Camera::new(index, requested)
            .with_context(|| format!("failed to open capture device {}", device_index))?;

        camera
            .open_stream()
            .context("failed to open capture stream")?;

        // Resolution/fps hints may be rejected by some cameras; keep going
        // with the driver default when they are.
        if let Err(e) = camera.set_resolution(Resolution::new(width, height)) {
            warn!(
                "could not set resolution {}x{}: {}; using camera default",
                width, height, e
            );
        }
        if let Err(e) = camera.set_frame_rate(fps) {
            warn!("could not set frame rate {} fps: {}; using camera default", fps, e);
        }

        let actual = camera.resolution();
        info!(
            "capture device {} opened: {}x{} @ {} fps",
            device_index,
            actual.width(),
            actual.height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            device_index,
            resolution: (actual.width(), actual.height()),
        })
    }

    /// Capture a single frame as an RGB buffer.
    pub fn capture_frame(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().context("failed to capture frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("failed to decode frame")?;

        let (width, height) = self.resolution;
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, decoded.to_vec())
                .ok_or_else(|| anyhow!("capture buffer size does not match resolution"))?;
        Ok(buffer)
    }

    /// Returns the actual resolution being used by the device.
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Returns the device index of this capture source.
    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    /// Stops the stream and releases the device.
    pub fn stop(mut self) -> Result<()> {
        self.camera
            .stop_stream()
            .context("failed to stop capture stream")?;
        info!("capture device {} stopped", self.device_index);
        Ok(())
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("failed to stop capture stream in drop: {}", e);
        }
    }
}

/// Lists all available capture devices on the system.
///
/// Returns a vector of tuples containing (device_index, device_name).
pub fn list_devices() -> Result<Vec<(u32, String)>> {
    let devices =
        query(nokhwa::utils::ApiBackend::Auto).context("failed to query capture devices")?;

    Ok(devices
        .iter()
        .enumerate()
        .map(|(idx, info)| (idx as u32, info.human_name().to_string()))
        .collect())
}
