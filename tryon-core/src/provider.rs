//! Consumed detector interfaces.
//!
//! The landmark detector is an external collaborator: given a frame it
//! returns a fixed-topology point set or signals "no detection". Absence of
//! a subject is `Ok(None)`, never an error; callers skip the overlay and
//! return the frame unchanged. The same shape applies to the hair
//! segmentation oracle used by behind-hair compositing.

use std::{
    path::Path,
    sync::{Arc, mpsc},
    thread,
    time::Duration,
};

use image::{GrayImage, RgbImage};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::TryOnError;
use crate::landmarks::{LandmarkSet, SubjectKind};

/// External landmark detector contract.
pub trait LandmarkProvider {
    /// Detect one subject in the frame.
    ///
    /// `Ok(None)` means no subject was found; an `Err` is reserved for the
    /// detector itself failing (not for "nothing in the photo").
    fn detect(&self, frame: &RgbImage) -> Result<Option<LandmarkSet>, TryOnError>;
}

/// External hair segmentation oracle for behind-hair compositing.
pub trait HairMaskProvider {
    /// Soft hair mask aligned with the frame (255 = hair), if available.
    fn hair_mask(&self, frame: &RgbImage) -> Result<Option<GrayImage>, TryOnError>;
}

impl LandmarkProvider for Box<dyn LandmarkProvider + Send + Sync> {
    fn detect(&self, frame: &RgbImage) -> Result<Option<LandmarkSet>, TryOnError> {
        (**self).detect(frame)
    }
}

/// Provider returning a fixed landmark set regardless of frame content.
///
/// Stands in for the external detector in tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    landmarks: Option<LandmarkSet>,
}

impl StaticProvider {
    pub fn new(landmarks: Option<LandmarkSet>) -> Self {
        Self { landmarks }
    }

    /// A provider that never detects anything.
    pub fn empty() -> Self {
        Self { landmarks: None }
    }
}

impl LandmarkProvider for StaticProvider {
    fn detect(&self, _frame: &RgbImage) -> Result<Option<LandmarkSet>, TryOnError> {
        Ok(self.landmarks.clone())
    }
}

/// Hair oracle returning a fixed mask (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticHairMask {
    mask: Option<GrayImage>,
}

impl StaticHairMask {
    pub fn new(mask: Option<GrayImage>) -> Self {
        Self { mask }
    }
}

impl HairMaskProvider for StaticHairMask {
    fn hair_mask(&self, _frame: &RgbImage) -> Result<Option<GrayImage>, TryOnError> {
        Ok(self.mask.clone())
    }
}

/// One detection result in a landmark sidecar file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkRecord {
    /// Topology the points follow.
    pub subject: SubjectKind,
    /// Whether points are normalized to `[0, 1]` (detector convention) or
    /// already in pixel space.
    #[serde(default)]
    pub normalized: bool,
    /// `[x, y]` pairs, one per topology index.
    pub points: Vec<[f32; 2]>,
}

impl LandmarkRecord {
    /// Materialize the record against a frame's dimensions.
    pub fn to_landmarks(&self, frame_dims: (u32, u32)) -> Result<LandmarkSet, TryOnError> {
        if self.normalized {
            LandmarkSet::from_normalized(self.subject, &self.points, frame_dims.0, frame_dims.1)
        } else {
            let points = self
                .points
                .iter()
                .map(|[x, y]| tryon_utils::Point::new(*x, *y))
                .collect();
            LandmarkSet::from_pixels(self.subject, points)
        }
    }
}

/// Provider backed by a JSON landmark sidecar file.
///
/// The file holds either a single [`LandmarkRecord`] or an array of them
/// (the first is used — one subject per request). This is the offline
/// stand-in for the external detector process.
#[derive(Debug, Clone)]
pub struct JsonLandmarkProvider {
    record: LandmarkRecord,
}

impl JsonLandmarkProvider {
    pub fn from_record(record: LandmarkRecord) -> Self {
        Self { record }
    }

    /// Load a sidecar file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TryOnError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TryOnError::InvalidImage(format!("landmark file {}: {}", path.display(), e))
        })?;

        let record = serde_json::from_str::<LandmarkRecord>(&contents).or_else(|_| {
            serde_json::from_str::<Vec<LandmarkRecord>>(&contents)
                .map_err(|e| {
                    TryOnError::InvalidImage(format!(
                        "landmark file {} is not a record or record list: {}",
                        path.display(),
                        e
                    ))
                })
                .and_then(|records| {
                    records.into_iter().next().ok_or_else(|| {
                        TryOnError::InvalidImage(format!(
                            "landmark file {} holds no records",
                            path.display()
                        ))
                    })
                })
        })?;

        Ok(Self { record })
    }
}

impl LandmarkProvider for JsonLandmarkProvider {
    fn detect(&self, frame: &RgbImage) -> Result<Option<LandmarkSet>, TryOnError> {
        match self.record.to_landmarks(frame.dimensions()) {
            Ok(landmarks) => Ok(Some(landmarks)),
            Err(error) => {
                // A partial point list means the detection failed, which is
                // "no subject", not a hard error.
                warn!("landmark record rejected: {}", error);
                Ok(None)
            }
        }
    }
}

/// Run a provider's `detect` with a bounded timeout.
///
/// Detector latency is the dominant variable cost per request; a detection
/// that outlives `timeout` is reported as a no-detection (with a warning)
/// so one slow frame cannot stall the caller indefinitely.
///
/// # Arguments
///
/// * `provider` - Shared detector instance.
/// * `frame` - Frame to detect on (cloned onto the worker thread).
/// * `timeout` - Upper bound on the detection call.
pub fn detect_with_timeout<P>(
    provider: Arc<P>,
    frame: &RgbImage,
    timeout: Duration,
) -> Result<Option<LandmarkSet>, TryOnError>
where
    P: LandmarkProvider + Send + Sync + 'static,
{
    if timeout.is_zero() {
        return provider.detect(frame);
    }

    let (sender, receiver) = mpsc::channel();
    let worker_frame = frame.clone();
    let worker_provider = Arc::clone(&provider);
    thread::spawn(move || {
        let result = worker_provider.detect(&worker_frame);
        let _ = sender.send(result);
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => {
            warn!("landmark detection exceeded {:?}; treating as no subject", timeout);
            Ok(None)
        }
    }
}

/// Provider wrapper applying [`detect_with_timeout`] to every call.
#[derive(Debug, Clone)]
pub struct TimeoutProvider<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> TimeoutProvider<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<P> LandmarkProvider for TimeoutProvider<P>
where
    P: LandmarkProvider + Send + Sync + 'static,
{
    fn detect(&self, frame: &RgbImage) -> Result<Option<LandmarkSet>, TryOnError> {
        detect_with_timeout(Arc::clone(&self.inner), frame, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::hand;
    use tryon_utils::Point;

    fn hand_record(normalized: bool) -> LandmarkRecord {
        LandmarkRecord {
            subject: SubjectKind::Hand,
            normalized,
            points: vec![[0.5, 0.5]; SubjectKind::Hand.point_count()],
        }
    }

    #[test]
    fn static_provider_round_trips() {
        let points = vec![Point::new(1.0, 2.0); SubjectKind::Hand.point_count()];
        let set = LandmarkSet::from_pixels(SubjectKind::Hand, points).expect("set");
        let provider = StaticProvider::new(Some(set.clone()));
        let frame = RgbImage::new(4, 4);
        assert_eq!(provider.detect(&frame).expect("detect"), Some(set));
        assert_eq!(StaticProvider::empty().detect(&frame).expect("detect"), None);
    }

    #[test]
    fn json_provider_denormalizes_against_frame() {
        let provider = JsonLandmarkProvider::from_record(hand_record(true));
        let frame = RgbImage::new(200, 100);
        let detected = provider.detect(&frame).expect("detect").expect("subject");
        let wrist = detected.point(hand::WRIST).expect("wrist");
        assert!((wrist.x - 100.0).abs() < f32::EPSILON);
        assert!((wrist.y - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_record_is_no_detection() {
        let mut record = hand_record(false);
        record.points.truncate(3);
        let provider = JsonLandmarkProvider::from_record(record);
        let frame = RgbImage::new(64, 64);
        assert!(provider.detect(&frame).expect("detect").is_none());
    }

    #[test]
    fn sidecar_files_parse_single_and_list_forms() {
        let dir = tempfile::TempDir::new().expect("temp dir");

        let single = dir.path().join("single.json");
        std::fs::write(&single, serde_json::to_string(&hand_record(true)).unwrap()).unwrap();
        assert!(JsonLandmarkProvider::from_path(&single).is_ok());

        let list = dir.path().join("list.json");
        std::fs::write(
            &list,
            serde_json::to_string(&vec![hand_record(true)]).unwrap(),
        )
        .unwrap();
        assert!(JsonLandmarkProvider::from_path(&list).is_ok());

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[]").unwrap();
        assert!(JsonLandmarkProvider::from_path(&empty).is_err());
    }

    #[test]
    fn timeout_wrapper_passes_results_through() {
        let points = vec![Point::new(3.0, 4.0); SubjectKind::Hand.point_count()];
        let set = LandmarkSet::from_pixels(SubjectKind::Hand, points).expect("set");
        let provider = Arc::new(StaticProvider::new(Some(set.clone())));
        let frame = RgbImage::new(8, 8);

        let detected = detect_with_timeout(provider, &frame, Duration::from_secs(1))
            .expect("detect");
        assert_eq!(detected, Some(set));
    }

    #[test]
    fn slow_detection_times_out_as_no_subject() {
        struct SlowProvider;
        impl LandmarkProvider for SlowProvider {
            fn detect(&self, _frame: &RgbImage) -> Result<Option<LandmarkSet>, TryOnError> {
                thread::sleep(Duration::from_millis(250));
                Ok(None)
            }
        }

        let frame = RgbImage::new(8, 8);
        let detected =
            detect_with_timeout(Arc::new(SlowProvider), &frame, Duration::from_millis(10))
                .expect("detect");
        assert!(detected.is_none());
    }
}
