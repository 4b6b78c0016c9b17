//! Bounded ring of recent frames for the realtime loop.
//!
//! A fixed-capacity ring overwritten oldest-first and read as "latest
//! available". One writer (the capture loop) and one reader (the request
//! handler) share it behind a mutex; smoothing jitter is the only purpose,
//! so a reader seeing a slightly stale frame is fine.

use std::sync::Mutex;

use image::RgbImage;

/// Number of frames retained.
pub const RING_CAPACITY: usize = 5;

#[derive(Debug, Default)]
struct RingInner {
    slots: Vec<RgbImage>,
    next: usize,
}

/// Mutex-guarded fixed-size frame ring.
#[derive(Debug, Default)]
pub struct FrameRing {
    inner: Mutex<RingInner>,
}

impl FrameRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame, evicting the oldest once the ring is full.
    pub fn push(&self, frame: RgbImage) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.slots.len() < RING_CAPACITY {
            inner.slots.push(frame);
            inner.next = inner.slots.len() % RING_CAPACITY;
        } else {
            let index = inner.next;
            inner.slots[index] = frame;
            inner.next = (index + 1) % RING_CAPACITY;
        }
    }

    /// Most recently pushed frame, if any.
    pub fn latest(&self) -> Option<RgbImage> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.slots.is_empty() {
            return None;
        }
        let index = if inner.slots.len() < RING_CAPACITY {
            inner.slots.len() - 1
        } else {
            (inner.next + RING_CAPACITY - 1) % RING_CAPACITY
        };
        inner.slots.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn marker_frame(value: u8) -> RgbImage {
        RgbImage::from_pixel(2, 2, Rgb([value, value, value]))
    }

    #[test]
    fn empty_ring_has_no_latest() {
        let ring = FrameRing::new();
        assert!(ring.latest().is_none());
        assert!(ring.is_empty());
    }

    #[test]
    fn latest_tracks_the_most_recent_push() {
        let ring = FrameRing::new();
        for value in 0..3u8 {
            ring.push(marker_frame(value));
        }
        let latest = ring.latest().expect("latest");
        assert_eq!(latest.get_pixel(0, 0).0, [2, 2, 2]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn ring_overwrites_oldest_first() {
        let ring = FrameRing::new();
        for value in 0..8u8 {
            ring.push(marker_frame(value));
        }
        assert_eq!(ring.len(), RING_CAPACITY);
        let latest = ring.latest().expect("latest");
        assert_eq!(latest.get_pixel(0, 0).0, [7, 7, 7]);
    }

    #[test]
    fn concurrent_push_and_read_do_not_poison() {
        use std::sync::Arc;
        let ring = Arc::new(FrameRing::new());
        let writer = {
            let ring = Arc::clone(&ring);
            std::thread::spawn(move || {
                for value in 0..50u8 {
                    ring.push(marker_frame(value));
                }
            })
        };
        for _ in 0..50 {
            let _ = ring.latest();
        }
        writer.join().expect("writer thread");
        assert!(!ring.is_empty());
    }
}
