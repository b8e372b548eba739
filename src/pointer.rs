//! Smoothed Pointer Tracker
//!
//! Converts raw pointer/touch samples into a normalized, exponentially
//! smoothed 2D vector the render pipeline reads once per frame. Raw input is
//! clamped to the unit square before smoothing, so downstream eye offsets
//! are bounded no matter what the input device reports.

use serde::{Deserialize, Serialize};

/// Smoothing factor applied each frame
const SMOOTHING_FACTOR: f64 = 0.1;

/// Normalized pointer position, both axes in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerVector {
    pub x: f64,
    pub y: f64,
}

impl PointerVector {
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };

    fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(-1.0, 1.0),
            y: y.clamp(-1.0, 1.0),
        }
    }
}

/// Exponentially-smoothed pointer state
#[derive(Debug, Clone)]
pub struct PointerTracker {
    target: PointerVector,
    current: PointerVector,
    active: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            target: PointerVector::CENTER,
            current: PointerVector::CENTER,
            active: false,
        }
    }

    /// Feed a raw sample in surface coordinates. Positions are normalized
    /// against the surface center; the doubling makes the edge of the
    /// surface reach full deflection before clamping.
    pub fn observe(&mut self, x: f64, y: f64, surface_w: f64, surface_h: f64) {
        let max_dim = surface_w.max(surface_h).max(1.0);
        let nx = (x - surface_w / 2.0) / max_dim * 2.0;
        let ny = (y - surface_h / 2.0) / max_dim * 2.0;
        self.observe_normalized(nx, ny);
    }

    /// Feed an already-normalized sample (clamped to the unit square)
    pub fn observe_normalized(&mut self, x: f64, y: f64) {
        self.target = PointerVector::clamped(x, y);
        self.active = true;
    }

    /// Pointer left the surface: glide back to center
    pub fn leave(&mut self) {
        self.target = PointerVector::CENTER;
        self.active = false;
    }

    /// Advance one frame of smoothing toward the target
    pub fn tick(&mut self) {
        self.current.x += (self.target.x - self.current.x) * SMOOTHING_FACTOR;
        self.current.y += (self.target.y - self.current.y) * SMOOTHING_FACTOR;
    }

    /// Latest smoothed vector
    pub fn vector(&self) -> PointerVector {
        self.current
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pupil offset in canvas units. Each axis is hard-capped at
    /// `max_offset` even if smoothing state was somehow driven outside the
    /// unit square.
    pub fn eye_offset(&self, max_offset: f64) -> (f64, f64) {
        (
            (self.current.x * max_offset).clamp(-max_offset, max_offset),
            (self.current.y * max_offset).clamp(-max_offset, max_offset),
        )
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_input_is_clamped() {
        let mut tracker = PointerTracker::new();
        tracker.observe(10_000.0, -10_000.0, 100.0, 100.0);
        for _ in 0..200 {
            tracker.tick();
        }
        let v = tracker.vector();
        assert!(v.x <= 1.0 && v.x > 0.99);
        assert!(v.y >= -1.0 && v.y < -0.99);
    }

    #[test]
    fn test_smoothing_approaches_target() {
        let mut tracker = PointerTracker::new();
        tracker.observe_normalized(1.0, 0.0);

        tracker.tick();
        let after_one = tracker.vector().x;
        assert!((after_one - 0.1).abs() < 1e-9);

        for _ in 0..100 {
            tracker.tick();
        }
        assert!(tracker.vector().x > 0.99);
    }

    #[test]
    fn test_leave_returns_to_center() {
        let mut tracker = PointerTracker::new();
        tracker.observe_normalized(0.8, 0.8);
        for _ in 0..50 {
            tracker.tick();
        }
        tracker.leave();
        assert!(!tracker.is_active());
        for _ in 0..200 {
            tracker.tick();
        }
        let v = tracker.vector();
        assert!(v.x.abs() < 0.01 && v.y.abs() < 0.01);
    }

    #[test]
    fn test_eye_offset_never_exceeds_cap() {
        let mut tracker = PointerTracker::new();
        tracker.observe(f64::MAX, f64::MAX, 10.0, 10.0);
        for _ in 0..500 {
            tracker.tick();
        }
        let (ox, oy) = tracker.eye_offset(5.0);
        assert!(ox.abs() <= 5.0);
        assert!(oy.abs() <= 5.0);
    }

    #[test]
    fn test_center_sample_maps_to_origin() {
        let mut tracker = PointerTracker::new();
        tracker.observe(50.0, 50.0, 100.0, 100.0);
        for _ in 0..50 {
            tracker.tick();
        }
        let v = tracker.vector();
        assert!(v.x.abs() < 1e-6 && v.y.abs() < 1e-6);
    }
}
