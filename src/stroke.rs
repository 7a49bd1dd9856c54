//! Incremental stroke reconstruction.
//!
//! Consumes the ordered pen-sample stream and produces vector polyline
//! segments. One segment has one width and one color; a new segment starts
//! when contact starts, after any lift/clip gap, or when consecutive
//! normalized pressure jumps by more than the split threshold (the junction
//! point is shared between the closing and opening segment so the line
//! stays visually continuous while the width changes).
//!
//! The output is a deterministic function of the sample log and the
//! profile state active at capture time: replaying the same log from
//! scratch yields the same segments as incremental feeding.

use serde::Serialize;

use crate::device::{DeviceProfile, Rgb};
use crate::protocol::pen::PenSample;

/// Default split threshold on the normalized 0..1 pressure scale.
pub const PRESSURE_SPLIT_THRESHOLD: f64 = 0.02;

/// Fixed widths keyed by pen-width class, used when writing mode is 0.
const CLASS_WIDTHS: [f64; 4] = [0.5, 2.0, 3.0, 4.5];

/// A point in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// One continuous polyline of constant width and color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrokeSegment {
    pub points: Vec<Point>,
    pub width: f64,
    pub color: Rgb,
}

impl StrokeSegment {
    fn open(width: f64, color: Rgb, first: Point) -> Self {
        Self { points: vec![first], width, color }
    }
}

/// Stroke width for a sample under the current device state: pressure
/// driven in writing mode 1, fixed per width class otherwise.
fn stroke_width(profile: &DeviceProfile, pressure: f64) -> f64 {
    if profile.writing_mode == 1 {
        1.0 + 1.5 * pressure
    } else {
        CLASS_WIDTHS[(profile.pen_width as usize).min(CLASS_WIDTHS.len() - 1)]
    }
}

pub struct StrokeReconstructor {
    closed: Vec<StrokeSegment>,
    open: Option<StrokeSegment>,
    prev_pressure: Option<f64>,
    threshold: f64,
}

impl Default for StrokeReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeReconstructor {
    pub fn new() -> Self {
        Self::with_threshold(PRESSURE_SPLIT_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            closed: Vec::new(),
            open: None,
            prev_pressure: None,
            threshold,
        }
    }

    /// Feed the next sample in arrival order. Single pass; only the
    /// immediately preceding sample's pressure is consulted.
    pub fn feed(&mut self, sample: &PenSample, profile: &DeviceProfile) {
        let admitted = profile.area_unrestricted()
            || profile.writing_area.admits(sample.px, sample.py);

        if !sample.contact || !profile.ink_enabled || !admitted {
            self.close_open();
            return;
        }

        let point = Point { x: sample.px, y: sample.py };

        match self.open.take() {
            None => {
                let width = stroke_width(profile, sample.pressure);
                self.open = Some(StrokeSegment::open(width, profile.pen_color, point));
            }
            Some(mut segment) => {
                let prev = self.prev_pressure.unwrap_or(sample.pressure);
                segment.points.push(point);
                if (sample.pressure - prev).abs() > self.threshold {
                    // Shared junction point: close at the old width, reopen
                    // at the new one.
                    self.closed.push(segment);
                    let width = stroke_width(profile, sample.pressure);
                    self.open = Some(StrokeSegment::open(width, profile.pen_color, point));
                } else {
                    self.open = Some(segment);
                }
            }
        }

        self.prev_pressure = Some(sample.pressure);
    }

    /// Close the open segment, if any (pen lift, clip, upload, clear).
    pub fn close_open(&mut self) {
        if let Some(segment) = self.open.take() {
            self.closed.push(segment);
        }
        self.prev_pressure = None;
    }

    /// Drop everything (screen cleared or image uploaded).
    pub fn reset(&mut self) {
        self.closed.clear();
        self.open = None;
        self.prev_pressure = None;
    }

    /// Current scene: closed segments plus a snapshot of the open one.
    pub fn snapshot(&self) -> Vec<StrokeSegment> {
        let mut scene = self.closed.clone();
        if let Some(open) = &self.open {
            scene.push(open.clone());
        }
        scene
    }

    pub fn segment_count(&self) -> usize {
        self.closed.len() + usize::from(self.open.is_some())
    }

    /// Recompute the full scene from a sample log. Used for replay checks;
    /// must match what incremental feeding produced.
    pub fn replay(samples: &[PenSample], profile: &DeviceProfile, threshold: f64) -> Vec<StrokeSegment> {
        let mut rec = Self::with_threshold(threshold);
        for sample in samples {
            rec.feed(sample, profile);
        }
        rec.snapshot()
    }
}
