use anyhow::{anyhow, Result};

use crate::frame::Frame;

/// Mean absolute per-byte difference between two frames.
///
/// Every channel of every pixel counts, so the score is on the 0..=255 scale
/// regardless of layout. Frames must share geometry and layout.
pub fn motion_score(current: &Frame, previous: &Frame) -> Result<f64> {
    if !current.is_comparable(previous) {
        return Err(anyhow!(
            "cannot compare {}x{} {:?} frame with {}x{} {:?} frame",
            current.width,
            current.height,
            current.format,
            previous.width,
            previous.height,
            previous.format
        ));
    }
    let a = current.pixels();
    let b = previous.pixels();
    if a.is_empty() {
        return Err(anyhow!("frame has no pixel data"));
    }
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    Ok(total as f64 / a.len() as f64)
}

/// Running summary of motion scores for one request.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionStats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl MotionStats {
    pub fn record(&mut self, motion: f64) {
        if self.count == 0 {
            self.min = motion;
            self.max = motion;
        } else {
            self.min = self.min.min(motion);
            self.max = self.max.max(motion);
        }
        self.sum += motion;
        self.count += 1;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}
