//! Distance estimation over a completed recording window.

use crate::buffer::SampleBuffer;

/// Two-stage empirical correction applied to the summed raw distance:
/// subtract a fixed offset, clamp at zero, then divide by a scale factor.
///
/// Both constants correct systematic bias and magnitude error of the
/// difference-based velocity approximation. Their values were tuned
/// against reference walks and are not derived from device geometry.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub offset_m: f64,
    pub scale: f64,
}

impl Calibration {
    /// Order matters: the clamp runs after the offset subtraction so a
    /// session whose bias exceeds the raw total floors at 0.0 rather than
    /// going negative, and before the scale division so the floor is
    /// preserved.
    pub fn apply(&self, raw_m: f64) -> f64 {
        let corrected = (raw_m - self.offset_m).max(0.0);
        corrected / self.scale
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset_m: crate::DEFAULT_DISTANCE_OFFSET_M,
            scale: crate::DEFAULT_DISTANCE_SCALE,
        }
    }
}

/// Sum of per-interval displacement magnitudes over the buffer.
///
/// The slot at index 0 carries a zero linear sample by construction and
/// contributes nothing, so iteration starts at 1. A buffer with fewer
/// than two samples yields 0.0.
pub fn raw_distance(buffer: &SampleBuffer, period_s: f64) -> f64 {
    buffer
        .linear_samples()
        .skip(1)
        .map(|lin| lin.displacement_norm(period_s))
        .sum()
}

/// Calibrated total distance for a populated buffer. Pure: repeated calls
/// over the same buffer return the identical value.
pub fn estimate(buffer: &SampleBuffer, period_s: f64, calibration: &Calibration) -> f64 {
    let raw = raw_distance(buffer, period_s);
    let total = calibration.apply(raw);
    tracing::debug!(raw_m = raw, total_m = total, samples = buffer.len(), "distance estimate");
    total
}
