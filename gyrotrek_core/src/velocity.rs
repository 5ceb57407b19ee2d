//! First-difference conversion from angular rate to approximate linear
//! velocity.
//!
//! The change in angular rate between consecutive samples, scaled by a
//! fixed per-axis pivot radius, stands in for linear velocity since the
//! device carries no accelerometer. Differencing cancels a constant
//! angular bias but is sensitive to sample-to-sample noise, which is why
//! range clamping happens strictly before this step.

use crate::sample::{AngularSample, LinearSample};

/// Millimeters to the unit used by the linear samples.
pub const MM_TO_M: f32 = 0.001;

/// Per-axis pivot radii in millimeters. Device geometry constants; the
/// defaults are empirically tuned, not derived.
#[derive(Debug, Clone, Copy)]
pub struct AxisRadii {
    pub x_mm: f32,
    pub y_mm: f32,
    pub z_mm: f32,
}

impl Default for AxisRadii {
    fn default() -> Self {
        Self {
            x_mm: crate::DEFAULT_RADIUS_MM,
            y_mm: crate::DEFAULT_RADIUS_MM,
            z_mm: crate::DEFAULT_RADIUS_MM,
        }
    }
}

/// Derive the linear-velocity sample for the current interval from the
/// previous filtered sample. The first interval has no predecessor and
/// always yields the zero vector, regardless of sensor input.
pub fn differentiate(
    prev: Option<&AngularSample>,
    curr: &AngularSample,
    radii: &AxisRadii,
) -> LinearSample {
    match prev {
        None => LinearSample::ZERO,
        Some(p) => LinearSample {
            x: (p.x - curr.x) * (radii.x_mm * MM_TO_M),
            y: (p.y - curr.y) * (radii.y_mm * MM_TO_M),
            z: (p.z - curr.z) * (radii.z_mm * MM_TO_M),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_interval_is_zero_regardless_of_input() {
        let curr = AngularSample::new(500.0, -120.0, 42.0);
        assert_eq!(
            differentiate(None, &curr, &AxisRadii::default()),
            LinearSample::ZERO
        );
    }

    #[test]
    fn unchanged_rate_yields_zero_velocity() {
        let s = AngularSample::new(90.0, -45.0, 10.0);
        assert_eq!(
            differentiate(Some(&s), &s, &AxisRadii::default()),
            LinearSample::ZERO
        );
    }

    #[test]
    fn difference_scales_by_radius_per_axis() {
        let prev = AngularSample::new(100.0, 0.0, -10.0);
        let curr = AngularSample::new(90.0, 20.0, -10.0);
        let radii = AxisRadii {
            x_mm: 100.0,
            y_mm: 50.0,
            z_mm: 10.0,
        };
        let lin = differentiate(Some(&prev), &curr, &radii);
        assert!((lin.x - 1.0).abs() < 1e-6); // 10 * 0.1
        assert!((lin.y - (-1.0)).abs() < 1e-6); // -20 * 0.05
        assert_eq!(lin.z, 0.0);
    }
}
