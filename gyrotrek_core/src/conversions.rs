//! `From` implementations bridging `gyrotrek_config` types to
//! `gyrotrek_core` types, so the CLI never maps fields by hand.

use crate::estimate::Calibration;
use crate::{FilterCfg, GeometryCfg, Timeouts, WindowCfg};

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&gyrotrek_config::FilterCfg> for FilterCfg {
    fn from(c: &gyrotrek_config::FilterCfg) -> Self {
        Self {
            min_dps: c.min_dps,
            max_dps: c.max_dps,
        }
    }
}

// ── GeometryCfg ──────────────────────────────────────────────────────────────

impl From<&gyrotrek_config::GeometryCfg> for GeometryCfg {
    fn from(c: &gyrotrek_config::GeometryCfg) -> Self {
        Self {
            radius_x_mm: c.radius_x_mm,
            radius_y_mm: c.radius_y_mm,
            radius_z_mm: c.radius_z_mm,
        }
    }
}

// ── WindowCfg ────────────────────────────────────────────────────────────────

impl From<&gyrotrek_config::WindowCfg> for WindowCfg {
    fn from(c: &gyrotrek_config::WindowCfg) -> Self {
        Self {
            samples: c.samples,
            sample_period_ms: c.sample_period_ms,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&gyrotrek_config::Timeouts> for Timeouts {
    fn from(c: &gyrotrek_config::Timeouts) -> Self {
        Self {
            sensor_ms: c.sample_ms,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&gyrotrek_config::Calibration> for Calibration {
    fn from(c: &gyrotrek_config::Calibration) -> Self {
        Self {
            offset_m: c.offset_m,
            scale: c.scale,
        }
    }
}

impl From<&gyrotrek_config::PersistedCalibration> for Calibration {
    fn from(c: &gyrotrek_config::PersistedCalibration) -> Self {
        Self {
            offset_m: c.offset_m,
            scale: c.scale,
        }
    }
}
