#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration parsing for the distance tracker.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The distance-calibration CSV loader enforces headers and performs a
//!   robust refit to reduce outlier influence before estimating the
//!   scale/offset correction.
use serde::Deserialize;

/// Distance-calibration CSV schema.
///
/// Expected headers:
/// actual_m,measured_m
///
/// `actual_m` is the ground-truth distance of a reference walk and
/// `measured_m` the uncalibrated raw total the device produced for it.
///
/// Example:
/// actual_m,measured_m
/// 0.0,0.036
/// 2.0,0.365
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub actual_m: f64,
    pub measured_m: f64,
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// SPI bus index carrying the gyro
    pub spi_bus: u8,
    /// Chip-select line on that bus
    pub spi_cs: u8,
    pub led_recording: Option<u8>,
    pub led_done: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Lowest plausible angular rate per axis (dps)
    pub min_dps: f32,
    /// Highest plausible angular rate per axis (dps)
    pub max_dps: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            min_dps: -2000.0,
            max_dps: 2000.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeometryCfg {
    pub radius_x_mm: f32,
    pub radius_y_mm: f32,
    pub radius_z_mm: f32,
}

impl Default for GeometryCfg {
    fn default() -> Self {
        Self {
            radius_x_mm: 50.0,
            radius_y_mm: 50.0,
            radius_z_mm: 50.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    /// Samples per recording window
    pub samples: usize,
    /// Tick period between samples (ms)
    pub sample_period_ms: u64,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            samples: 40,
            sample_period_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Sampling timeout per read (ms). Also accepts alias "sensor_ms".
    #[serde(alias = "sensor_ms")]
    pub sample_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sample_ms: 100 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for the gyro's data-ready flag before failing
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Sampler,
    Direct,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Default orchestration mode: "sampler" (rate-paced thread) or "direct"
    pub mode: RunMode,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            mode: RunMode::Sampler,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub filter: FilterCfg,
    #[serde(default)]
    pub geometry: GeometryCfg,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub hardware: Hardware,
    /// Runner/orchestration defaults
    #[serde(default)]
    pub runner: RunnerCfg,
    /// Optional persisted calibration; preferred at runtime over CSV when present.
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PersistedCalibration {
    /// additive bias removed from the raw distance sum (m)
    pub offset_m: f64,
    /// divisor correcting the systematic magnitude error
    pub scale: f64,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Distance correction in the form calibrated = (measured - offset) / scale.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub offset_m: f64,
    pub scale: f64,
}

impl From<PersistedCalibration> for Calibration {
    fn from(p: PersistedCalibration) -> Self {
        Calibration {
            offset_m: p.offset_m,
            scale: p.scale,
        }
    }
}

impl Calibration {
    /// Build a Calibration from reference-walk rows using ordinary least
    /// squares over all points, modeling measured = scale * actual + offset.
    /// A single robust refit rejects residual outliers beyond 2 sigma.
    pub fn from_rows(rows: Vec<CalibrationRow>) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }

        // Ensure strictly monotonic actual distances (increasing or
        // decreasing), no duplicates
        let mut dir: i8 = 0;
        for i in 1..rows.len() {
            let d = rows[i].actual_m - rows[i - 1].actual_m;
            if d == 0.0 {
                eyre::bail!(
                    "calibration rows have duplicate actual_m values at index {} and {}",
                    i - 1,
                    i
                );
            }
            let step_dir = if d > 0.0 { 1 } else { -1 };
            if dir == 0 {
                dir = step_dir;
            } else if dir != step_dir {
                eyre::bail!(
                    "calibration actual_m values must be monotonic (strictly increasing or strictly decreasing)"
                );
            }
        }

        // OLS fit of y = a*x + b with x = actual_m, y = measured_m
        let fit = |pts: &[(f64, f64)]| -> eyre::Result<(f64, f64)> {
            let n = pts.len() as f64;
            let sum_x: f64 = pts.iter().map(|r| r.0).sum();
            let sum_y: f64 = pts.iter().map(|r| r.1).sum();
            let mean_x = sum_x / n;
            let mean_y = sum_y / n;
            let mut sxx = 0.0f64;
            let mut sxy = 0.0f64;
            for (x_i, y_i) in pts {
                let x = x_i - mean_x;
                let y = y_i - mean_y;
                sxx += x * x;
                sxy += x * y;
            }
            if !sxx.is_finite() || sxx == 0.0 {
                eyre::bail!("calibration cannot determine scale (degenerate actual_m variance)");
            }
            let a = sxy / sxx;
            if !a.is_finite() {
                eyre::bail!("calibration produced non-finite scale");
            }
            if a == 0.0 {
                eyre::bail!("calibration produced zero scale");
            }
            let b = mean_y - a * mean_x;
            Ok((a, b))
        };

        let pts: Vec<(f64, f64)> = rows.iter().map(|r| (r.actual_m, r.measured_m)).collect();
        let (a0, b0) = fit(&pts)?;

        // Robust sigma estimate (RMS of residuals) without allocating residuals
        let mut sumsq: f64 = 0.0;
        for (x, y) in &pts {
            let r = y - (a0 * x + b0);
            sumsq += r * r;
        }
        let rms = (sumsq / (pts.len() as f64)).sqrt();

        // Reject outliers with |residual| > 2 sigma and refit if at least 2 remain.
        let (a, b) = robust_refit(&pts, a0, b0, rms, 2.0).unwrap_or((a0, b0));

        if a <= 0.0 {
            eyre::bail!(
                "calibration scale must be positive; measured totals must grow with actual distance"
            );
        }
        // Collinear inputs can land a hair below zero; a genuinely negative
        // offset means the model cannot express this device.
        let offset_m = if b < 0.0 {
            if b > -1e-6 {
                0.0
            } else {
                eyre::bail!("calibration produced a negative offset ({b})");
            }
        } else {
            b
        };

        Ok(Calibration {
            offset_m,
            scale: a,
        })
    }
}

/// Perform a single-step robust refit by rejecting outliers defined by
/// |residual| > k * rms around the initial line y = a0*x + b0. Uses an
/// online (Welford/Chan) covariance update over inliers only. Returns None
/// when refit is not applicable (non-finite/zero rms, <2 inliers, or
/// degenerate variance), in which case the caller should keep (a0, b0).
fn robust_refit(pts: &[(f64, f64)], a0: f64, b0: f64, rms: f64, k: f64) -> Option<(f64, f64)> {
    if !(rms.is_finite() && rms > 0.0 && k.is_finite() && k > 0.0) {
        return None;
    }
    let n_pts = pts.len();
    if n_pts < 2 {
        return None;
    }

    let thr = k * rms;
    let mut n_in: usize = 0;
    let mut mean_x = 0.0f64;
    let mut mean_y = 0.0f64;
    let mut cxx = 0.0f64;
    let mut cxy = 0.0f64;

    for (x, y) in pts.iter().copied() {
        let r = y - (a0 * x + b0);
        if r.abs() <= thr {
            n_in += 1;
            let n_new = n_in as f64;
            let dx = x - mean_x;
            let dy = y - mean_y;
            let mean_x_new = mean_x + dx / n_new;
            let mean_y_new = mean_y + dy / n_new;
            // Chan's update for covariance terms
            cxx += dx * (x - mean_x_new);
            cxy += dx * (y - mean_y_new);
            mean_x = mean_x_new;
            mean_y = mean_y_new;
        }
    }

    if n_in >= 2 && n_in < n_pts {
        if !cxx.is_finite() || cxx == 0.0 {
            return None;
        }
        let a = cxy / cxx;
        if !a.is_finite() || a == 0.0 {
            return None;
        }
        let b = mean_y - a * mean_x;
        Some((a, b))
    } else {
        None
    }
}

// Ergonomic conversions for building Calibration
impl TryFrom<Vec<CalibrationRow>> for Calibration {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CalibrationRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl TryFrom<&[CalibrationRow]> for Calibration {
    type Error = eyre::Report;
    fn try_from(rows: &[CalibrationRow]) -> Result<Self, Self::Error> {
        Self::from_rows(rows.to_vec())
    }
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Calibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["actual_m", "measured_m"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'actual_m,measured_m', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Calibration::try_from(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Filter
        if !self.filter.min_dps.is_finite() || !self.filter.max_dps.is_finite() {
            eyre::bail!("filter range must be finite");
        }
        if self.filter.min_dps >= self.filter.max_dps {
            eyre::bail!("filter.min_dps must be < filter.max_dps");
        }
        if self.filter.min_dps > 0.0 || self.filter.max_dps < 0.0 {
            eyre::bail!("filter range must contain zero");
        }

        // Geometry
        for (name, r) in [
            ("geometry.radius_x_mm", self.geometry.radius_x_mm),
            ("geometry.radius_y_mm", self.geometry.radius_y_mm),
            ("geometry.radius_z_mm", self.geometry.radius_z_mm),
        ] {
            if !r.is_finite() || r <= 0.0 {
                eyre::bail!("{name} must be > 0");
            }
        }

        // Window
        if self.window.samples == 0 {
            eyre::bail!("window.samples must be >= 1");
        }
        if self.window.samples > 10_000 {
            eyre::bail!("window.samples is unreasonably large (>10000)");
        }
        if self.window.sample_period_ms == 0 {
            eyre::bail!("window.sample_period_ms must be >= 1");
        }
        if self.window.sample_period_ms > 60_000 {
            eyre::bail!("window.sample_period_ms is unreasonably large (>60s)");
        }

        // Timeouts
        if self.timeouts.sample_ms == 0 {
            eyre::bail!("timeouts.sample_ms must be >= 1");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Calibration
        if let Some(c) = &self.calibration {
            if !c.scale.is_finite() || c.scale <= 0.0 {
                eyre::bail!("calibration.scale must be > 0");
            }
            if !c.offset_m.is_finite() || c.offset_m < 0.0 {
                eyre::bail!("calibration.offset_m must be >= 0");
            }
        }

        // Runner: no extra validation; serde restricts to known modes

        Ok(())
    }
}
