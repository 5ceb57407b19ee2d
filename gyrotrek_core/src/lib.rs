#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core recording logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent distance-recording engine.
//! All hardware interactions go through the `gyrotrek_traits::Gyro`,
//! `Display`, and `Indicator` traits.
//!
//! ## Architecture
//!
//! - **Filtering**: static min/max clamp of raw angular rates (`filter`)
//! - **Velocity**: first-difference angular-to-linear conversion (`velocity`)
//! - **Buffering**: fixed 40-slot recording window (`buffer`)
//! - **Estimation**: displacement sum plus offset/scale calibration (`estimate`)
//! - **Control**: two-phase recording state machine (`Recorder`)
//! - **Orchestration**: pacing, sampling modes, stall watchdog (`runner`)
//!
//! The engine itself never sleeps: pacing is the runner's job, expressed
//! through `gyrotrek_traits::Clock`, so the algorithm stays decoupled from
//! any particular wait primitive.

// Module declarations
pub mod buffer;
pub mod conversions;
pub mod error;
pub mod estimate;
pub mod filter;
pub mod mocks;
pub mod runner;
pub mod sample;
pub mod sampler;
pub mod status;
pub mod util;
pub mod velocity;

use crate::error::BuildError;
use crate::error::{Result, TrackerError};
use eyre::WrapErr;
use std::time::Duration;

use gyrotrek_traits::{AxesDps, Display, Gyro, Indicator};

// For typed hardware error mapping
#[cfg(feature = "hardware-errors")]
use gyrotrek_hardware::error::HwError;

pub use crate::buffer::SampleBuffer;
pub use crate::estimate::{Calibration, estimate, raw_distance};
pub use crate::filter::RangeFilter;
pub use crate::sample::{AngularSample, LinearSample};
pub use crate::status::{Phase, TickStatus};
pub use crate::velocity::AxisRadii;

/// Lowest plausible hand-motion angular rate, dps. Device-calibration
/// constant, symmetric with [`MAX_GYRO_DPS`].
pub const MIN_GYRO_DPS: f32 = -2000.0;
/// Highest plausible hand-motion angular rate, dps.
pub const MAX_GYRO_DPS: f32 = 2000.0;
/// Samples per recording window: 20 seconds at one sample per 500 ms.
pub const DEFAULT_WINDOW_SAMPLES: usize = 40;
/// Tick period between samples, milliseconds.
pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 500;
/// Additive bias removed from the raw distance sum, meters. Empirically
/// tuned against reference walks; not derived from device geometry.
pub const DEFAULT_DISTANCE_OFFSET_M: f64 = 0.035;
/// Divisor correcting the systematic magnitude error of the summed
/// distance. Empirically tuned alongside the offset.
pub const DEFAULT_DISTANCE_SCALE: f64 = 0.165;
/// Default pivot radius per axis, millimeters.
pub const DEFAULT_RADIUS_MM: f32 = 50.0;

/// Filter configuration: the per-axis plausibility band in dps.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    pub min_dps: f32,
    pub max_dps: f32,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            min_dps: MIN_GYRO_DPS,
            max_dps: MAX_GYRO_DPS,
        }
    }
}

/// Device geometry: per-axis pivot radii in millimeters.
#[derive(Debug, Clone)]
pub struct GeometryCfg {
    pub radius_x_mm: f32,
    pub radius_y_mm: f32,
    pub radius_z_mm: f32,
}

impl Default for GeometryCfg {
    fn default() -> Self {
        Self {
            radius_x_mm: DEFAULT_RADIUS_MM,
            radius_y_mm: DEFAULT_RADIUS_MM,
            radius_z_mm: DEFAULT_RADIUS_MM,
        }
    }
}

impl From<&GeometryCfg> for AxisRadii {
    fn from(g: &GeometryCfg) -> Self {
        Self {
            x_mm: g.radius_x_mm,
            y_mm: g.radius_y_mm,
            z_mm: g.radius_z_mm,
        }
    }
}

/// Recording window shape. The defaults give the fixed 20-second window;
/// both knobs exist for tests and bench rigs, not for varying the rate
/// mid-session.
#[derive(Debug, Clone)]
pub struct WindowCfg {
    pub samples: usize,
    pub sample_period_ms: u64,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            samples: DEFAULT_WINDOW_SAMPLES,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max gyro wait per read (ms)
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 100 }
    }
}

/// Unified core for both dynamic (boxed) and generic (static dispatch)
/// variants.
pub struct RecorderCore<G: Gyro, D: Display, I: Indicator> {
    gyro: G,
    display: D,
    indicator: I,
    filter: RangeFilter,
    radii: AxisRadii,
    calibration: Calibration,
    timeouts: Timeouts,
    buffer: SampleBuffer,
    window_samples: usize,
    period_ms: u64,
    // Cached seconds-per-sample for the estimator
    period_s: f64,
    // Monotonic tick counter; never decremented or reset within a session
    tick_index: u64,
    phase: Phase,
    // Defined exactly once, at the Recording -> Finalized transition
    distance_m: f64,
    // Primary indicator output toggles each recording tick
    blink_on: bool,
}

impl<G: Gyro, D: Display, I: Indicator> core::fmt::Debug for RecorderCore<G, D, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecorderCore")
            .field("phase", &self.phase)
            .field("tick_index", &self.tick_index)
            .field("samples", &self.buffer.len())
            .field("distance_m", &self.distance_m)
            .finish()
    }
}

impl<G: Gyro, D: Display, I: Indicator> RecorderCore<G, D, I> {
    /// Start a session: empty buffer, index 0, recording phase, static
    /// banner up. The process-level analog of the device's hard reset.
    pub fn begin(&mut self) {
        self.buffer.clear();
        self.tick_index = 0;
        self.phase = Phase::Recording;
        self.distance_m = 0.0;
        self.blink_on = false;
        if let Err(e) = self.display.show_banner() {
            tracing::warn!(error = %e, "show_banner failed");
        }
        if let Err(e) = self.indicator.set_states(false, false) {
            tracing::warn!(error = %e, "indicator reset failed");
        }
    }

    /// One control-loop iteration: read the gyro, then process the sample.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let timeout = Duration::from_millis(self.timeouts.sensor_ms);
        let raw = self
            .gyro
            .read_axes(timeout)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("reading gyro")?;
        self.tick_from_axes(raw)
    }

    /// Process a pre-sampled reading (sampler-driven orchestration).
    pub fn tick_from_axes(&mut self, raw: AxesDps) -> Result<TickStatus> {
        match self.phase {
            Phase::Recording => self.record_tick(raw),
            Phase::Finalized => {
                // The loop keeps polling after the window closes so the
                // device stays responsive, but nothing is written and the
                // distance is never recomputed.
                if let Err(e) = self.indicator.set_states(true, true) {
                    tracing::warn!(error = %e, "indicator update failed");
                }
                Ok(TickStatus::Finalized {
                    distance_m: self.distance_m,
                })
            }
        }
    }

    fn record_tick(&mut self, raw: AxesDps) -> Result<TickStatus> {
        let filtered = self.filter.clamp(AngularSample::from(raw));
        // Difference against the previous *filtered* sample as stored,
        // never against its derived linear value.
        let linear = velocity::differentiate(self.buffer.last_angular(), &filtered, &self.radii);
        let index = self.tick_index as usize;
        self.buffer.write(index, filtered, linear);

        let elapsed = self.elapsed_seconds();
        if let Err(e) = self.display.show_elapsed(elapsed) {
            tracing::warn!(error = %e, "show_elapsed failed");
        }
        self.blink_on = !self.blink_on;
        if let Err(e) = self.indicator.set_states(self.blink_on, false) {
            tracing::warn!(error = %e, "indicator update failed");
        }

        self.tick_index += 1;
        if self.tick_index == self.window_samples as u64 {
            return Ok(self.finalize());
        }
        Ok(TickStatus::Sampling { elapsed_s: elapsed })
    }

    /// One-shot Recording -> Finalized transition.
    fn finalize(&mut self) -> TickStatus {
        let total = estimate::estimate(&self.buffer, self.period_s, &self.calibration);
        self.distance_m = total;
        self.phase = Phase::Finalized;
        let elapsed = self.elapsed_seconds();
        tracing::info!(
            distance_m = total,
            elapsed_s = elapsed,
            samples = self.buffer.len(),
            "recording window complete"
        );
        if let Err(e) = self.display.show_distance(total, elapsed) {
            tracing::warn!(error = %e, "show_distance failed");
        }
        if let Err(e) = self.indicator.set_states(true, true) {
            tracing::warn!(error = %e, "indicator update failed");
        }
        TickStatus::Finalized { distance_m: total }
    }

    /// Whole seconds covered by the ticks processed so far.
    pub fn elapsed_seconds(&self) -> u32 {
        ((self.tick_index * self.period_ms) / util::MILLIS_PER_SEC) as u32
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The calibrated session distance; None until the window finalizes.
    pub fn distance_m(&self) -> Option<f64> {
        match self.phase {
            Phase::Recording => None,
            Phase::Finalized => Some(self.distance_m),
        }
    }

    pub fn samples_recorded(&self) -> usize {
        self.buffer.len()
    }

    /// Read-only view of the window, for estimation checks and tooling.
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// The configured tick period in milliseconds.
    pub fn sample_period_ms(&self) -> u64 {
        self.period_ms
    }
}

// Map any error to a typed TrackerError, with special handling for
// hardware errors.
fn map_hw_error_dyn(e: &(dyn std::error::Error + 'static)) -> TrackerError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<HwError>() {
        return match hw {
            HwError::Timeout | HwError::DataReadyTimeout => TrackerError::Timeout,
            other => TrackerError::HardwareFault(other.to_string()),
        };
    }
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        TrackerError::Timeout
    } else {
        TrackerError::Hardware(s)
    }
}

/// Public dynamic (boxed) recorder that hides the generic core.
pub struct Recorder {
    inner: RecorderCore<Box<dyn Gyro>, Box<dyn Display>, Box<dyn Indicator>>,
}

impl core::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Recorder {
    /// Start building a Recorder.
    pub fn builder() -> RecorderBuilder<Missing, Missing> {
        RecorderBuilder::default()
    }

    pub fn begin(&mut self) {
        self.inner.begin();
    }

    /// One control-loop iteration.
    pub fn tick(&mut self) -> Result<TickStatus> {
        self.inner.tick()
    }

    /// Process a pre-sampled reading.
    pub fn tick_from_axes(&mut self, raw: AxesDps) -> Result<TickStatus> {
        self.inner.tick_from_axes(raw)
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }

    pub fn distance_m(&self) -> Option<f64> {
        self.inner.distance_m()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.inner.elapsed_seconds()
    }

    pub fn samples_recorded(&self) -> usize {
        self.inner.samples_recorded()
    }
}

// Type-state markers for the builder
pub struct Missing;
pub struct Set;

use std::marker::PhantomData;

/// Builder for `Recorder`. Gyro and display are mandatory and tracked in
/// the type; everything else falls back to validated defaults.
pub struct RecorderBuilder<G, D> {
    gyro: Option<Box<dyn Gyro>>,
    display: Option<Box<dyn Display>>,
    indicator: Option<Box<dyn Indicator>>,
    filter: Option<FilterCfg>,
    geometry: Option<GeometryCfg>,
    calibration: Option<Calibration>,
    timeouts: Option<Timeouts>,
    window: Option<WindowCfg>,
    _g: PhantomData<G>,
    _d: PhantomData<D>,
}

impl Default for RecorderBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            gyro: None,
            display: None,
            indicator: None,
            filter: None,
            geometry: None,
            calibration: None,
            timeouts: None,
            window: None,
            _g: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<G, D> RecorderBuilder<G, D> {
    /// Fallible build available in any type-state; returns a detailed
    /// BuildError for missing pieces.
    pub fn try_build(self) -> Result<Recorder> {
        let RecorderBuilder {
            gyro,
            display,
            indicator,
            filter,
            geometry,
            calibration,
            timeouts,
            window,
            _g: _,
            _d: _,
        } = self;

        let gyro = gyro.ok_or_else(|| eyre::Report::new(BuildError::MissingGyro))?;
        let display = display.ok_or_else(|| eyre::Report::new(BuildError::MissingDisplay))?;
        let indicator = indicator
            .unwrap_or_else(|| Box::new(crate::mocks::NullIndicator) as Box<dyn Indicator>);

        let filter = filter.unwrap_or_default();
        let geometry = geometry.unwrap_or_default();
        let calibration = calibration.unwrap_or_default();
        let timeouts = timeouts.unwrap_or_default();
        let window = window.unwrap_or_default();

        let inner = assemble(
            gyro,
            display,
            indicator,
            &filter,
            &geometry,
            calibration,
            timeouts,
            &window,
        )?;
        Ok(Recorder { inner })
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryCfg) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    pub fn with_window(mut self, window: WindowCfg) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_indicator(mut self, indicator: impl Indicator + 'static) -> Self {
        self.indicator = Some(Box::new(indicator));
        self
    }
}

// Setters that advance type-state when providing mandatory components
impl<D> RecorderBuilder<Missing, D> {
    pub fn with_gyro(self, gyro: impl Gyro + 'static) -> RecorderBuilder<Set, D> {
        let RecorderBuilder {
            gyro: _,
            display,
            indicator,
            filter,
            geometry,
            calibration,
            timeouts,
            window,
            _g: _,
            _d: _,
        } = self;
        RecorderBuilder {
            gyro: Some(Box::new(gyro)),
            display,
            indicator,
            filter,
            geometry,
            calibration,
            timeouts,
            window,
            _g: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<G> RecorderBuilder<G, Missing> {
    pub fn with_display(self, display: impl Display + 'static) -> RecorderBuilder<G, Set> {
        let RecorderBuilder {
            gyro,
            display: _,
            indicator,
            filter,
            geometry,
            calibration,
            timeouts,
            window,
            _g: _,
            _d: _,
        } = self;
        RecorderBuilder {
            gyro,
            display: Some(Box::new(display)),
            indicator,
            filter,
            geometry,
            calibration,
            timeouts,
            window,
            _g: PhantomData,
            _d: PhantomData,
        }
    }
}

impl RecorderBuilder<Set, Set> {
    /// Validate and build. Only available once gyro and display are set.
    pub fn build(self) -> Result<Recorder> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias over the unified core.
pub type RecorderG<G, D, I> = RecorderCore<G, D, I>;

/// Build a generic, statically-dispatched recorder from concrete
/// collaborators.
pub fn build_recorder<G, D, I>(
    gyro: G,
    display: D,
    indicator: I,
    filter: FilterCfg,
    geometry: GeometryCfg,
    calibration: Option<Calibration>,
    timeouts: Timeouts,
    window: WindowCfg,
) -> Result<RecorderG<G, D, I>>
where
    G: Gyro + 'static,
    D: Display + 'static,
    I: Indicator + 'static,
{
    assemble(
        gyro,
        display,
        indicator,
        &filter,
        &geometry,
        calibration.unwrap_or_default(),
        timeouts,
        &window,
    )
}

/// Shared validation + construction path for both builder flavors.
#[allow(clippy::too_many_arguments)]
fn assemble<G: Gyro, D: Display, I: Indicator>(
    gyro: G,
    display: D,
    indicator: I,
    filter: &FilterCfg,
    geometry: &GeometryCfg,
    calibration: Calibration,
    timeouts: Timeouts,
    window: &WindowCfg,
) -> Result<RecorderCore<G, D, I>> {
    validate_cfgs(filter, geometry, &calibration, &timeouts, window)?;

    let period_ms = window.sample_period_ms;
    let period_s = period_ms as f64 / util::MILLIS_PER_SEC as f64;

    Ok(RecorderCore {
        gyro,
        display,
        indicator,
        filter: RangeFilter::new(filter.min_dps, filter.max_dps),
        radii: AxisRadii::from(geometry),
        calibration,
        timeouts,
        buffer: SampleBuffer::with_capacity(window.samples),
        window_samples: window.samples,
        period_ms,
        period_s,
        tick_index: 0,
        phase: Phase::Recording,
        distance_m: 0.0,
        blink_on: false,
    })
}

// Validate configs (non-panicking; return typed Config errors)
fn validate_cfgs(
    filter: &FilterCfg,
    geometry: &GeometryCfg,
    calibration: &Calibration,
    timeouts: &Timeouts,
    window: &WindowCfg,
) -> Result<()> {
    if !filter.min_dps.is_finite() || !filter.max_dps.is_finite() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "gyro range must be finite",
        )));
    }
    if filter.min_dps >= filter.max_dps {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "gyro range must satisfy min < max",
        )));
    }
    if filter.min_dps > 0.0 || filter.max_dps < 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "gyro range must contain zero",
        )));
    }
    for r in [
        geometry.radius_x_mm,
        geometry.radius_y_mm,
        geometry.radius_z_mm,
    ] {
        if !r.is_finite() || r <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "axis radii must be positive",
            )));
        }
    }
    if !calibration.scale.is_finite() || calibration.scale <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "calibration scale must be > 0",
        )));
    }
    if !calibration.offset_m.is_finite() || calibration.offset_m < 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "calibration offset must be >= 0",
        )));
    }
    if timeouts.sensor_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sensor_ms must be >= 1",
        )));
    }
    if window.samples == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "window samples must be >= 1",
        )));
    }
    if window.sample_period_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample period must be >= 1 ms",
        )));
    }
    Ok(())
}
