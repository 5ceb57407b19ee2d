use crate::error::{Result as CoreResult, TrackerError};
use crate::mocks::NoopGyro;
use crate::sampler::Sampler;
use crate::{Calibration, FilterCfg, GeometryCfg, TickStatus, Timeouts, WindowCfg};
use gyrotrek_traits::clock::{Clock, MonotonicClock};
use gyrotrek_traits::{Display, Gyro, Indicator};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How sampling should be orchestrated
#[derive(Debug, Clone, Copy)]
pub enum SamplingMode {
    /// Read inside the control loop using Gyro::read_axes(timeout)
    Direct,
    /// Event-driven: block on the gyro's data-ready timing in a sampler thread
    Event,
    /// Rate-paced background sampling at the given Hz
    Paced(u32),
}

/// Everything a session run needs beyond the collaborators themselves.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub filter: FilterCfg,
    pub geometry: GeometryCfg,
    pub calibration: Option<Calibration>,
    pub timeouts: Timeouts,
    pub window: WindowCfg,
    pub mode: SamplingMode,
    /// Keep ticking in the finalized phase (device-style idle) until the
    /// shutdown flag is raised, instead of returning at the transition.
    pub hold_after_finalize: bool,
}

/// Outcome of a completed session.
#[derive(Debug, Clone, Copy)]
pub struct SessionSummary {
    pub distance_m: f64,
    pub samples: usize,
    pub elapsed_s: u32,
}

/// Compute the sampler stall threshold in milliseconds.
///
/// Starts from a "fast" threshold derived from the per-read sensor timeout
/// (4x, to catch a dead sensor promptly) and widens it to at least two
/// sample periods so a single missed sample never trips the watchdog.
#[inline]
fn compute_stall_threshold_ms(sensor_timeout_ms: u64, period_ms: u64) -> u64 {
    std::cmp::max(
        fast_threshold_ms(sensor_timeout_ms),
        two_periods_ms(period_ms),
    )
    .max(1)
}

/// Derive a quick stall threshold from the per-read sensor timeout.
#[inline]
fn fast_threshold_ms(sensor_timeout_ms: u64) -> u64 {
    sensor_timeout_ms.saturating_mul(4)
}

/// Ensure the stall threshold spans at least two periods to tolerate one miss.
#[inline]
fn two_periods_ms(period_ms: u64) -> u64 {
    period_ms.saturating_mul(2)
}

#[inline]
fn stalled_now(elapsed_ms: u64, stalled_ms: u64, threshold_ms: u64) -> bool {
    elapsed_ms >= threshold_ms && stalled_ms > threshold_ms
}

fn interrupted() -> eyre::Report {
    eyre::Report::new(TrackerError::State("interrupted".into()))
}

/// Run one full session to the finalized distance (or until the shutdown
/// flag is raised in hold mode).
pub fn run<G, D, I>(
    gyro: G,
    display: D,
    indicator: I,
    params: RunParams,
    shutdown: Option<Arc<AtomicBool>>,
) -> CoreResult<SessionSummary>
where
    G: Gyro + Send + 'static,
    D: Display + 'static,
    I: Indicator + 'static,
{
    match params.mode {
        SamplingMode::Direct => run_direct(gyro, display, indicator, params, shutdown),
        SamplingMode::Event | SamplingMode::Paced(_) => {
            run_with_sampler(gyro, display, indicator, params, shutdown)
        }
    }
}

fn shutdown_requested(flag: &Option<Arc<AtomicBool>>) -> bool {
    flag.as_ref()
        .is_some_and(|f| f.load(Ordering::Relaxed))
}

fn run_direct<G, D, I>(
    gyro: G,
    display: D,
    indicator: I,
    params: RunParams,
    shutdown: Option<Arc<AtomicBool>>,
) -> CoreResult<SessionSummary>
where
    G: Gyro + 'static,
    D: Display + 'static,
    I: Indicator + 'static,
{
    let period = Duration::from_millis(params.window.sample_period_ms);
    let mut recorder = crate::build_recorder(
        gyro,
        display,
        indicator,
        params.filter,
        params.geometry,
        params.calibration,
        params.timeouts,
        params.window.clone(),
    )?;
    recorder.begin();
    let clock = MonotonicClock::new();
    tracing::info!(
        samples = params.window.samples,
        period_ms = params.window.sample_period_ms,
        mode = "direct",
        "session start"
    );

    let mut done: Option<SessionSummary> = None;
    loop {
        if shutdown_requested(&shutdown) {
            return done.ok_or_else(interrupted);
        }
        match recorder.tick()? {
            TickStatus::Sampling { .. } => {}
            TickStatus::Finalized { distance_m } => {
                if done.is_none() {
                    let summary = SessionSummary {
                        distance_m,
                        samples: recorder.samples_recorded(),
                        elapsed_s: recorder.elapsed_seconds(),
                    };
                    tracing::info!(distance_m, "session complete");
                    if !params.hold_after_finalize {
                        return Ok(summary);
                    }
                    done = Some(summary);
                }
            }
        }
        clock.sleep(period);
    }
}

fn run_with_sampler<G, D, I>(
    gyro: G,
    display: D,
    indicator: I,
    params: RunParams,
    shutdown: Option<Arc<AtomicBool>>,
) -> CoreResult<SessionSummary>
where
    G: Gyro + Send + 'static,
    D: Display + 'static,
    I: Indicator + 'static,
{
    let period_ms = params.window.sample_period_ms;
    let period = Duration::from_millis(period_ms);
    let stall_threshold_ms = compute_stall_threshold_ms(params.timeouts.sensor_ms, period_ms);

    let sampler_timeout = Duration::from_millis(params.timeouts.sensor_ms);
    let sampler = match params.mode {
        SamplingMode::Event => Sampler::spawn_event(gyro, sampler_timeout, MonotonicClock::new()),
        SamplingMode::Paced(hz) => Sampler::spawn(gyro, hz, sampler_timeout, MonotonicClock::new()),
        SamplingMode::Direct => unreachable!(),
    };

    // The recorder never calls read_axes in this mode; samples arrive via
    // tick_from_axes.
    let mut recorder = crate::build_recorder(
        NoopGyro,
        display,
        indicator,
        params.filter,
        params.geometry,
        params.calibration,
        params.timeouts,
        params.window.clone(),
    )?;
    recorder.begin();
    let clock = MonotonicClock::new();
    let epoch = clock.now();
    tracing::info!(
        samples = params.window.samples,
        period_ms,
        mode = "sampler",
        "session start"
    );

    let mut done: Option<SessionSummary> = None;
    loop {
        if shutdown_requested(&shutdown) {
            return done.ok_or_else(interrupted);
        }

        // Stall watchdog applies only while the window is still filling;
        // in hold mode a quiet sensor is no longer an error.
        if done.is_none() {
            let elapsed_ms = clock.ms_since(epoch);
            let stalled_ms = sampler.stalled_for_now();
            if stalled_now(elapsed_ms, stalled_ms, stall_threshold_ms) {
                return Err(eyre::Report::new(TrackerError::Timeout));
            }
        }

        if let Some(axes) = sampler.latest() {
            match recorder.tick_from_axes(axes)? {
                TickStatus::Sampling { .. } => {}
                TickStatus::Finalized { distance_m } => {
                    if done.is_none() {
                        let summary = SessionSummary {
                            distance_m,
                            samples: recorder.samples_recorded(),
                            elapsed_s: recorder.elapsed_seconds(),
                        };
                        tracing::info!(distance_m, "session complete");
                        if !params.hold_after_finalize {
                            return Ok(summary);
                        }
                        done = Some(summary);
                    }
                }
            }
            clock.sleep(period);
        } else {
            // Avoid busy spin before the first sample lands.
            clock.sleep(Duration::from_millis((period_ms / 4).max(1)));
        }
    }
}
