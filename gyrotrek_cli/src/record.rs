//! Session execution: config mapping, hardware assembly, and orchestration.

use gyrotrek_core::error::{Result as CoreResult, TrackerError};
use gyrotrek_core::runner::{RunParams, SamplingMode, SessionSummary};
use gyrotrek_core::TickStatus;
use gyrotrek_traits::clock::{Clock, MonotonicClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct RecordOpts {
    pub direct: bool,
    pub hold: bool,
    pub stats: bool,
}

pub fn run_record(
    cfg: &gyrotrek_config::Config,
    calib: Option<&gyrotrek_config::Calibration>,
    opts: &RecordOpts,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<SessionSummary> {
    // Builder/config mapping via the From impls in gyrotrek_core::conversions
    let filter: gyrotrek_core::FilterCfg = (&cfg.filter).into();
    let geometry: gyrotrek_core::GeometryCfg = (&cfg.geometry).into();
    let window: gyrotrek_core::WindowCfg = (&cfg.window).into();
    let timeouts: gyrotrek_core::Timeouts = (&cfg.timeouts).into();
    // CSV calibration wins over the persisted TOML block; defaults otherwise.
    let calibration = calib
        .map(gyrotrek_core::Calibration::from)
        .or_else(|| cfg.calibration.as_ref().map(gyrotrek_core::Calibration::from));

    let mode = if opts.direct {
        SamplingMode::Direct
    } else {
        match cfg.runner.mode {
            gyrotrek_config::RunMode::Direct => SamplingMode::Direct,
            gyrotrek_config::RunMode::Sampler => {
                #[cfg(all(feature = "hardware", target_os = "linux"))]
                {
                    SamplingMode::Event
                }
                #[cfg(not(all(feature = "hardware", target_os = "linux")))]
                {
                    SamplingMode::Paced(gyrotrek_core::util::hz_from_period_ms(
                        cfg.window.sample_period_ms,
                    ))
                }
            }
        }
    };

    // Choose hardware or simulation
    #[cfg(feature = "hardware")]
    let gyro = gyrotrek_hardware::HardwareGyro::new(cfg.pins.spi_bus, cfg.pins.spi_cs)
        .map_err(|e| eyre::Report::new(e).wrap_err("open gyro"))?;
    #[cfg(not(feature = "hardware"))]
    let gyro = gyrotrek_hardware::SimulatedGyro::new();

    #[cfg(feature = "hardware")]
    let indicator =
        gyrotrek_hardware::HardwareIndicator::new(cfg.pins.led_recording, cfg.pins.led_done)
            .map_err(|e| eyre::Report::new(e).wrap_err("open indicator pins"))?;
    #[cfg(not(feature = "hardware"))]
    let indicator = gyrotrek_hardware::ConsoleIndicator::default();

    let display = gyrotrek_hardware::ConsoleDisplay;

    if opts.stats && matches!(mode, SamplingMode::Direct) {
        return run_direct_with_stats(
            gyro, display, indicator, filter, geometry, calibration, timeouts, window, shutdown,
        );
    }
    if opts.stats {
        tracing::warn!("--stats is only collected in direct mode; ignoring");
    }

    gyrotrek_core::runner::run(
        gyro,
        display,
        indicator,
        RunParams {
            filter,
            geometry,
            calibration,
            timeouts,
            window,
            mode,
            hold_after_finalize: opts.hold,
        },
        Some(shutdown),
    )
}

/// Direct-mode control loop instrumented with per-tick latency stats.
/// Hold mode is not combined with stats; the loop returns at finalize.
#[allow(clippy::too_many_arguments)]
fn run_direct_with_stats<G, D, I>(
    gyro: G,
    display: D,
    indicator: I,
    filter: gyrotrek_core::FilterCfg,
    geometry: gyrotrek_core::GeometryCfg,
    calibration: Option<gyrotrek_core::Calibration>,
    timeouts: gyrotrek_core::Timeouts,
    window: gyrotrek_core::WindowCfg,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<SessionSummary>
where
    G: gyrotrek_traits::Gyro + 'static,
    D: gyrotrek_traits::Display + 'static,
    I: gyrotrek_traits::Indicator + 'static,
{
    let period = Duration::from_millis(window.sample_period_ms);
    let period_us = window.sample_period_ms * 1000;
    let mut recorder = gyrotrek_core::build_recorder(
        gyro,
        display,
        indicator,
        filter,
        geometry,
        calibration,
        timeouts,
        window,
    )?;
    recorder.begin();
    let clock = MonotonicClock::new();

    let mut latencies: Vec<u64> = Vec::new();
    let mut missed_deadlines = 0usize;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Err(eyre::Report::new(TrackerError::State("interrupted".into())));
        }
        let t_start = std::time::Instant::now();
        let status = recorder.tick()?;
        let latency = t_start.elapsed().as_micros() as u64;
        latencies.push(latency);
        if latency > period_us {
            missed_deadlines = missed_deadlines.saturating_add(1);
        }
        match status {
            TickStatus::Sampling { .. } => clock.sleep(period),
            TickStatus::Finalized { distance_m } => {
                let summary = SessionSummary {
                    distance_m,
                    samples: recorder.samples_recorded(),
                    elapsed_s: recorder.elapsed_seconds(),
                };
                print_stats(&latencies, missed_deadlines, period_us);
                return Ok(summary);
            }
        }
    }
}

/// Print latency/jitter stats to stderr.
fn print_stats(latencies: &[u64], missed_deadlines: usize, expected_period_us: u64) {
    let min = *latencies.iter().min().unwrap_or(&0);
    let max = *latencies.iter().max().unwrap_or(&0);
    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
    };
    let stdev = if latencies.len() > 1 {
        let var = latencies
            .iter()
            .map(|&x| (x as f64 - avg).powi(2))
            .sum::<f64>()
            / (latencies.len() as f64 - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    eprintln!("\n--- Tick Stats ---");
    eprintln!("Ticks: {}", latencies.len());
    eprintln!("Period (us): {expected_period_us}");
    eprintln!("Latency min/avg/max/stdev (us): {min:.0} / {avg:.1} / {max:.0} / {stdev:.1}");
    eprintln!("Missed deadlines (> period): {missed_deadlines}");
    eprintln!("------------------\n");
}
