mod cli;
mod error_fmt;
mod record;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use gyrotrek_traits::Gyro;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporting: {e}");
    }

    match run(&cli) {
        Ok(()) => {}
        Err(err) => {
            if *JSON_MODE.get().unwrap_or(&false) {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            std::process::exit(error_fmt::exit_code_for_error(&err));
        }
    }
}

fn run(cli: &Cli) -> eyre::Result<()> {
    let raw = fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {:?}", cli.config))?;
    let cfg = gyrotrek_config::load_toml(&raw)
        .map_err(|e| eyre::eyre!("parse config {:?}: {}", cli.config, e))?;
    cfg.validate()?;

    init_tracing(cli, &cfg.logging);

    let calib = match &cli.calibration {
        Some(path) => Some(gyrotrek_config::load_calibration_csv(path)?),
        None => None,
    };

    match &cli.cmd {
        Commands::Record {
            direct,
            hold,
            print_runtime,
            stats,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || {
                flag.store(true, Ordering::Relaxed);
            })
            .wrap_err("install ctrl-c handler")?;

            let started = std::time::Instant::now();
            let summary = record::run_record(
                &cfg,
                calib.as_ref(),
                &record::RecordOpts {
                    direct: *direct,
                    hold: *hold,
                    stats: *stats,
                },
                shutdown,
            )?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "distance_m": summary.distance_m,
                        "elapsed_s": summary.elapsed_s,
                        "samples": summary.samples,
                    })
                );
            } else {
                println!(
                    "Session complete: {:.2} m in {} s ({} samples)",
                    summary.distance_m, summary.elapsed_s, summary.samples
                );
            }
            if *print_runtime {
                println!("runtime: {} ms", started.elapsed().as_millis());
            }
            Ok(())
        }
        Commands::SelfCheck => self_check(&cfg, cli.json),
        Commands::Health => {
            // Config parsed and validated above; that is the health gate.
            if cli.json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            } else {
                println!("config ok");
            }
            Ok(())
        }
    }
}

/// Initialize the gyro and take one sample, proving the sensor path works.
fn self_check(cfg: &gyrotrek_config::Config, json: bool) -> eyre::Result<()> {
    #[cfg(feature = "hardware")]
    let mut gyro = gyrotrek_hardware::HardwareGyro::new(cfg.pins.spi_bus, cfg.pins.spi_cs)
        .map_err(|e| eyre::Report::new(e).wrap_err("open gyro"))?;
    #[cfg(not(feature = "hardware"))]
    let mut gyro = gyrotrek_hardware::SimulatedGyro::new();

    let id = gyro
        .init()
        .map_err(|e| eyre::eyre!("gyro init failed: {e}"))?;
    let timeout = std::time::Duration::from_millis(cfg.hardware.sensor_read_timeout_ms);
    let axes = gyro
        .read_axes(timeout)
        .map_err(|e| eyre::eyre!("gyro read failed: {e}"))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "device_id": id,
                "axes_dps": axes,
            })
        );
    } else {
        println!("gyro ok: id={id:#04X} sample=({:.2}, {:.2}, {:.2}) dps", axes[0], axes[1], axes[2]);
    }
    Ok(())
}

/// Console logging by default; JSON lines to a file when one is configured.
/// RUST_LOG always wins, then the CLI flag, then the config level.
fn init_tracing(cli: &Cli, logging: &gyrotrek_config::Logging) {
    let level = if cli.log_level != "info" {
        cli.log_level.clone()
    } else {
        logging.level.clone().unwrap_or_else(|| "info".to_string())
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(file) = &logging.file {
        let path = std::path::Path::new(file);
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => std::path::Path::new("."),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gyrotrek.log".to_string());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
    } else if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
