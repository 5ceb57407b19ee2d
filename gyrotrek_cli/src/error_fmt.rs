//! Human-readable error descriptions and structured JSON error formatting.

/// Stable name for a tracker error, used in JSON output.
pub fn error_reason_name(e: &gyrotrek_core::error::TrackerError) -> &'static str {
    use gyrotrek_core::error::TrackerError::*;
    match e {
        Hardware(_) => "Hardware",
        HardwareFault(_) => "HardwareFault",
        Config(_) => "Config",
        Timeout => "Timeout",
        State(_) => "State",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use gyrotrek_core::error::{BuildError, TrackerError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingGyro => {
                "What happened: No gyro was provided to the recording engine.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the gyro is created successfully and passed via with_gyro(...).".to_string()
            }
            BuildError::MissingDisplay => {
                "What happened: No display was provided to the recording engine.\nLikely causes: The presenter failed to initialize or was not wired into the builder.\nHow to fix: Ensure a display is created successfully and passed via with_display(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TrackerError>() {
        if matches!(te, TrackerError::Timeout) {
            return "What happened: Gyro read timed out.\nLikely causes: Sensor not wired correctly, wrong SPI bus/chip-select, or timeout too low.\nHow to fix: Verify [pins] and power, and consider raising timeouts.sample_ms or hardware.sensor_read_timeout_ms in the config.".to_string();
        }
        if let TrackerError::State(s) = te
            && s == "interrupted"
        {
            return "What happened: Recording was interrupted before the window completed.\nLikely causes: Ctrl-C or an external shutdown signal.\nHow to fix: Re-run and let the fixed window finish.".to_string();
        }
        // Fallback to generic for other domain errors
        return format!(
            "What happened: {te}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("unexpected device id") {
        return "What happened: The sensor did not identify as an L3GD20.\nLikely causes: Wrong SPI bus/chip-select, wiring fault, or a different part on the bus.\nHow to fix: Check [pins] in the config and the sensor wiring.".to_string();
    }

    if lower.contains("open gyro") || lower.contains("open indicator pins") {
        return "What happened: Failed to initialize hardware.\nLikely causes: Incorrect pin/bus numbers or insufficient permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process can access SPI/GPIO.".to_string();
    }

    // Calibration CSV header special-case
    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'actual_m,measured_m'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors to stable exit codes; anything unrecognized returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use gyrotrek_core::error::{BuildError, TrackerError};
    if let Some(te) = err.downcast_ref::<TrackerError>() {
        return match te {
            TrackerError::State(s) if s == "interrupted" => 130,
            TrackerError::Timeout => 3,
            TrackerError::Hardware(_) | TrackerError::HardwareFault(_) => 4,
            _ => 2,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use gyrotrek_core::error::TrackerError;
    use serde_json::json;

    if let Some(te) = err.downcast_ref::<TrackerError>() {
        return json!({
            "reason": error_reason_name(te),
            "message": humanize(err),
        })
        .to_string();
    }

    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
