//! Test and helper mocks for gyrotrek_core

use gyrotrek_traits::{AxesDps, Display, Gyro, Indicator};

/// A gyro that always errors on read; useful when driving the control loop
/// with externally sampled axes via `tick_from_axes`.
pub struct NoopGyro;

impl Gyro for NoopGyro {
    fn init(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Ok(0)
    }

    fn read_axes(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<AxesDps, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop gyro")))
    }
}

/// Display that discards everything.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn show_banner(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn show_elapsed(
        &mut self,
        _seconds: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    fn show_distance(
        &mut self,
        _meters: f64,
        _elapsed_s: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// Indicator that discards everything; the builder default when no real
/// indicator is wired in.
#[derive(Debug, Default)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn set_states(
        &mut self,
        _primary: bool,
        _secondary: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
