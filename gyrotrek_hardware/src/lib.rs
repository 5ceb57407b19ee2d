pub mod error;
#[cfg(feature = "hardware")]
pub mod l3gd20;
pub mod util;

use gyrotrek_traits::{AxesDps, Display, Gyro, Indicator};
use std::io::Write;

/// Identifier reported by the simulated gyro; matches the real part so
/// self-checks behave the same in both backends.
pub const SIM_DEVICE_ID: u8 = 0xD4;

/// Deterministic simulated gyroscope producing a gentle swing profile.
///
/// The waveform is a fixed function of the read counter, so a given
/// number of reads always yields the same sequence. The amplitude can be
/// overridden through `GYROTREK_SIM_AMPLITUDE_DPS` for integration tests.
pub struct SimulatedGyro {
    tick: u32,
    amplitude_dps: f32,
}

impl SimulatedGyro {
    pub fn new() -> Self {
        let amplitude_dps = std::env::var("GYROTREK_SIM_AMPLITUDE_DPS")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(90.0);
        SimulatedGyro {
            tick: 0,
            amplitude_dps,
        }
    }
}

impl Default for SimulatedGyro {
    fn default() -> Self {
        Self::new()
    }
}

impl Gyro for SimulatedGyro {
    fn init(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SIM_DEVICE_ID)
    }

    fn read_axes(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<AxesDps, Box<dyn std::error::Error + Send + Sync>> {
        let t = self.tick as f32;
        self.tick = self.tick.wrapping_add(1);
        let a = self.amplitude_dps;
        let axes = [
            a * (t * 0.7).sin(),
            0.5 * a * (t * 0.9).cos(),
            0.25 * a * (t * 0.4).sin(),
        ];
        tracing::trace!(?axes, "simulated gyro sample");
        Ok(axes)
    }
}

/// Console presenter standing in for the device's LCD.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

impl Display for ConsoleDisplay {
    fn show_banner(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("gyrotrek distance tracker");
        println!("recording...");
        Ok(())
    }

    fn show_elapsed(
        &mut self,
        seconds: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Overwrite in place, the way the LCD line is redrawn each tick.
        print!("\relapsed: {seconds:>3} s");
        std::io::stdout().flush()?;
        Ok(())
    }

    fn show_distance(
        &mut self,
        meters: f64,
        elapsed_s: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("\nDistance travelled: {meters:.2} m in {elapsed_s} s");
        Ok(())
    }
}

/// Indicator that reports state changes to the log instead of LEDs.
#[derive(Debug, Default)]
pub struct ConsoleIndicator {
    last: Option<(bool, bool)>,
}

impl Indicator for ConsoleIndicator {
    fn set_states(
        &mut self,
        primary: bool,
        secondary: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.last != Some((primary, secondary)) {
            tracing::trace!(primary, secondary, "indicator state");
            self.last = Some((primary, secondary));
        }
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareGyro {
    l3gd20: l3gd20::L3gd20,
}

#[cfg(feature = "hardware")]
impl HardwareGyro {
    pub fn new(spi_bus: u8, spi_cs: u8) -> Result<Self, error::HwError> {
        let l3gd20 = l3gd20::L3gd20::new(spi_bus, spi_cs)?;
        Ok(HardwareGyro { l3gd20 })
    }
}

#[cfg(feature = "hardware")]
impl Gyro for HardwareGyro {
    fn init(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        let id = self.l3gd20.init()?;
        tracing::info!(id, "l3gd20 initialized");
        Ok(id)
    }

    fn read_axes(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<AxesDps, Box<dyn std::error::Error + Send + Sync>> {
        let mut attempts = 0;
        let max_attempts = 3;
        loop {
            match self.l3gd20.read_axes_dps(timeout) {
                Ok(axes) => {
                    tracing::debug!(?axes, "l3gd20 sample");
                    return Ok(axes);
                }
                Err(error::HwError::DataReadyTimeout) if attempts < max_attempts => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "gyro timeout, retrying");
                }
                Err(e) => {
                    tracing::error!("gyro read error: {}", e);
                    return Err(Box::new(e));
                }
            }
        }
    }
}

/// LED pair driven through GPIO; either line may be absent on a given rig.
#[cfg(feature = "hardware")]
pub struct HardwareIndicator {
    primary: Option<rppal::gpio::OutputPin>,
    secondary: Option<rppal::gpio::OutputPin>,
}

#[cfg(feature = "hardware")]
impl HardwareIndicator {
    pub fn new(
        primary_pin: Option<u8>,
        secondary_pin: Option<u8>,
    ) -> Result<Self, error::HwError> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| error::HwError::Gpio(e.to_string()))?;
        let mut get = |pin: Option<u8>| -> Result<Option<rppal::gpio::OutputPin>, error::HwError> {
            match pin {
                None => Ok(None),
                Some(p) => gpio
                    .get(p)
                    .map(|io| Some(io.into_output()))
                    .map_err(|e| error::HwError::Gpio(e.to_string())),
            }
        };
        Ok(HardwareIndicator {
            primary: get(primary_pin)?,
            secondary: get(secondary_pin)?,
        })
    }
}

#[cfg(feature = "hardware")]
impl Indicator for HardwareIndicator {
    fn set_states(
        &mut self,
        primary: bool,
        secondary: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(pin) = self.primary.as_mut() {
            if primary {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        if let Some(pin) = self.secondary.as_mut() {
            if secondary {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn simulated_gyro_reports_device_id() {
        let mut gyro = SimulatedGyro::new();
        assert_eq!(gyro.init().unwrap(), SIM_DEVICE_ID);
    }

    #[test]
    fn simulated_gyro_is_deterministic() {
        let mut a = SimulatedGyro {
            tick: 0,
            amplitude_dps: 90.0,
        };
        let mut b = SimulatedGyro {
            tick: 0,
            amplitude_dps: 90.0,
        };
        for _ in 0..10 {
            let sa = a.read_axes(Duration::from_millis(1)).unwrap();
            let sb = b.read_axes(Duration::from_millis(1)).unwrap();
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn console_indicator_tracks_last_state() {
        let mut ind = ConsoleIndicator::default();
        ind.set_states(true, false).unwrap();
        ind.set_states(true, false).unwrap();
        assert_eq!(ind.last, Some((true, false)));
        ind.set_states(true, true).unwrap();
        assert_eq!(ind.last, Some((true, true)));
    }
}
