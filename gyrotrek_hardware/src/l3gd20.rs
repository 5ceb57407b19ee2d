use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::wait_until_ready_with_timeout;

/// WHO_AM_I value for the L3GD20.
pub const DEVICE_ID: u8 = 0xD4;

const REG_WHO_AM_I: u8 = 0x0F;
const REG_CTRL1: u8 = 0x20;
const REG_CTRL4: u8 = 0x23;
const REG_STATUS: u8 = 0x27;
const REG_OUT_X_L: u8 = 0x28;

// Address modifier bits for SPI transactions
const RW_READ: u8 = 0x80;
const MS_MULTI: u8 = 0x40;

// Status: new X/Y/Z data available
const STATUS_ZYXDA: u8 = 0x08;

// CTRL1: normal mode, all three axes enabled, 95 Hz ODR
const CTRL1_NORMAL_XYZ: u8 = 0x0F;
// CTRL4: 2000 dps full scale
const CTRL4_FS_2000DPS: u8 = 0x20;

/// dps per digit at the 2000 dps full scale
const SENSITIVITY_2000DPS: f32 = 0.070;

/// L3GD20 3-axis gyro on SPI, mode 3 at 1 MHz.
pub struct L3gd20 {
    spi: rppal::spi::Spi,
}

impl L3gd20 {
    pub fn new(bus: u8, cs: u8) -> Result<Self> {
        use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            other => return Err(HwError::Spi(format!("unsupported SPI bus {other}"))),
        };
        let ss = match cs {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported chip select {other}"))),
        };
        let spi = Spi::new(bus, ss, 1_000_000, Mode::Mode3)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi })
    }

    /// Verify the device identity and bring it into continuous 3-axis
    /// measurement at the 2000 dps full scale. Returns the WHO_AM_I value.
    pub fn init(&mut self) -> Result<u8> {
        let id = self.read_reg(REG_WHO_AM_I)?;
        if id != DEVICE_ID {
            return Err(HwError::BadDeviceId(id));
        }
        // Full scale first so the initial samples already use the final
        // sensitivity, then power on.
        self.write_reg(REG_CTRL4, CTRL4_FS_2000DPS)?;
        self.write_reg(REG_CTRL1, CTRL1_NORMAL_XYZ)?;
        Ok(id)
    }

    /// One 3-axis sample in dps, waiting for the data-ready flag first.
    pub fn read_axes_dps(&mut self, timeout: Duration) -> Result<[f32; 3]> {
        wait_until_ready_with_timeout(
            || self.data_ready(),
            timeout,
            Duration::from_micros(200),
        )?;

        let tx = [REG_OUT_X_L | RW_READ | MS_MULTI, 0, 0, 0, 0, 0, 0];
        let mut rx = [0u8; 7];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;

        let raw = [
            i16::from_le_bytes([rx[1], rx[2]]),
            i16::from_le_bytes([rx[3], rx[4]]),
            i16::from_le_bytes([rx[5], rx[6]]),
        ];
        let axes = raw.map(|v| f32::from(v) * SENSITIVITY_2000DPS);
        trace!(?raw, "l3gd20 raw read");
        Ok(axes)
    }

    fn data_ready(&mut self) -> Result<bool> {
        Ok(self.read_reg(REG_STATUS)? & STATUS_ZYXDA != 0)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8> {
        let tx = [reg | RW_READ, 0x00];
        let mut rx = [0u8; 2];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(rx[1])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        let tx = [reg, value];
        let mut rx = [0u8; 2];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(())
    }
}
