use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("spi error: {0}")]
    Spi(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("gyro timeout")]
    Timeout,
    #[error("gyro data-ready timeout")]
    DataReadyTimeout,
    #[error("unexpected device id: {0:#04x}")]
    BadDeviceId(u8),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
