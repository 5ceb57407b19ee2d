pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One 3-axis angular-rate reading in degrees per second, ordered x, y, z.
pub type AxesDps = [f32; 3];

/// A 3-axis angular-rate sensor.
///
/// `init` brings the device up and returns its identifier (WHO_AM_I or
/// equivalent). `read_axes` yields one sample; implementations block until
/// fresh data is available or the timeout expires.
pub trait Gyro {
    fn init(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>>;

    fn read_axes(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<AxesDps, Box<dyn std::error::Error + Send + Sync>>;
}

/// Presentation surface for session state. Fire-and-forget; the recorder
/// never consumes a return value beyond logging failures.
pub trait Display {
    /// Static screen shown once when a session begins.
    fn show_banner(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Elapsed whole seconds while the window is filling.
    fn show_elapsed(
        &mut self,
        seconds: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Final calibrated distance together with the total elapsed seconds.
    fn show_distance(
        &mut self,
        meters: f64,
        elapsed_s: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Two binary status outputs (typically onboard LEDs).
///
/// While recording the primary output blinks and the secondary stays off;
/// once finalized both are held on.
pub trait Indicator {
    fn set_states(
        &mut self,
        primary: bool,
        secondary: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

// Boxed collaborators are collaborators too; lets the same engine work
// over `Box<dyn Gyro>` and concrete types alike.
impl<T: Gyro + ?Sized> Gyro for Box<T> {
    fn init(&mut self) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        (**self).init()
    }

    fn read_axes(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<AxesDps, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_axes(timeout)
    }
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn show_banner(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show_banner()
    }

    fn show_elapsed(
        &mut self,
        seconds: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show_elapsed(seconds)
    }

    fn show_distance(
        &mut self,
        meters: f64,
        elapsed_s: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show_distance(meters, elapsed_s)
    }
}

impl<T: Indicator + ?Sized> Indicator for Box<T> {
    fn set_states(
        &mut self,
        primary: bool,
        secondary: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_states(primary, secondary)
    }
}
