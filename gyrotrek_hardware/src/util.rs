use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll the `ready` probe until it reports true or the timeout expires.
/// Sleeps in small intervals to avoid CPU spinning. The probe itself may
/// fail (a bus read error), which aborts the wait immediately.
pub fn wait_until_ready_with_timeout(
    mut ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !ready()? {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}
