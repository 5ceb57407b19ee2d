//! Background gyro sampling utilities.
//!
//! Spawns a thread that owns the `Gyro`, pushes the latest axes via a
//! bounded channel, and tracks the last-ok timestamp for stall detection.
//! Event-driven and rate-paced variants are provided; the control loop
//! consumes the freshest sample once per tick period either way.
//!
//! Safety: each `Sampler` spawns exactly one thread that is shut down
//! when the `Sampler` is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use gyrotrek_traits::clock::Clock;
use gyrotrek_traits::{AxesDps, Gyro};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct Sampler {
    rx: xch::Receiver<AxesDps>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Rate-paced sampler: read the gyro at `hz` regardless of its own
    /// data-ready timing.
    pub fn spawn<G: Gyro + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut gyro: G,
        hz: u32,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                match gyro.read_axes(timeout) {
                    Ok(axes) => {
                        // If send fails, consumer is gone; exit gracefully
                        if tx.send(axes).is_err() {
                            tracing::debug!("sampler consumer disconnected, exiting thread");
                            break;
                        }
                        let now = clock.ms_since(epoch);
                        last_ok_clone.store(now, Ordering::Relaxed);
                    }
                    Err(_) => {
                        // Skip the sample; the control loop has a stall watchdog
                    }
                }

                // Check shutdown before sleep to avoid unnecessary delay
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Event-driven sampler: rely on the gyro's own data-ready timing.
    /// `read_axes(timeout)` should block until data is ready or the
    /// timeout expires, so no extra sleep is added here.
    pub fn spawn_event<G: Gyro + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut gyro: G,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler event thread received shutdown signal");
                    break;
                }

                match gyro.read_axes(timeout) {
                    Ok(axes) => {
                        if tx.send(axes).is_err() {
                            tracing::debug!("sampler event consumer disconnected, exiting thread");
                            break;
                        }
                        let now = clock.ms_since(epoch);
                        last_ok_clone.store(now, Ordering::Relaxed);
                    }
                    Err(_) => {
                        // On timeout or transient error, just continue
                    }
                }
                // No sleep: the next iteration blocks in read_axes() until
                // fresh data arrives.
            }
            tracing::trace!("sampler event thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Freshest sample produced since the last call, if any.
    pub fn latest(&self) -> Option<AxesDps> {
        self.rx.try_iter().last()
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Convenience helper: compute stall using this sampler's epoch and a
    /// real monotonic clock.
    pub fn stalled_for_now(&self) -> u64 {
        let now_ms = {
            let dur = Instant::now().saturating_duration_since(self.epoch);
            let ms = dur.as_millis();
            (ms.min(u128::from(u64::MAX))) as u64
        };
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits promptly: either between reads (flag check) or
        // after the in-flight read_axes() completes, bounded by the sensor
        // timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
