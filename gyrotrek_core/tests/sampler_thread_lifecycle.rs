use std::error::Error;
use std::time::{Duration, Instant};

use gyrotrek_core::sampler::Sampler;
use gyrotrek_traits::clock::MonotonicClock;
use gyrotrek_traits::{AxesDps, Gyro};

struct CountingGyro {
    n: f32,
}
impl Gyro for CountingGyro {
    fn init(&mut self) -> Result<u8, Box<dyn Error + Send + Sync>> {
        Ok(0xD4)
    }
    fn read_axes(&mut self, _timeout: Duration) -> Result<AxesDps, Box<dyn Error + Send + Sync>> {
        self.n += 1.0;
        Ok([self.n, 0.0, 0.0])
    }
}

#[test]
fn latest_returns_the_freshest_sample() {
    let sampler = Sampler::spawn(
        CountingGyro { n: 0.0 },
        1000,
        Duration::from_millis(10),
        MonotonicClock::new(),
    );

    // Wait for at least a few samples to land.
    let deadline = Instant::now() + Duration::from_millis(500);
    let mut last = None;
    while Instant::now() < deadline {
        if let Some(axes) = sampler.latest() {
            last = Some(axes);
            if axes[0] >= 3.0 {
                break;
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    let last = last.expect("sampler produced no samples");
    assert!(last[0] >= 1.0);
}

#[test]
fn drop_joins_the_thread_promptly() {
    let sampler = Sampler::spawn(
        CountingGyro { n: 0.0 },
        100,
        Duration::from_millis(10),
        MonotonicClock::new(),
    );
    std::thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    drop(sampler);
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "drop should not hang on the sampler thread"
    );
}

#[test]
fn stall_accounting_starts_from_the_epoch() {
    struct SilentGyro;
    impl Gyro for SilentGyro {
        fn init(&mut self) -> Result<u8, Box<dyn Error + Send + Sync>> {
            Ok(0)
        }
        fn read_axes(
            &mut self,
            timeout: Duration,
        ) -> Result<AxesDps, Box<dyn Error + Send + Sync>> {
            std::thread::sleep(timeout);
            Err("silent".into())
        }
    }

    let sampler = Sampler::spawn_event(SilentGyro, Duration::from_millis(5), MonotonicClock::new());
    std::thread::sleep(Duration::from_millis(30));
    // No successful read ever happened, so the stall spans the whole run.
    assert!(sampler.stalled_for_now() >= 20);
    assert_eq!(sampler.stalled_for(1234), 1234);
}
