use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gyrotrek_core::{Phase, Recorder, TickStatus, WindowCfg};
use gyrotrek_traits::{AxesDps, Display, Gyro, Indicator};

/// Gyro that returns a fixed sequence, then repeats the last value.
struct SeqGyro {
    seq: Vec<AxesDps>,
    idx: usize,
}
impl SeqGyro {
    fn new(seq: impl Into<Vec<AxesDps>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}
impl Gyro for SeqGyro {
    fn init(&mut self) -> Result<u8, Box<dyn Error + Send + Sync>> {
        Ok(0xD4)
    }
    fn read_axes(&mut self, _timeout: Duration) -> Result<AxesDps, Box<dyn Error + Send + Sync>> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or([0.0; 3])
        };
        Ok(v)
    }
}

/// Display spy recording what it was asked to show.
#[derive(Clone, Default)]
struct SpyDisplay {
    log: Arc<Mutex<Vec<String>>>,
}
impl Display for SpyDisplay {
    fn show_banner(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log.lock().unwrap().push("banner".into());
        Ok(())
    }
    fn show_elapsed(&mut self, seconds: u32) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log.lock().unwrap().push(format!("elapsed:{seconds}"));
        Ok(())
    }
    fn show_distance(
        &mut self,
        meters: f64,
        elapsed_s: u32,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log
            .lock()
            .unwrap()
            .push(format!("distance:{meters:.6}@{elapsed_s}"));
        Ok(())
    }
}

/// Indicator spy keeping every state it was driven to.
#[derive(Clone, Default)]
struct SpyIndicator {
    states: Arc<Mutex<Vec<(bool, bool)>>>,
}
impl Indicator for SpyIndicator {
    fn set_states(
        &mut self,
        primary: bool,
        secondary: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.states.lock().unwrap().push((primary, secondary));
        Ok(())
    }
}

fn short_window(samples: usize) -> WindowCfg {
    WindowCfg {
        samples,
        sample_period_ms: 500,
    }
}

fn swing(seq_len: usize) -> Vec<AxesDps> {
    (0..seq_len)
        .map(|i| {
            let t = i as f32;
            [30.0 * (t * 0.5).sin(), -15.0 * t.cos(), 5.0 * t.sin()]
        })
        .collect()
}

#[test]
fn finalizes_after_the_window_fills() {
    let mut recorder = Recorder::builder()
        .with_gyro(SeqGyro::new(swing(8)))
        .with_display(SpyDisplay::default())
        .with_window(short_window(4))
        .build()
        .expect("build recorder");
    recorder.begin();

    for _ in 0..3 {
        match recorder.tick().expect("tick ok") {
            TickStatus::Sampling { .. } => {}
            other => panic!("expected Sampling, got {other:?}"),
        }
    }
    match recorder.tick().expect("tick ok") {
        TickStatus::Finalized { distance_m } => assert!(distance_m >= 0.0),
        other => panic!("expected Finalized, got {other:?}"),
    }
    assert_eq!(recorder.phase(), Phase::Finalized);
    assert!(recorder.distance_m().is_some());
    assert_eq!(recorder.samples_recorded(), 4);
}

#[test]
fn constant_motion_measures_zero() {
    // No change between consecutive readings: every linear sample after
    // index 0 is zero, and after calibration the distance floors at 0.
    let mut recorder = Recorder::builder()
        .with_gyro(SeqGyro::new(vec![[120.0, -40.0, 7.5]; 5]))
        .with_display(SpyDisplay::default())
        .with_window(short_window(5))
        .build()
        .expect("build recorder");
    recorder.begin();

    let mut last = None;
    for _ in 0..5 {
        last = Some(recorder.tick().expect("tick ok"));
    }
    match last {
        Some(TickStatus::Finalized { distance_m }) => assert_eq!(distance_m, 0.0),
        other => panic!("expected Finalized, got {other:?}"),
    }
}

#[test]
fn finalized_ticks_write_nothing_and_keep_the_distance() {
    let display = SpyDisplay::default();
    let log = display.log.clone();
    let mut recorder = Recorder::builder()
        .with_gyro(SeqGyro::new(swing(16)))
        .with_display(display)
        .with_window(short_window(4))
        .build()
        .expect("build recorder");
    recorder.begin();

    let mut first_distance = None;
    for _ in 0..4 {
        if let TickStatus::Finalized { distance_m } = recorder.tick().expect("tick ok") {
            first_distance = Some(distance_m);
        }
    }
    let first_distance = first_distance.expect("window did not finalize");

    // The sensor keeps being polled, but nothing observable changes.
    for _ in 0..6 {
        match recorder.tick().expect("tick ok") {
            TickStatus::Finalized { distance_m } => {
                assert_eq!(distance_m.to_bits(), first_distance.to_bits());
            }
            other => panic!("expected Finalized, got {other:?}"),
        }
    }
    assert_eq!(recorder.samples_recorded(), 4);

    let log = log.lock().unwrap();
    let distance_shows = log.iter().filter(|l| l.starts_with("distance:")).count();
    assert_eq!(distance_shows, 1, "distance must be presented exactly once");
}

#[test]
fn out_of_range_readings_match_explicit_zeros() {
    // A 50000 dps spike is clamped to zero, so the session must measure
    // the same as one where that axis really read zero.
    let mut with_spike = swing(6);
    with_spike[3][0] = 50_000.0;
    let mut with_zero = swing(6);
    with_zero[3][0] = 0.0;

    let run = |seq: Vec<AxesDps>| -> f64 {
        let mut recorder = Recorder::builder()
            .with_gyro(SeqGyro::new(seq))
            .with_display(SpyDisplay::default())
            .with_window(short_window(6))
            .build()
            .expect("build recorder");
        recorder.begin();
        let mut d = None;
        for _ in 0..6 {
            if let TickStatus::Finalized { distance_m } = recorder.tick().expect("tick ok") {
                d = Some(distance_m);
            }
        }
        d.expect("window did not finalize")
    };

    assert_eq!(run(with_spike).to_bits(), run(with_zero).to_bits());
}

#[test]
fn elapsed_seconds_follow_the_tick_period() {
    let mut recorder = Recorder::builder()
        .with_gyro(SeqGyro::new(swing(4)))
        .with_display(SpyDisplay::default())
        .with_window(short_window(4))
        .build()
        .expect("build recorder");
    recorder.begin();

    let mut elapsed = Vec::new();
    for _ in 0..4 {
        match recorder.tick().expect("tick ok") {
            TickStatus::Sampling { elapsed_s } => elapsed.push(elapsed_s),
            TickStatus::Finalized { .. } => {}
        }
    }
    // 500 ms ticks: two ticks per whole second, shown before the index
    // advances.
    assert_eq!(elapsed, vec![0, 0, 1]);
    assert_eq!(recorder.elapsed_seconds(), 2);
}

#[test]
fn indicator_blinks_then_holds_both_on() {
    let indicator = SpyIndicator::default();
    let states = indicator.states.clone();
    let mut recorder = Recorder::builder()
        .with_gyro(SeqGyro::new(swing(8)))
        .with_display(SpyDisplay::default())
        .with_indicator(indicator)
        .with_window(short_window(3))
        .build()
        .expect("build recorder");
    recorder.begin();
    for _ in 0..3 {
        recorder.tick().expect("tick ok");
    }

    let states = states.lock().unwrap();
    // begin resets both off, then the primary output alternates with the
    // secondary held off, and the final transition drives both on.
    assert_eq!(states.first(), Some(&(false, false)));
    assert_eq!(states.last(), Some(&(true, true)));
    let recording: Vec<_> = states[1..states.len() - 1].to_vec();
    assert_eq!(recording, vec![(true, false), (false, false), (true, false)]);
}

#[test]
fn gyro_errors_propagate_as_hardware_errors() {
    struct ErrGyro;
    impl Gyro for ErrGyro {
        fn init(&mut self) -> Result<u8, Box<dyn Error + Send + Sync>> {
            Ok(0)
        }
        fn read_axes(
            &mut self,
            _timeout: Duration,
        ) -> Result<AxesDps, Box<dyn Error + Send + Sync>> {
            Err("boom".into())
        }
    }

    let mut recorder = Recorder::builder()
        .with_gyro(ErrGyro)
        .with_display(SpyDisplay::default())
        .build()
        .expect("build recorder");
    recorder.begin();

    let err = recorder.tick().expect_err("tick should fail");
    let msg = format!("{err}");
    assert!(msg.contains("reading gyro"), "unexpected error: {msg}");
}

#[test]
fn begin_starts_a_fresh_session() {
    let mut recorder = Recorder::builder()
        .with_gyro(SeqGyro::new(swing(16)))
        .with_display(SpyDisplay::default())
        .with_window(short_window(3))
        .build()
        .expect("build recorder");
    recorder.begin();
    for _ in 0..3 {
        recorder.tick().expect("tick ok");
    }
    assert_eq!(recorder.phase(), Phase::Finalized);

    recorder.begin();
    assert_eq!(recorder.phase(), Phase::Recording);
    assert_eq!(recorder.samples_recorded(), 0);
    assert!(recorder.distance_m().is_none());
    match recorder.tick().expect("tick ok") {
        TickStatus::Sampling { elapsed_s } => assert_eq!(elapsed_s, 0),
        other => panic!("expected Sampling, got {other:?}"),
    }
}
