use gyrotrek_core::error::BuildError;
use gyrotrek_core::mocks::{NoopGyro, NullDisplay};
use gyrotrek_core::{Calibration, FilterCfg, Recorder, WindowCfg};
use rstest::rstest;

#[test]
fn missing_gyro_is_a_typed_build_error() {
    let err = Recorder::builder()
        .with_display(NullDisplay)
        .try_build()
        .expect_err("build must fail");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingGyro)
    ));
}

#[test]
fn missing_display_is_a_typed_build_error() {
    let err = Recorder::builder()
        .with_gyro(NoopGyro)
        .try_build()
        .expect_err("build must fail");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingDisplay)
    ));
}

#[rstest]
#[case(WindowCfg { samples: 0, sample_period_ms: 500 }, "window samples")]
#[case(WindowCfg { samples: 40, sample_period_ms: 0 }, "sample period")]
fn invalid_window_is_rejected(#[case] window: WindowCfg, #[case] needle: &str) {
    let err = Recorder::builder()
        .with_gyro(NoopGyro)
        .with_display(NullDisplay)
        .with_window(window)
        .build()
        .expect_err("build must fail");
    assert!(format!("{err}").contains(needle), "unexpected: {err}");
}

#[rstest]
#[case(Calibration { offset_m: 0.035, scale: 0.0 }, "scale")]
#[case(Calibration { offset_m: -0.1, scale: 0.165 }, "offset")]
#[case(Calibration { offset_m: f64::NAN, scale: 0.165 }, "offset")]
fn invalid_calibration_is_rejected(#[case] calibration: Calibration, #[case] needle: &str) {
    let err = Recorder::builder()
        .with_gyro(NoopGyro)
        .with_display(NullDisplay)
        .with_calibration(calibration)
        .build()
        .expect_err("build must fail");
    assert!(format!("{err}").contains(needle), "unexpected: {err}");
}

#[rstest]
#[case(FilterCfg { min_dps: 2000.0, max_dps: -2000.0 }, "min < max")]
#[case(FilterCfg { min_dps: 100.0, max_dps: 2000.0 }, "contain zero")]
#[case(FilterCfg { min_dps: f32::NAN, max_dps: 2000.0 }, "finite")]
fn invalid_filter_band_is_rejected(#[case] filter: FilterCfg, #[case] needle: &str) {
    let err = Recorder::builder()
        .with_gyro(NoopGyro)
        .with_display(NullDisplay)
        .with_filter(filter)
        .build()
        .expect_err("build must fail");
    assert!(format!("{err}").contains(needle), "unexpected: {err}");
}

#[test]
fn defaults_build_cleanly() {
    let recorder = Recorder::builder()
        .with_gyro(NoopGyro)
        .with_display(NullDisplay)
        .build();
    assert!(recorder.is_ok());
}
