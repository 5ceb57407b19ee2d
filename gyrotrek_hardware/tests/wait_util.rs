use gyrotrek_hardware::error::HwError;
use gyrotrek_hardware::util::wait_until_ready_with_timeout;
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[case(1)]
#[case(3)]
#[case(10)]
fn polls_until_the_probe_becomes_ready(#[case] ready_after: u32) {
    let mut polls = 0;
    let r = wait_until_ready_with_timeout(
        || {
            polls += 1;
            Ok(polls >= ready_after)
        },
        Duration::from_millis(100),
        Duration::from_micros(100),
    );
    assert!(r.is_ok());
    assert_eq!(polls, ready_after);
}

#[test]
fn times_out_with_data_ready_error() {
    let r = wait_until_ready_with_timeout(
        || Ok(false),
        Duration::from_millis(5),
        Duration::from_micros(100),
    );
    assert!(matches!(r, Err(HwError::DataReadyTimeout)));
}

#[test]
fn probe_errors_abort_the_wait() {
    let r = wait_until_ready_with_timeout(
        || Err(HwError::Spi("bus gone".into())),
        Duration::from_millis(50),
        Duration::from_micros(100),
    );
    assert!(matches!(r, Err(HwError::Spi(_))));
}
