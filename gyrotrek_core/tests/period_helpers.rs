use gyrotrek_core::util::{hz_from_period_ms, period_ms, period_us};
use rstest::rstest;

#[rstest]
#[case(1, 1_000_000)]
#[case(2, 500_000)]
#[case(1000, 1_000)]
fn period_us_matches_rate(#[case] hz: u32, #[case] expected: u64) {
    assert_eq!(period_us(hz), expected);
}

#[test]
fn period_us_clamps_degenerate_inputs() {
    assert_eq!(period_us(0), 1_000_000); // hz clamped to 1
    assert_eq!(period_us(u32::MAX), 1); // never returns 0
}

#[rstest]
#[case(1, 1000)]
#[case(2, 500)]
#[case(1000, 1)]
fn period_ms_matches_rate(#[case] hz: u32, #[case] expected: u64) {
    assert_eq!(period_ms(hz), expected);
}

#[test]
fn period_ms_clamps_degenerate_inputs() {
    assert_eq!(period_ms(0), 1000);
    assert_eq!(period_ms(u32::MAX), 1);
}

#[rstest]
#[case(500, 2)]
#[case(1000, 1)]
#[case(1, 1000)]
fn hz_round_trips_with_period(#[case] period: u64, #[case] expected_hz: u32) {
    assert_eq!(hz_from_period_ms(period), expected_hz);
}

#[test]
fn hz_from_period_clamps_degenerate_inputs() {
    assert_eq!(hz_from_period_ms(0), 1000); // period clamped to 1 ms
    assert_eq!(hz_from_period_ms(u64::MAX), 1); // never returns 0
}
