use gyrotrek_config::{Calibration, CalibrationRow, load_calibration_csv};
use std::io::Write;
use tempfile::NamedTempFile;

fn rows(pairs: &[(f64, f64)]) -> Vec<CalibrationRow> {
    pairs
        .iter()
        .map(|&(actual_m, measured_m)| CalibrationRow {
            actual_m,
            measured_m,
        })
        .collect()
}

#[test]
fn exact_line_recovers_scale_and_offset() {
    // measured = 0.165 * actual + 0.035
    let cal = Calibration::from_rows(rows(&[
        (0.0, 0.035),
        (1.0, 0.200),
        (2.0, 0.365),
        (4.0, 0.695),
    ]))
    .expect("fit");
    assert!((cal.scale - 0.165).abs() < 1e-9, "scale {}", cal.scale);
    assert!((cal.offset_m - 0.035).abs() < 1e-9, "offset {}", cal.offset_m);
}

#[test]
fn a_single_outlier_is_rejected_by_the_refit() {
    // One wild measurement among nine clean points on measured = 0.2*actual.
    let cal = Calibration::from_rows(rows(&[
        (1.0, 0.2),
        (2.0, 0.4),
        (3.0, 0.6),
        (4.0, 0.8),
        (5.0, 5.0), // outlier; true value 1.0
        (6.0, 1.2),
        (7.0, 1.4),
        (8.0, 1.6),
        (9.0, 1.8),
    ]))
    .expect("fit");
    assert!((cal.scale - 0.2).abs() < 1e-6, "scale {}", cal.scale);
    assert!(cal.offset_m < 1e-6, "offset {}", cal.offset_m);
}

#[test]
fn fewer_than_two_rows_is_an_error() {
    let err = Calibration::from_rows(rows(&[(1.0, 0.2)])).expect_err("must fail");
    assert!(format!("{err}").contains("at least two rows"));
}

#[test]
fn duplicate_actual_distances_are_rejected() {
    let err =
        Calibration::from_rows(rows(&[(1.0, 0.2), (1.0, 0.3), (2.0, 0.4)])).expect_err("must fail");
    assert!(format!("{err}").contains("duplicate"));
}

#[test]
fn non_monotonic_actual_distances_are_rejected() {
    let err =
        Calibration::from_rows(rows(&[(1.0, 0.2), (3.0, 0.6), (2.0, 0.4)])).expect_err("must fail");
    assert!(format!("{err}").contains("monotonic"));
}

#[test]
fn negative_relationship_is_rejected() {
    let err =
        Calibration::from_rows(rows(&[(1.0, 0.9), (2.0, 0.5), (3.0, 0.1)])).expect_err("must fail");
    assert!(format!("{err}").contains("positive"));
}

#[test]
fn csv_loader_enforces_exact_headers() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "distance,reading").unwrap();
    writeln!(f, "1.0,0.2").unwrap();
    let err = load_calibration_csv(f.path()).expect_err("must fail");
    assert!(format!("{err}").contains("actual_m,measured_m"));
}

#[test]
fn csv_loader_reports_bad_rows_with_line_numbers() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "actual_m,measured_m").unwrap();
    writeln!(f, "1.0,0.2").unwrap();
    writeln!(f, "oops,0.4").unwrap();
    let err = load_calibration_csv(f.path()).expect_err("must fail");
    assert!(format!("{err}").contains("row 3"));
}

#[test]
fn csv_loader_round_trips_a_clean_file() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "actual_m,measured_m").unwrap();
    writeln!(f, "0.0,0.035").unwrap();
    writeln!(f, "2.0,0.365").unwrap();
    writeln!(f, "4.0,0.695").unwrap();
    let cal = load_calibration_csv(f.path()).expect("load");
    assert!((cal.scale - 0.165).abs() < 1e-9);
    assert!((cal.offset_m - 0.035).abs() < 1e-9);
}
