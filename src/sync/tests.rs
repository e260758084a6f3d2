// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::array;

use super::*;
use crate::{constants::SECONDS_PER_DAY, profile::Instrument};

const T0: f64 = 737_000.0;

fn day(seconds: f64) -> f64 {
    T0 + seconds / SECONDS_PER_DAY
}

/// A 1 Hz CTD descending at 0.5 dbar/s for 20 s, with samples 5 and 6
/// masked.
fn ctd() -> Profile {
    let mut p = Profile::new(Instrument::Ctd, 2, "test")
        .with_column(Channel::Time, Array1::from_shape_fn(20, |i| day(i as f64)))
        .with_column(
            Channel::Pressure,
            Array1::from_shape_fn(20, |i| 10.0 + 0.5 * i as f64),
        );
    p.mask = (0..20).map(|i| !(5..=6).contains(&i)).collect();
    p
}

/// An engineering record every 2 s, starting 0.3 s after the CTD and
/// running 5 s past its end.
fn eng() -> Profile {
    let mut p = Profile::new(Instrument::Eng, 2, "test").with_column(
        Channel::Time,
        Array1::from_shape_fn(13, |k| day(0.3 + 2.0 * k as f64)),
    );
    p.acquisition_rate_hz = 0.5;
    p
}

#[test]
fn test_sync_interpolates_and_masks() {
    let ctd = ctd();
    let mut eng = eng();
    eng.mask = vec![true; 13];
    eng.mask[1] = false;
    sync_to_reference(&mut eng, &ctd, 1.5).unwrap();

    let pressure = eng.column(Channel::Pressure);
    assert_eq!(pressure.len(), 13);
    for (k, &p) in pressure.iter().enumerate() {
        let seconds = 0.3 + 2.0 * k as f64;
        // Extrapolated past the CTD's last sample too.
        assert_abs_diff_eq!(p, 10.0 + 0.5 * seconds + 1.5, epsilon = 1e-4);
    }
    for &v in eng.column(Channel::Dpdt) {
        assert_abs_diff_eq!(v, 0.5, epsilon = 1e-4);
    }
    assert_eq!(
        eng.mask,
        vec![true, false, true, false, true, true, true, true, true, true, false, false, false]
    );
    assert!(eng.data_status.is_empty());
}

#[test]
fn test_rate_comes_from_time_when_unknown() {
    let ctd = ctd();
    let mut eng = eng();
    eng.acquisition_rate_hz = f64::NAN;
    sync_to_reference(&mut eng, &ctd, 0.0).unwrap();
    for &v in eng.column(Channel::Dpdt) {
        assert_abs_diff_eq!(v, 0.5, epsilon = 1e-4);
    }
}

#[test]
fn test_reference_without_mask_counts_as_usable() {
    let mut ctd = ctd();
    ctd.mask.clear();
    let mut eng = eng();
    sync_to_reference(&mut eng, &ctd, 0.0).unwrap();
    assert_eq!(eng.num_masked_samples(), 10);
}

#[test]
fn test_failures_degrade_to_nan() {
    let mut ctd = ctd();
    ctd.set_column(Channel::Time, Array1::from_elem(20, f64::NAN));
    let mut eng = eng();
    assert_eq!(
        sync_to_reference(&mut eng, &ctd, 0.0),
        Err(SyncError::TooFewReferencePoints { found: 0 })
    );

    sync_ctd_eng(&mut eng, &ctd, 0.0);
    assert_eq!(eng.column(Channel::Pressure).len(), 13);
    assert!(eng.column(Channel::Pressure).iter().all(|p| p.is_nan()));
    assert!(eng.column(Channel::Dpdt).iter().all(|p| p.is_nan()));
    assert_eq!(eng.mask, vec![false; 13]);
    assert_eq!(eng.code_history, vec!["sync_ctd_eng"]);
    assert!(eng.data_status[0].starts_with("synchronisation to ctd failed"));
}

#[test]
fn test_no_overlap() {
    let ctd = ctd();
    let mut aqd = Profile::new(Instrument::Ad2cp, 2, "test").with_column(
        Channel::Time,
        Array1::from_shape_fn(5, |k| day(1000.0 + k as f64)),
    );
    assert!(matches!(
        sync_to_reference(&mut aqd, &ctd, 0.0),
        Err(SyncError::NoOverlap { .. })
    ));
    aqd_sync_ctd(&mut aqd, &ctd, 0.0);
    assert_eq!(aqd.mask, vec![false; 5]);
    assert_eq!(aqd.code_history, vec!["aqd_sync_ctd"]);
}

#[test]
fn test_empty_secondary_is_left_alone() {
    let ctd = ctd();
    let mut eng = Profile::new(Instrument::Eng, 2, "test");
    sync_ctd_eng(&mut eng, &ctd, 0.0);
    assert!(eng.column(Channel::Pressure).is_empty());
    assert_eq!(eng.data_status, vec!["no data; not synchronised"]);
}

#[test]
fn test_mask_slow_samples() {
    let mut p = Profile::new(Instrument::Ad2cp, 1, "test")
        .with_column(Channel::Dpdt, array![0.5, 0.05, -0.3, f64::NAN]);

    mask_slow_samples(&mut p, 0.0);
    assert!(p.mask.is_empty());
    assert!(p.code_history.is_empty());

    mask_slow_samples(&mut p, 0.1);
    assert_eq!(p.mask, vec![true, false, true, false]);
    assert_eq!(p.data_status, vec!["2 samples slower than 0.1 dbar/s masked"]);
}
