// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;
use crate::constants::SECONDS_PER_DAY;

const T0: f64 = 737_000.0;

fn params() -> CurrentMeterParams {
    CurrentMeterParams {
        correct_wag: false,
        ..Default::default()
    }
}

/// A 1 Hz profile whose beams saw the instrument-frame velocities `xyz`.
fn synthetic(instrument: Instrument, mapping: &[u8], heading: &[f64], xyz: &[Xyz]) -> Profile {
    let n = heading.len();
    let beam_mapping = BeamMapping::from_profile(instrument, 1, mapping).unwrap();
    let angle = params().beam_angle_deg(instrument);
    let geometry = BeamGeometry::new(beam_mapping, angle).unwrap();
    let xyz = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 => xyz[i].x,
        1 => xyz[i].y,
        _ => xyz[i].z,
    });
    let mut p = Profile::new(instrument, 1, "test")
        .with_column(
            Channel::Time,
            Array1::from_shape_fn(n, |i| T0 + i as f64 / SECONDS_PER_DAY),
        )
        .with_column(Channel::Heading, Array1::from(heading.to_vec()))
        .with_channel(Channel::BeamVelocity, geometry.xyz_to_beam(xyz.view()));
    p.beam_mapping = mapping.to_vec();
    p.acquisition_rate_hz = 1.0;
    p
}

#[test]
fn test_beam_mappings() {
    use BeamMapping::*;
    let f = BeamMapping::from_profile;
    assert_eq!(f(Instrument::Ad2cp, 1, &[1, 2, 4]).unwrap(), Beams124);
    assert_eq!(f(Instrument::Ad2cp, 1, &[4, 0, 2, 1]).unwrap(), Beams124);
    assert_eq!(f(Instrument::Ad2cp, 1, &[2, 3, 4]).unwrap(), Beams234);
    assert_eq!(f(Instrument::Acm, 1, &[]).unwrap(), AllFour);
    assert_eq!(f(Instrument::Acm, 1, &[1, 2, 3, 4]).unwrap(), AllFour);
    assert_eq!(
        f(Instrument::Ad2cp, 7, &[1, 2, 3]),
        Err(CurrentMeterError::UnknownBeamMapping {
            profile: 7,
            instrument: Instrument::Ad2cp,
            mapping: vec![1, 2, 3],
        })
    );
    assert!(f(Instrument::Ad2cp, 1, &[]).is_err());
    assert!(f(Instrument::Acm, 1, &[1, 2, 4]).is_err());
    assert_eq!(Beams234.columns(), vec![1, 2, 3]);
}

#[test]
fn test_geometry_inverts() {
    let xyz = array![[0.1, -0.2, 0.05], [0.0, 0.0, -0.3], [1.0, 1.0, 1.0]];
    for (mapping, angle) in [
        (BeamMapping::Beams124, 25.0),
        (BeamMapping::Beams234, 25.0),
        (BeamMapping::AllFour, 45.0),
    ] {
        let geometry = BeamGeometry::new(mapping, angle).unwrap();
        let beams = geometry.xyz_to_beam(xyz.view());
        let recovered = geometry.beam_to_xyz(beams.view());
        assert_abs_diff_eq!(recovered, xyz, epsilon = 1e-12);
    }
}

#[test]
fn test_vertical_geometry_is_singular() {
    assert!(matches!(
        BeamGeometry::new(BeamMapping::Beams124, 0.0),
        Err(CurrentMeterError::SingularGeometry { .. })
    ));
}

#[test]
fn test_enu_round_trip_and_level() {
    let v = Enu {
        e: 0.3,
        n: -0.1,
        u: 0.02,
    };
    for heading in [0.0_f64, 45.0, 90.0, 200.0, 359.0] {
        let back = v.to_xyz(heading.to_radians()).to_enu(heading.to_radians());
        assert_abs_diff_eq!(back.e, v.e, epsilon = 1e-12);
        assert_abs_diff_eq!(back.n, v.n, epsilon = 1e-12);
        assert_abs_diff_eq!(back.u, v.u, epsilon = 1e-12);
    }

    // Heading north: X is north, Y is west.
    let v = Xyz {
        x: 1.0,
        y: 2.0,
        z: 0.0,
    }
    .to_enu(0.0);
    assert_abs_diff_eq!(v.e, -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(v.n, 1.0, epsilon = 1e-12);

    let x = Xyz {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    assert_eq!(x.level(0.0, 0.0), x);
    let levelled = x.level(30_f64.to_radians(), 0.0);
    assert_abs_diff_eq!(levelled.x, 30_f64.to_radians().cos(), epsilon = 1e-12);
    assert_abs_diff_eq!(levelled.z, -(30_f64.to_radians().sin()), epsilon = 1e-12);
}

#[test]
fn test_pure_rotation_recovers_current() {
    let heading = [0.0, 37.0, 90.0, 181.0, 270.0, 359.5];
    for current in [
        Enu::default(),
        Enu {
            e: 0.25,
            n: -0.4,
            u: 0.03,
        },
    ] {
        for (instrument, mapping) in [
            (Instrument::Ad2cp, vec![1, 2, 4]),
            (Instrument::Ad2cp, vec![2, 3, 4]),
            (Instrument::Acm, vec![1, 2, 3, 4]),
        ] {
            let xyz: Vec<Xyz> = heading
                .iter()
                .map(|h: &f64| current.to_xyz(h.to_radians()))
                .collect();
            let mut p = synthetic(instrument, &mapping, &heading, &xyz);
            let records = process_current_meter(&mut p, &params()).unwrap();
            assert!(records.is_empty());

            let enu = p.channel(Channel::VelocityEnu);
            assert_eq!(enu.dim(), (heading.len(), 3));
            for row in enu.outer_iter() {
                assert_abs_diff_eq!(row[0], current.e, epsilon = 1e-10);
                assert_abs_diff_eq!(row[1], current.n, epsilon = 1e-10);
                assert_abs_diff_eq!(row[2], current.u, epsilon = 1e-10);
            }
            assert_abs_diff_eq!(
                p.column(Channel::Heading),
                Array1::from(heading.to_vec()).view(),
                epsilon = 1e-9
            );
            assert_eq!(p.mask, vec![true; heading.len()]);
        }
    }
}

#[test]
fn test_wag_cancellation() {
    // 10 degrees per second.
    let heading: Vec<f64> = (0..10).map(|i| 10.0 * i as f64).collect();
    let wag = 0.43 * 10_f64.to_radians();
    let xyz = vec![
        Xyz {
            x: 0.0,
            y: wag,
            z: 0.0
        };
        heading.len()
    ];

    let mut corrected = synthetic(Instrument::Ad2cp, &[1, 2, 4], &heading, &xyz);
    let params_on = CurrentMeterParams {
        correct_wag: true,
        ..params()
    };
    process_current_meter(&mut corrected, &params_on).unwrap();
    let y = corrected.channel(Channel::VelocityXyz).column(1).to_owned();
    assert_abs_diff_eq!(y, Array1::zeros(heading.len()), epsilon = 1e-10);
    assert_abs_diff_eq!(
        corrected.column(Channel::WagVelocity).to_owned(),
        Array1::from_elem(heading.len(), wag),
        epsilon = 1e-10
    );

    let mut uncorrected = synthetic(Instrument::Ad2cp, &[1, 2, 4], &heading, &xyz);
    process_current_meter(&mut uncorrected, &params()).unwrap();
    let y = uncorrected.channel(Channel::VelocityXyz).column(1).to_owned();
    assert_abs_diff_eq!(y, Array1::from_elem(heading.len(), wag), epsilon = 1e-10);
    // The diagnostic is kept either way.
    assert_abs_diff_eq!(
        uncorrected.column(Channel::WagVelocity).to_owned(),
        Array1::from_elem(heading.len(), wag),
        epsilon = 1e-10
    );
}

#[test]
fn test_wag_across_north() {
    // 10 degrees per second through 0/360.
    let heading: Vec<f64> = (0..10).map(|i| (350.0 + 10.0 * i as f64) % 360.0).collect();
    assert_eq!(heading[..3], [350.0, 0.0, 10.0]);
    let wag = 0.43 * 10_f64.to_radians();
    let current = Enu {
        e: 0.25,
        n: -0.4,
        u: 0.03,
    };
    let xyz: Vec<Xyz> = heading
        .iter()
        .map(|h: &f64| {
            let mut v = current.to_xyz(h.to_radians());
            v.y += wag;
            v
        })
        .collect();

    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &heading, &xyz);
    let params_on = CurrentMeterParams {
        correct_wag: true,
        ..params()
    };
    process_current_meter(&mut p, &params_on).unwrap();

    assert_abs_diff_eq!(
        p.column(Channel::WagVelocity).to_owned(),
        Array1::from_elem(heading.len(), wag),
        epsilon = 1e-10
    );
    for row in p.channel(Channel::VelocityEnu).outer_iter() {
        assert_abs_diff_eq!(row[0], current.e, epsilon = 1e-10);
        assert_abs_diff_eq!(row[1], current.n, epsilon = 1e-10);
        assert_abs_diff_eq!(row[2], current.u, epsilon = 1e-10);
    }
    let stored = p.column(Channel::Heading);
    assert!(stored.iter().all(|&h| (0.0..360.0).contains(&h)));
    assert_abs_diff_eq!(
        stored.to_owned(),
        Array1::from(heading.clone()),
        epsilon = 1e-9
    );
}

#[test]
fn test_wag_without_a_sample_rate() {
    let heading = [10.0, 20.0, 30.0];
    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &heading, &[Xyz::default(); 3]);
    p.acquisition_rate_hz = f64::NAN;
    p.set_column(Channel::Time, Array1::from_elem(3, f64::NAN));
    process_current_meter(&mut p, &params()).unwrap();
    assert!(p.column(Channel::WagVelocity).iter().all(|w| w.is_nan()));
    assert_eq!(p.channel(Channel::VelocityEnu).nrows(), 3);
    assert!(p
        .data_status
        .iter()
        .any(|s| s.contains("wag velocity not computed")));
}

#[test]
fn test_phase_ambiguity() {
    let heading = [0.0; 5];
    let mut xyz = [Xyz::default(); 5];
    // Only the vertical velocity is examined; a fast horizontal one isn't.
    xyz[1].x = 1.9;
    xyz[2].z = 1.9;
    xyz[4].z = -1.9;
    let expected_times = [T0 + 2.0 / SECONDS_PER_DAY, T0 + 4.0 / SECONDS_PER_DAY];

    // Detection only.
    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &heading, &xyz);
    let raw_beams = p.channel(Channel::BeamVelocity).to_owned();
    let params_off = CurrentMeterParams {
        correct_phase_ambiguity: false,
        ambiguity_velocity_m_s: 1.0,
        ..params()
    };
    let records = process_current_meter(&mut p, &params_off).unwrap();
    assert_eq!(records.len(), 2);
    assert_abs_diff_eq!(records[0].raw_velocity, 1.9, epsilon = 1e-12);
    assert_abs_diff_eq!(records[0].time, expected_times[0], epsilon = 1e-12);
    assert_abs_diff_eq!(records[1].raw_velocity, -1.9, epsilon = 1e-12);
    assert_abs_diff_eq!(records[1].time, expected_times[1], epsilon = 1e-12);
    assert!(records.iter().all(|r| r.profile_number == 1));
    assert_abs_diff_eq!(p.channel(Channel::VelocityXyz)[(2, 2)], 1.9, epsilon = 1e-12);
    assert!(p.data_status.iter().any(|s| s.ends_with("found (not corrected)")));

    // Detection and correction.
    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &heading, &xyz);
    let params_on = CurrentMeterParams {
        correct_phase_ambiguity: true,
        ..params_off
    };
    let records = process_current_meter(&mut p, &params_on).unwrap();
    assert_eq!(records.len(), 2);
    assert_abs_diff_eq!(records[0].raw_velocity, 1.9, epsilon = 1e-12);
    let v = p.channel(Channel::VelocityXyz);
    assert_abs_diff_eq!(v[(2, 2)], -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(v[(4, 2)], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(v[(1, 0)], 1.9, epsilon = 1e-12);
    assert_abs_diff_eq!(p.channel(Channel::VelocityEnu)[(2, 2)], -0.1, epsilon = 1e-12);
    // The raw beam velocities are stored untouched.
    for (&a, &b) in p.channel(Channel::BeamVelocity).iter().zip(&raw_beams) {
        assert!(a == b || (a.is_nan() && b.is_nan()));
    }
}

#[test]
fn test_ambiguity_is_ad2cp_only() {
    let heading = [0.0; 3];
    let mut xyz = [Xyz::default(); 3];
    xyz[1].z = 1.9;
    let mut p = synthetic(Instrument::Acm, &[], &heading, &xyz);
    let params = CurrentMeterParams {
        ambiguity_velocity_m_s: 1.0,
        ..params()
    };
    let records = process_current_meter(&mut p, &params).unwrap();
    assert!(records.is_empty());
    assert_abs_diff_eq!(p.channel(Channel::VelocityXyz)[(1, 2)], 1.9, epsilon = 1e-12);
}

#[test]
fn test_ambiguity_needs_a_velocity() {
    let mut xyz = [Xyz::default(); 3];
    xyz[1].z = 50.0;
    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &[0.0; 3], &xyz);
    let records = process_current_meter(&mut p, &params()).unwrap();
    assert!(records.is_empty());
    assert_abs_diff_eq!(p.channel(Channel::VelocityXyz)[(1, 2)], 50.0, epsilon = 1e-9);
}

#[test]
fn test_acm_extreme_tilt() {
    let heading = [45.0; 4];
    let current = Enu {
        e: 0.1,
        n: 0.1,
        u: 0.0,
    };
    let xyz: Vec<Xyz> = heading
        .iter()
        .map(|h: &f64| current.to_xyz(h.to_radians()))
        .collect();
    let mut p = synthetic(Instrument::Acm, &[], &heading, &xyz)
        .with_column(Channel::Pitch, array![0.0, 15.0, 2.0, 0.0])
        .with_column(Channel::Roll, array![0.0, 0.0, 3.0, -12.0]);
    process_current_meter(&mut p, &params()).unwrap();

    let enu = p.channel(Channel::VelocityEnu);
    for &i in &[0, 2] {
        assert_abs_diff_eq!(enu[(i, 0)], 0.1, epsilon = 1e-10);
        assert_abs_diff_eq!(enu[(i, 1)], 0.1, epsilon = 1e-10);
    }
    for &i in &[1, 3] {
        assert!(enu.row(i).iter().all(|v| v.is_nan()));
    }
    assert!(p.data_status.iter().any(|s| s.starts_with("2 samples tilted")));
}

#[test]
fn test_fatal_errors() {
    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &[0.0; 3], &[Xyz::default(); 3]);
    p.beam_mapping = vec![1, 3, 4];
    assert!(matches!(
        process_current_meter(&mut p, &params()),
        Err(CurrentMeterError::UnknownBeamMapping { .. })
    ));

    let mut p = synthetic(Instrument::Ad2cp, &[1, 2, 4], &[0.0; 3], &[Xyz::default(); 3]);
    p.set_channel(Channel::BeamVelocity, Array2::zeros((3, 3)));
    assert_eq!(
        process_current_meter(&mut p, &params()),
        Err(CurrentMeterError::BeamColumns {
            profile: 1,
            expected: 4,
            found: 3
        })
    );
}

#[test]
fn test_no_heading_is_a_no_op() {
    let mut p = Profile::new(Instrument::Ad2cp, 3, "test");
    let records = process_current_meter(&mut p, &params()).unwrap();
    assert!(records.is_empty());
    assert!(p.channel(Channel::VelocityEnu).is_empty());
    assert_eq!(p.data_status, vec!["no heading data; no action taken"]);
    assert_eq!(p.code_history, vec!["process_current_meter"]);
}
