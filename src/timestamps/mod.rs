// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Giving the CTD timestamps.
//!
//! The CTD records pressure but no time per sample. The engineering stream
//! records both. Pressures that appear exactly once in the monotonic part of
//! the CTD record and exactly once in the engineering record pin CTD rows to
//! engineering times; the extreme pair of such pressures defines a straight
//! line from CTD row index to time.

mod error;

pub use error::TimestampError;

use std::collections::HashMap;

use log::{debug, warn};
use ndarray::Array1;

use crate::{
    constants::{MIN_COMMON_PRESSURES, SECONDS_PER_DAY},
    filter::sbefilter_1d,
    math::{discard_degeneracy, longest_monotonic_run, value_key},
    profile::{Channel, Profile},
};

/// Derive a time for every sample of `untimed_pressure` from a time-stamped
/// reference record.
///
/// * `untimed_rate` is the untimed instrument's nominal sample rate \[Hz\];
///   it's only used to smooth the untimed pressure before looking for its
///   longest monotonic run.
/// * `gamma` is that smoothing time constant \[s\]; 0 disables smoothing.
///
/// The returned times are in the units of `reference_time`.
pub fn derive_timestamps(
    untimed_pressure: &[f64],
    untimed_rate: f64,
    reference_time: &[f64],
    reference_pressure: &[f64],
    gamma: f64,
) -> Result<Vec<f64>, TimestampError> {
    if reference_time.len() != reference_pressure.len() {
        return Err(TimestampError::ReferenceLengthMismatch {
            time: reference_time.len(),
            pressure: reference_pressure.len(),
        });
    }

    // Smoothing only decides where the monotonic run is; the matching uses
    // the recorded values.
    let run = if gamma > 0.0 {
        let smoothed = sbefilter_1d(
            ndarray::ArrayView1::from(untimed_pressure),
            untimed_rate,
            gamma,
        );
        longest_monotonic_run(smoothed.as_slice().unwrap_or(&[]))
    } else {
        longest_monotonic_run(untimed_pressure)
    };
    let run_indices: Vec<usize> = run
        .iter()
        .enumerate()
        .filter(|(_, &r)| r)
        .map(|(i, _)| i)
        .collect();
    if run_indices.len() < 2 {
        return Err(TimestampError::NoMonotonicRun);
    }
    let untimed = singletons(untimed_pressure, &run_indices);

    // The first wet sample has an unreliable time.
    let first_wet = first_wet_sample(reference_pressure);
    let reference_indices: Vec<usize> = (first_wet + 1..reference_pressure.len())
        .filter(|&i| reference_time[i].is_finite())
        .collect();
    let reference: HashMap<u64, usize> = singletons(reference_pressure, &reference_indices)
        .into_iter()
        .map(|(p, i)| (value_key(p), i))
        .collect();

    let mut common: Vec<(f64, usize, usize)> = untimed
        .into_iter()
        .filter_map(|(p, i_untimed)| {
            reference
                .get(&value_key(p))
                .map(|&i_reference| (p, i_untimed, i_reference))
        })
        .collect();
    if common.len() < MIN_COMMON_PRESSURES {
        return Err(TimestampError::TooFewCommonPressures {
            found: common.len(),
            need: MIN_COMMON_PRESSURES,
        });
    }
    common.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    // The lowest common pressure is the most affected by jitter near the
    // turning point.
    let (_, u_lo, r_lo) = common[1];
    let (_, u_hi, r_hi) = common[common.len() - 1];
    debug!(
        "Matched {} common pressures; anchors at rows {u_lo} and {u_hi}",
        common.len()
    );

    let step = (reference_time[r_hi] - reference_time[r_lo]) / (u_hi as f64 - u_lo as f64);
    if !(step > 0.0) {
        return Err(TimestampError::NotIncreasing { step });
    }
    let t_lo = reference_time[r_lo];
    Ok((0..untimed_pressure.len())
        .map(|i| t_lo + step * (i as f64 - u_lo as f64))
        .collect())
}

/// The values at `indices` that occur exactly once among them, paired with
/// their index into `x`.
fn singletons(x: &[f64], indices: &[usize]) -> Vec<(f64, usize)> {
    let values: Vec<f64> = indices.iter().map(|&i| x[i]).collect();
    let (_, mask) = discard_degeneracy(&values);
    indices
        .iter()
        .zip(mask)
        .filter(|(_, m)| *m)
        .map(|(&i, _)| (x[i], i))
        .collect()
}

/// The effective sample rate of day-valued timestamps \[Hz\].
pub fn acquisition_rate(time: &[f64]) -> f64 {
    match time {
        [first, .., last] => (time.len() - 1) as f64 / (SECONDS_PER_DAY * (last - first)),
        _ => f64::NAN,
    }
}

/// Give a CTD profile the times of the matching engineering profile.
///
/// On failure the CTD profile's time record is all NaN and the reason is
/// logged into its status; the profile stays in the collection so later
/// steps see it as having no usable samples.
pub fn add_ctd_timestamps(ctd: &mut Profile, eng: &Profile, gamma: f64) {
    const STEP: &str = "add_ctd_timestamps";
    ctd.log_step(STEP);
    let n = ctd.column(Channel::Pressure).len();
    if n == 0 {
        ctd.log_status("no CTD data; timestamps not derived");
        return;
    }

    let pressure = ctd.column_vec(Channel::Pressure);
    let result = derive_timestamps(
        &pressure,
        ctd.acquisition_rate_hz,
        &eng.column_vec(Channel::Time),
        &eng.column_vec(Channel::Pressure),
        gamma,
    );
    match result {
        Ok(time) => {
            ctd.acquisition_rate_hz = acquisition_rate(&time);
            ctd.set_column(Channel::Time, Array1::from(time));
        }
        Err(e) => {
            warn!("Profile {}: couldn't derive CTD timestamps: {e}", ctd.profile_number);
            ctd.set_column(Channel::Time, Array1::from_elem(n, f64::NAN));
            ctd.log_status(format!("timestamp synchronisation failed: {e}"));
        }
    }
}

/// The index of the reference instrument's first real reading; it reads zero
/// (or nothing) until it's in the water. The length if there is none.
fn first_wet_sample(pressure: &[f64]) -> usize {
    pressure
        .iter()
        .position(|&p| p != 0.0 && !p.is_nan())
        .unwrap_or(pressure.len())
}
