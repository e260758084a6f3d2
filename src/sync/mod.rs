// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Putting secondary instruments on the reference instrument's pressure.
//!
//! Once the CTD has timestamps, its pressure is the best estimate of where
//! the profiler was. The engineering and current-meter records get that
//! pressure interpolated onto their own times, a profiling velocity derived
//! from it, and the CTD's sample mask.

mod error;
#[cfg(test)]
mod tests;

pub use error::SyncError;

use log::{trace, warn};
use ndarray::Array1;

use crate::{
    math::{gradient, interp_linear_extrap, interp_nearest, nan_min_max},
    profile::{Channel, Profile},
    timestamps::acquisition_rate,
};

/// Give `secondary` the pressure, profiling velocity and mask of
/// `reference` at its own sample times. `depth_offset` \[dbar\] is added to
/// the interpolated pressure.
///
/// The secondary's time, mask and acquisition rate must already be set; the
/// reference's time, pressure and mask must be processed.
pub fn sync_to_reference(
    secondary: &mut Profile,
    reference: &Profile,
    depth_offset: f64,
) -> Result<(), SyncError> {
    let time = secondary.column_vec(Channel::Time);
    let (first, last) = nan_min_max(&time).ok_or(SyncError::NoSamples)?;

    let ref_time = reference.column(Channel::Time);
    let ref_pressure = reference.column(Channel::Pressure);
    let ref_rows = ref_time.len().min(ref_pressure.len());
    let ref_mask_valid = reference.mask.len() == ref_rows;

    // Interpolation needs strictly increasing, finite abscissae.
    let mut t_r = Vec::with_capacity(ref_rows);
    let mut p_r = Vec::with_capacity(ref_rows);
    let mut m_r = Vec::with_capacity(ref_rows);
    for i in 0..ref_rows {
        let (t, p) = (ref_time[i], ref_pressure[i]);
        if !(t.is_finite() && p.is_finite()) {
            continue;
        }
        if t_r.last().is_some_and(|&previous| t <= previous) {
            continue;
        }
        t_r.push(t);
        p_r.push(p);
        m_r.push(!ref_mask_valid || reference.mask[i]);
    }
    if t_r.len() < 2 {
        return Err(SyncError::TooFewReferencePoints { found: t_r.len() });
    }
    let (ref_first, ref_last) = (t_r[0], t_r[t_r.len() - 1]);
    if last < ref_first || first > ref_last {
        return Err(SyncError::NoOverlap {
            first,
            last,
            ref_first,
            ref_last,
        });
    }

    let pressure: Vec<f64> = interp_linear_extrap(&t_r, &p_r, &time)
        .ok_or(SyncError::TooFewReferencePoints { found: t_r.len() })?
        .into_iter()
        .map(|p| p + depth_offset)
        .collect();

    let mut rate = secondary.acquisition_rate_hz;
    if !(rate.is_finite() && rate > 0.0) {
        rate = acquisition_rate(&time);
    }
    let dpdt = if rate.is_finite() && rate > 0.0 {
        gradient(&pressure, 1.0 / rate)
    } else {
        vec![f64::NAN; pressure.len()]
    };

    let mask = interp_nearest(&t_r, &m_r, &time, false);
    if secondary.mask.len() != time.len() {
        secondary.mask = vec![true; time.len()];
    }
    secondary.narrow_mask(&mask);
    trace!(
        "Profile {}: {} of {} samples usable after synchronisation",
        secondary.profile_number,
        secondary.num_masked_samples(),
        time.len()
    );

    secondary.set_column(Channel::Pressure, Array1::from(pressure));
    secondary.set_column(Channel::Dpdt, Array1::from(dpdt));
    Ok(())
}

fn sync_profile(step: &str, secondary: &mut Profile, reference: &Profile, depth_offset: f64) {
    secondary.log_step(step);
    let n = secondary.column(Channel::Time).len();
    if n == 0 {
        secondary.log_status("no data; not synchronised");
        return;
    }
    if let Err(e) = sync_to_reference(secondary, reference, depth_offset) {
        warn!(
            "Profile {} ({}): couldn't synchronise to the {}: {e}",
            secondary.profile_number, secondary.instrument, reference.instrument
        );
        secondary.set_column(Channel::Pressure, Array1::from_elem(n, f64::NAN));
        secondary.set_column(Channel::Dpdt, Array1::from_elem(n, f64::NAN));
        secondary.mask = vec![false; n];
        secondary.log_status(format!("synchronisation to {} failed: {e}", reference.instrument));
    }
}

/// Put an engineering profile on the CTD's pressure.
pub fn sync_ctd_eng(eng: &mut Profile, ctd: &Profile, depth_offset: f64) {
    sync_profile("sync_ctd_eng", eng, ctd, depth_offset);
}

/// Put a current-meter profile on the CTD's pressure.
pub fn aqd_sync_ctd(current_meter: &mut Profile, ctd: &Profile, depth_offset: f64) {
    sync_profile("aqd_sync_ctd", current_meter, ctd, depth_offset);
}

/// Mask samples where the profiler moved slower than `min_speed` \[dbar/s\].
/// Samples with an unknown speed are masked too. A threshold that isn't
/// positive does nothing.
pub fn mask_slow_samples(profile: &mut Profile, min_speed: f64) {
    if !(min_speed.is_finite() && min_speed > 0.0) {
        return;
    }
    profile.log_step("mask_slow_samples");
    let dpdt = profile.column_vec(Channel::Dpdt);
    if profile.mask.len() != dpdt.len() {
        profile.mask = vec![true; dpdt.len()];
    }
    let fast: Vec<bool> = dpdt.iter().map(|v| v.abs() >= min_speed).collect();
    let before = profile.num_masked_samples();
    profile.narrow_mask(&fast);
    let masked = before - profile.num_masked_samples();
    if masked > 0 {
        profile.log_status(format!("{masked} samples slower than {min_speed} dbar/s masked"));
    }
}
