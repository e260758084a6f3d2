// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
The acoustic current-meter correction chain.

For each profile, in order:

1. Beam to instrument-frame (XYZ) transform.
2. Doppler phase-ambiguity unwrapping of the vertical (Z) velocity (AD2CP
   only). The raw beam velocities are kept as they were.
3. Wag: the velocity induced by the profiler rotating about its mooring wire
   is computed from the heading rate, and optionally removed from Y.
4. Rotation into East-North-Up. The AD2CP uses its full attitude; the ACM
   uses heading only, and samples with extreme tilt get NaN velocities.

Every step works on one profile at a time. A profile without heading data
is left alone apart from a status entry.
 */

mod ambiguity;
mod error;
mod frames;
mod geometry;
mod wag;
#[cfg(test)]
mod tests;

pub use ambiguity::AmbiguityRecord;
pub use error::CurrentMeterError;
pub use frames::{Enu, Xyz};
pub use geometry::{BeamGeometry, BeamMapping};

use log::{debug, trace};
use ndarray::prelude::*;

use crate::{
    math::wrap_degrees,
    params::CurrentMeterParams,
    profile::{Channel, Instrument, Profile},
    timestamps::acquisition_rate,
};

/// Run the correction chain on one raw current-meter profile. Returns the
/// ambiguous samples that were found, corrected or not.
///
/// Errors are only returned for data that can't be interpreted (an unknown
/// beam mapping or the wrong number of beam columns).
pub fn process_current_meter(
    profile: &mut Profile,
    params: &CurrentMeterParams,
) -> Result<Vec<AmbiguityRecord>, CurrentMeterError> {
    const STEP: &str = "process_current_meter";
    profile.log_step(STEP);

    let heading = profile.column_vec(Channel::Heading);
    let n = heading.len();
    if n == 0 {
        profile.log_status("no heading data; no action taken");
        return Ok(vec![]);
    }

    let beam_columns = profile.channel(Channel::BeamVelocity).ncols();
    if beam_columns != Channel::BeamVelocity.width() {
        return Err(CurrentMeterError::BeamColumns {
            profile: profile.profile_number,
            expected: Channel::BeamVelocity.width(),
            found: beam_columns,
        });
    }
    if profile.channel(Channel::BeamVelocity).nrows() != n {
        profile.log_status(format!(
            "{} beam velocity rows but {n} headings; no action taken",
            profile.channel(Channel::BeamVelocity).nrows()
        ));
        return Ok(vec![]);
    }

    let mapping =
        BeamMapping::from_profile(profile.instrument, profile.profile_number, &profile.beam_mapping)?;
    let geometry = BeamGeometry::new(mapping, params.beam_angle_deg(profile.instrument))?;

    let mut xyz = geometry.beam_to_xyz(profile.channel(Channel::BeamVelocity));
    let records = if profile.instrument == Instrument::Ad2cp {
        correct_ambiguity(profile, xyz.column_mut(2), params)
    } else {
        vec![]
    };

    let mut rate = profile.acquisition_rate_hz;
    if !(rate.is_finite() && rate > 0.0) {
        rate = acquisition_rate(&profile.column_vec(Channel::Time));
    }
    let heading_for_rotation = if rate.is_finite() && rate > 0.0 {
        let wag = wag::wag_velocity(&heading, rate, params.heading_gamma_s, params.wag_radius_m);
        if params.correct_wag {
            xyz.column_mut(1)
                .iter_mut()
                .zip(&wag.velocity)
                .for_each(|(y, w)| *y -= w);
        }
        profile.set_column(Channel::WagVelocity, Array1::from(wag.velocity));
        wag.heading_deg
    } else {
        profile.log_status("no valid sample rate; wag velocity not computed");
        profile.set_column(Channel::WagVelocity, Array1::from_elem(n, f64::NAN));
        heading
    };

    let enu = match profile.instrument {
        Instrument::Acm => {
            let pitch = profile.column_vec(Channel::Pitch);
            let roll = profile.column_vec(Channel::Roll);
            let mut enu = frames::rotate_to_enu(xyz.view(), &heading_for_rotation, &[], &[]);
            let tilted = frames::extreme_tilt_rows(&pitch, &roll, params.extreme_tilt_deg);
            let num_tilted = tilted.iter().filter(|&&t| t).count();
            if num_tilted > 0 {
                for (mut row, _) in enu.outer_iter_mut().zip(&tilted).filter(|(_, &t)| t) {
                    row.fill(f64::NAN);
                }
                profile.log_status(format!(
                    "{num_tilted} samples tilted beyond {}°; velocities set to NaN",
                    params.extreme_tilt_deg
                ));
            }
            enu
        }
        _ => frames::rotate_to_enu(
            xyz.view(),
            &heading_for_rotation,
            &profile.column_vec(Channel::Pitch),
            &profile.column_vec(Channel::Roll),
        ),
    };
    trace!("Profile {}: {} ENU rows", profile.profile_number, enu.nrows());

    profile.set_channel(Channel::VelocityXyz, xyz);
    profile.set_channel(Channel::VelocityEnu, enu);
    profile.set_column(
        Channel::Heading,
        Array1::from(wrap_degrees(&heading_for_rotation)),
    );
    if profile.mask.len() != n {
        profile.mask = vec![true; n];
    }
    Ok(records)
}

fn correct_ambiguity(
    profile: &mut Profile,
    vertical: ArrayViewMut1<f64>,
    params: &CurrentMeterParams,
) -> Vec<AmbiguityRecord> {
    let va = params.ambiguity_velocity_m_s;
    if !(va.is_finite() && va > 0.0) {
        if params.correct_phase_ambiguity {
            profile.log_status("no ambiguity velocity configured; phase ambiguity not examined");
        }
        return vec![];
    }

    let flagged = ambiguity::unwrap_phase_ambiguity(
        vertical,
        va,
        params.ambiguity_threshold,
        params.correct_phase_ambiguity,
    );
    if flagged.is_empty() {
        return vec![];
    }
    debug!(
        "Profile {}: {} ambiguous vertical velocities",
        profile.profile_number,
        flagged.len()
    );
    profile.log_status(format!(
        "{} ambiguous vertical velocities {}",
        flagged.len(),
        if params.correct_phase_ambiguity {
            "corrected"
        } else {
            "found (not corrected)"
        }
    ));

    let time = profile.column(Channel::Time);
    flagged
        .into_iter()
        .map(|(row, raw_velocity)| AmbiguityRecord {
            profile_number: profile.profile_number,
            time: time.get(row).copied().unwrap_or(f64::NAN),
            raw_velocity,
        })
        .collect()
}
