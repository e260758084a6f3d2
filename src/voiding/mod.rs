// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Removing profiles (or parts of profiles) that can't be trusted.
//!
//! A profile that is too short, spans too little pressure, or has no usable
//! samples is voided: its active channels are emptied, keeping their widths,
//! so it still stacks with its siblings. Separately, a profile where the
//! profiler reversed ("backtracked") is treated according to a policy code.


use std::ops::Range;

use log::{debug, trace};
use strum_macros::Display;

use crate::{
    constants::SECONDS_PER_DAY,
    math::gradient,
    params::VoidingParams,
    profile::{Channel, Profile, ProfileDirection, VoidState},
    timestamps::acquisition_rate,
};

/// Void a profile whose usable pressures are too few, too narrow in range,
/// or all missing. Returns the profile's resulting state.
///
/// A voided profile stays voided; examining it again only adds a status
/// entry.
pub fn void_short_profiles(profile: &mut Profile, params: &VoidingParams) -> VoidState {
    profile.log_step("void_short_profiles");
    if profile.is_voided() {
        profile.log_status("already voided");
        return VoidState::Voided;
    }
    if profile.mask.len() != profile.num_samples() {
        profile.reset_mask();
    }

    let usable = profile.masked_column(Channel::Pressure);
    let reason = match profile.masked_range(Channel::Pressure) {
        _ if usable.len() <= params.min_samples => Some(format!(
            "voided: {} usable samples (need more than {})",
            usable.len(),
            params.min_samples
        )),
        None => Some("voided: every usable pressure is missing".to_string()),
        Some((lo, hi)) if hi - lo <= params.min_pressure_range_dbar => Some(format!(
            "voided: usable pressures only span {:.2} dbar",
            hi - lo
        )),
        Some(_) => None,
    };

    match reason {
        Some(reason) => {
            debug!("Profile {} ({}): {reason}", profile.profile_number, profile.instrument);
            profile.void(reason);
        }
        None => profile.void_state = VoidState::Retained,
    }
    profile.void_state
}

/// What to do with a profile in which the profiler reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BacktrackPolicy {
    /// Code 1.
    VoidProfile,
    /// Code 2: keep only samples more than a margin before the first
    /// reversal.
    KeepBeforeFirst,
    /// Code 3: mask only the samples taken during reversals.
    FlagReversals,
}

impl BacktrackPolicy {
    /// Codes other than 1, 2 and 3 mean "don't look for backtracks".
    pub fn from_code(code: i64) -> Option<BacktrackPolicy> {
        match code {
            1 => Some(BacktrackPolicy::VoidProfile),
            2 => Some(BacktrackPolicy::KeepBeforeFirst),
            3 => Some(BacktrackPolicy::FlagReversals),
            _ => None,
        }
    }
}

/// Find the sample ranges where the profiler moved against the profile's
/// direction. `sign` is +1 for a descending profile and -1 for an ascending
/// one. A reversal starts where the profiling velocity points the wrong way
/// by more than `speed_threshold`, and ends once the pressure is beyond the
/// furthest point reached before it.
pub fn find_reversals(
    pressure: &[f64],
    dpdt: &[f64],
    sign: f64,
    speed_threshold: f64,
) -> Vec<Range<usize>> {
    let n = pressure.len().min(dpdt.len());
    let mut reversals = vec![];
    let mut furthest = f64::NEG_INFINITY;
    let mut i = 0;
    while i < n {
        if sign * dpdt[i] < -speed_threshold {
            // The onset may itself be the turning point, so it counts
            // towards the furthest pressure and is always consumed.
            let start = i;
            if pressure[i].is_finite() {
                furthest = furthest.max(sign * pressure[i]);
            }
            i += 1;
            while i < n && !(sign * pressure[i] > furthest) {
                i += 1;
            }
            reversals.push(start..i);
            continue;
        }
        if pressure[i].is_finite() {
            furthest = furthest.max(sign * pressure[i]);
        }
        i += 1;
    }
    reversals
}

/// Apply a backtrack policy to one (engineering) profile. Returns the number
/// of reversals found.
pub fn flag_backtracks(
    profile: &mut Profile,
    code: i64,
    margin_s: f64,
    speed_threshold: f64,
) -> usize {
    let Some(policy) = BacktrackPolicy::from_code(code) else {
        trace!("Backtrack code {code} disables backtrack flagging");
        return 0;
    };
    profile.log_step("flag_backtracks");

    let pressure = profile.column_vec(Channel::Pressure);
    let n = pressure.len();
    if n < 2 || profile.is_voided() {
        return 0;
    }
    profile.infer_direction();
    let sign = match profile.direction {
        ProfileDirection::Descending => 1.0,
        ProfileDirection::Ascending => -1.0,
        ProfileDirection::Stationary | ProfileDirection::Unknown => return 0,
    };

    let time = profile.column_vec(Channel::Time);
    let dpdt = {
        let stored = profile.column_vec(Channel::Dpdt);
        if stored.len() == n {
            stored
        } else {
            let mut rate = profile.acquisition_rate_hz;
            if !(rate.is_finite() && rate > 0.0) {
                rate = acquisition_rate(&time);
            }
            let spacing = if rate.is_finite() && rate > 0.0 {
                1.0 / rate
            } else {
                1.0
            };
            gradient(&pressure, spacing)
        }
    };

    let reversals = find_reversals(&pressure, &dpdt, sign, speed_threshold);
    if reversals.is_empty() {
        return 0;
    }
    if profile.mask.len() != n {
        profile.mask = vec![true; n];
    }
    debug!(
        "Profile {}: {} reversals; applying {policy}",
        profile.profile_number,
        reversals.len()
    );

    match policy {
        BacktrackPolicy::VoidProfile => {
            profile.void(format!("voided: {} backtracks", reversals.len()));
        }

        BacktrackPolicy::KeepBeforeFirst => {
            let first = reversals[0].start;
            let keep: Vec<bool> = match time.get(first) {
                Some(&t0) if t0.is_finite() => {
                    let cutoff = t0 - margin_s / SECONDS_PER_DAY;
                    (0..n).map(|i| time.get(i).is_some_and(|&t| t < cutoff)).collect()
                }
                _ => (0..n).map(|i| i < first).collect(),
            };
            profile.narrow_mask(&keep);
            profile.log_status(format!(
                "backtrack at sample {first}; samples from {margin_s} s before it masked"
            ));
        }

        BacktrackPolicy::FlagReversals => {
            let mut keep = vec![true; n];
            for r in &reversals {
                keep[r.clone()].iter_mut().for_each(|k| *k = false);
            }
            let num_flagged = keep.iter().filter(|&&k| !k).count();
            profile.narrow_mask(&keep);
            profile.log_status(format!(
                "{} backtracks; {num_flagged} samples masked",
                reversals.len()
            ));
        }
    }
    reversals.len()
}
