// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Doppler phase-ambiguity unwrapping.

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_AMBIGUITY_WRAPS;

/// A vertical velocity that was outside the unambiguous range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityRecord {
    pub profile_number: u32,
    /// Serial day number of the sample.
    pub time: f64,
    /// The vertical velocity before any correction \[m/s\].
    pub raw_velocity: f64,
}

/// Look for aliased values in a vertical-velocity record and, if `apply`,
/// shift them back.
///
/// Wrap counts are tried from the largest down. A value beyond
/// `(n - threshold) * ambiguity_velocity` is shifted by
/// `n * ambiguity_velocity` towards zero. Every sample that is flagged at any
/// wrap count is returned once with its original value, whether or not it
/// was corrected.
pub(super) fn unwrap_phase_ambiguity(
    mut velocity: ArrayViewMut1<f64>,
    ambiguity_velocity: f64,
    threshold: f64,
    apply: bool,
) -> Vec<(usize, f64)> {
    let original = velocity.to_owned();
    let mut flagged = vec![false; velocity.len()];

    for wraps in (1..=MAX_AMBIGUITY_WRAPS).rev() {
        let n = f64::from(wraps);
        let limit = (n - threshold) * ambiguity_velocity;
        for (v, f) in velocity.iter_mut().zip(flagged.iter_mut()) {
            let shift = if *v > limit {
                -n * ambiguity_velocity
            } else if *v < -limit {
                n * ambiguity_velocity
            } else {
                continue;
            };
            *f = true;
            if apply {
                *v += shift;
            }
        }
    }

    flagged
        .into_iter()
        .zip(original.iter())
        .enumerate()
        .filter_map(|(row, (f, &v))| f.then_some((row, v)))
        .collect()
}
