// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Reasons timestamps couldn't be derived for one profile. None of these are
/// fatal to a deployment; the profile gets an all-NaN time record instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
    #[error("The untimed pressure record has no monotonic run")]
    NoMonotonicRun,

    #[error("The reference record has {time} times but {pressure} pressures")]
    ReferenceLengthMismatch { time: usize, pressure: usize },

    #[error("Only {found} pressure values are common to both records; need at least {need}")]
    TooFewCommonPressures { found: usize, need: usize },

    #[error("The derived timestamps don't increase (time step {step} days per row)")]
    NotIncreasing { step: f64 },
}
