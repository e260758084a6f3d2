// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Reasons one profile couldn't be synchronised to its reference. The
/// profile gets NaN pressures and an all-false mask instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("The profile has no timestamps")]
    NoSamples,

    #[error("The reference has {found} usable samples; need at least 2")]
    TooFewReferencePoints { found: usize },

    #[error("The profile's times ({first}..{last}) don't overlap the reference's ({ref_first}..{ref_last})")]
    NoOverlap {
        first: f64,
        last: f64,
        ref_first: f64,
        ref_last: f64,
    },
}
