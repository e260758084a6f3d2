// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::profile::Instrument;

/// Current-meter data that can't be interpreted at all. Any of these abort a
/// deployment's processing, because there is no safe default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurrentMeterError {
    #[error("Profile {profile}: the {instrument} beam mapping {mapping:?} isn't supported")]
    UnknownBeamMapping {
        profile: u32,
        instrument: Instrument,
        mapping: Vec<u8>,
    },

    #[error("Profile {profile}: expected {expected} beam velocity columns, found {found}")]
    BeamColumns {
        profile: u32,
        expected: usize,
        found: usize,
    },

    #[error("The transducer geometry at {angle_deg}° from vertical can't be inverted")]
    SingularGeometry { angle_deg: f64 },
}
