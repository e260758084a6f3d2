// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The channel schema, instruments and processing stages.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every named sample-indexed quantity a profile may carry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Serial day number.
    Time,
    /// \[dbar\]
    Pressure,
    /// Profiling velocity \[dbar/s\]; positive when descending.
    Dpdt,

    /// \[°C\]
    Temperature,
    /// \[S/m\]
    Conductivity,
    /// \[µmol/kg\]
    Oxygen,

    /// \[µg/l\]
    Chlorophyll,
    /// \[m^-1 sr^-1\]
    Backscatter,
    /// \[µmol photons m^-2 s^-1\]
    Par,

    /// Compass heading \[degrees\], wrapped to [0, 360) when stored.
    Heading,
    /// \[degrees\]
    Pitch,
    /// \[degrees\]
    Roll,

    /// Along-beam velocities, one column per transducer \[m/s\].
    BeamVelocity,
    /// Instrument-frame velocities (X, Y, Z) \[m/s\].
    VelocityXyz,
    /// Geographic velocities (East, North, Up) \[m/s\].
    VelocityEnu,
    /// The theoretical velocity induced by the profiler rotating about its
    /// mooring wire \[m/s\].
    WagVelocity,
}

impl Channel {
    /// The number of columns this channel always has.
    pub fn width(self) -> usize {
        match self {
            Channel::BeamVelocity => 4,
            Channel::VelocityXyz | Channel::VelocityEnu => 3,
            _ => 1,
        }
    }

    /// A zero-row array of the right width.
    pub fn empty(self) -> Array2<f64> {
        Array2::zeros((0, self.width()))
    }
}

/// The instruments on a McLane Moored Profiler.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Sea-Bird 52-MP CTD. Records no time per sample.
    Ctd,
    /// The engineering / bio-optical stream. Time stamped.
    Eng,
    /// Nortek AD2CP Doppler current meter (coastal profilers).
    Ad2cp,
    /// FSI 3DMP acoustic travel-time current meter (global profilers).
    Acm,
}

impl Instrument {
    pub fn is_current_meter(self) -> bool {
        matches!(self, Instrument::Ad2cp | Instrument::Acm)
    }
}

/// How far along the processing a profile is. These are this project's
/// L0/L1/L2 levels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// As imported.
    #[default]
    #[strum(serialize = "L0")]
    Raw,
    /// Calibrated, corrected and synchronised, but not binned.
    #[strum(serialize = "L1")]
    Processed,
    /// Reduced onto the pressure grid.
    #[strum(serialize = "L2")]
    Binned,
}

impl ProcessingStage {
    /// The channels that take part in reductions and concatenations at this
    /// stage. Raw beam velocities are consumed by the frame transforms and
    /// don't survive past [`ProcessingStage::Raw`].
    pub fn active_channels(self, instrument: Instrument) -> &'static [Channel] {
        use Channel::*;
        use Instrument::*;
        use ProcessingStage::*;

        match (instrument, self) {
            (Ctd, Raw) => &[Pressure, Temperature, Conductivity, Oxygen],
            (Ctd, Processed) => &[Time, Pressure, Dpdt, Temperature, Conductivity, Oxygen],
            (Ctd, Binned) => &[Time, Pressure, Temperature, Conductivity, Oxygen],

            (Eng, Raw) => &[Time, Pressure, Chlorophyll, Backscatter, Par],
            (Eng, Processed) => &[Time, Pressure, Dpdt, Chlorophyll, Backscatter, Par],
            (Eng, Binned) => &[Time, Pressure, Chlorophyll, Backscatter, Par],

            (Ad2cp | Acm, Raw) => &[Time, Heading, Pitch, Roll, BeamVelocity],
            (Ad2cp | Acm, Processed) => &[
                Time,
                Pressure,
                Dpdt,
                Heading,
                Pitch,
                Roll,
                VelocityXyz,
                VelocityEnu,
                WagVelocity,
            ],
            (Ad2cp | Acm, Binned) => &[Time, Pressure, Heading, VelocityEnu, WagVelocity],
        }
    }
}
