// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-deployment processing parameters.
//!
//! Everything here may be given in an arguments file (toml or json). Every
//! field has a default, so a file only needs to list what differs. Numeric
//! values are never rejected; nonsensical ones are made safe where they're
//! used (e.g. a bin size of 0 becomes 1).

mod error;

pub use error::ParamsError;

use std::{fs::File, io::Read, ops::RangeInclusive, path::Path, str::FromStr};

use itertools::Itertools;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::{
        ACM_PATH_ANGLE_DEG, AD2CP_BEAM_ANGLE_DEG, COASTAL_CTD_TIMESTAMP_GAMMA,
        DEFAULT_AMBIGUITY_THRESHOLD, DEFAULT_BACKTRACK_MARGIN, DEFAULT_EXTREME_TILT_DEG,
        DEFAULT_WAG_RADIUS, GLOBAL_CTD_TIMESTAMP_GAMMA,
    },
    profile::Instrument,
};

lazy_static::lazy_static! {
    pub static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

/// Deserialise an arguments file, picking the format from its extension.
pub fn read_arg_file<T: DeserializeOwned>(arg_file: &Path) -> Result<T, ParamsError> {
    debug!("Attempting to parse argument file {}", arg_file.display());

    let arg_file_type = arg_file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .and_then(|e| ArgFileTypes::from_str(&e).ok());

    let mut contents = String::new();
    match arg_file_type {
        Some(ArgFileTypes::Toml) => {
            debug!("Parsing toml file...");
            File::open(arg_file)?.read_to_string(&mut contents)?;
            toml::from_str(&contents).map_err(|e| ParamsError::Decode {
                file: arg_file.display().to_string(),
                format: "toml",
                err: e.to_string(),
            })
        }
        Some(ArgFileTypes::Json) => {
            debug!("Parsing json file...");
            File::open(arg_file)?.read_to_string(&mut contents)?;
            serde_json::from_str(&contents).map_err(|e| ParamsError::Decode {
                file: arg_file.display().to_string(),
                format: "json",
                err: e.to_string(),
            })
        }
        None => Err(ParamsError::UnknownExtension {
            file: arg_file.display().to_string(),
            valid: ARG_FILE_TYPES_COMMA_SEPARATED.clone(),
        }),
    }
}

/// Everything that tunes the processing of one deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentParams {
    pub deployment_id: String,

    /// First and last profile numbers to process (inclusive). Profiles
    /// outside are kept in the collections but voided. All are processed if
    /// this isn't given.
    pub profiles_to_process: Option<(u32, u32)>,

    pub ctd: CtdParams,
    pub eng: EngParams,
    pub current_meter: CurrentMeterParams,
    pub voiding: VoidingParams,
    pub binning: BinningConfig,
}

impl DeploymentParams {
    pub fn read(arg_file: &Path) -> Result<DeploymentParams, ParamsError> {
        read_arg_file(arg_file)
    }

    pub fn profile_range(&self) -> Option<RangeInclusive<u32>> {
        self.profiles_to_process.map(|(first, last)| first..=last)
    }

    /// The CTD timestamp smoothing constant \[s\]; the one given, otherwise
    /// the default for the kind of profiler.
    pub fn ctd_timestamp_gamma(&self) -> f64 {
        self.ctd
            .timestamp_gamma_s
            .unwrap_or_else(|| self.current_meter.kind.ctd_timestamp_gamma())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtdParams {
    /// Smoothing time constant applied to the CTD pressure before looking for
    /// its monotonic run when deriving timestamps \[s\]. When not given,
    /// coastal profilers use 0 and global profilers 0.25.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_gamma_s: Option<f64>,

    /// The nominal sample rate, used until timestamps give the real one
    /// \[Hz\].
    pub acquisition_rate_hz: f64,
}

impl Default for CtdParams {
    fn default() -> Self {
        CtdParams {
            timestamp_gamma_s: None,
            acquisition_rate_hz: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngParams {
    /// Added to the CTD pressure interpolated onto the engineering record
    /// \[dbar\].
    pub depth_offset_dbar: f64,

    /// 1: void profiles that backtrack. 2: keep samples up to a margin before
    /// the first reversal. 3: flag only the reversals. Anything else: don't
    /// look for backtracks.
    pub backtrack_code: i64,

    /// \[s\]
    pub backtrack_margin_s: f64,

    /// Profiling speeds below this don't count as reversals \[dbar/s\].
    pub backtrack_speed_threshold_dbar_s: f64,
}

impl Default for EngParams {
    fn default() -> Self {
        EngParams {
            depth_offset_dbar: 0.0,
            backtrack_code: 0,
            backtrack_margin_s: DEFAULT_BACKTRACK_MARGIN,
            backtrack_speed_threshold_dbar_s: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CurrentMeterKind {
    /// Coastal profilers.
    #[default]
    Ad2cp,
    /// Global profilers.
    Acm,
}

impl CurrentMeterKind {
    pub fn instrument(self) -> Instrument {
        match self {
            CurrentMeterKind::Ad2cp => Instrument::Ad2cp,
            CurrentMeterKind::Acm => Instrument::Acm,
        }
    }

    pub fn ctd_timestamp_gamma(self) -> f64 {
        match self {
            CurrentMeterKind::Ad2cp => COASTAL_CTD_TIMESTAMP_GAMMA,
            CurrentMeterKind::Acm => GLOBAL_CTD_TIMESTAMP_GAMMA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentMeterParams {
    pub kind: CurrentMeterKind,

    pub correct_phase_ambiguity: bool,
    /// The AD2CP's unambiguous velocity range \[m/s\]. Ambiguity isn't
    /// examined unless this is positive.
    pub ambiguity_velocity_m_s: f64,
    /// In units of the ambiguity velocity.
    pub ambiguity_threshold: f64,

    pub correct_wag: bool,
    /// \[m\]
    pub wag_radius_m: f64,
    /// Heading smoothing time constant \[s\].
    pub heading_gamma_s: f64,

    /// Transducer angle from the instrument Z axis \[degrees\]. Defaults
    /// depend on the instrument.
    pub beam_angle_deg: Option<f64>,

    /// ACM samples with pitch or roll beyond this get NaN velocities
    /// \[degrees\].
    pub extreme_tilt_deg: f64,

    /// Added to the CTD pressure interpolated onto the current-meter record
    /// \[dbar\].
    pub depth_offset_dbar: f64,

    /// Samples slower than this are masked \[dbar/s\]. 0 disables.
    pub min_speed_dbar_s: f64,
}

impl Default for CurrentMeterParams {
    fn default() -> Self {
        CurrentMeterParams {
            kind: CurrentMeterKind::default(),
            correct_phase_ambiguity: true,
            ambiguity_velocity_m_s: 0.0,
            ambiguity_threshold: DEFAULT_AMBIGUITY_THRESHOLD,
            correct_wag: true,
            wag_radius_m: DEFAULT_WAG_RADIUS,
            heading_gamma_s: 0.0,
            beam_angle_deg: None,
            extreme_tilt_deg: DEFAULT_EXTREME_TILT_DEG,
            depth_offset_dbar: 0.0,
            min_speed_dbar_s: 0.0,
        }
    }
}

impl CurrentMeterParams {
    pub fn beam_angle_deg(&self, instrument: Instrument) -> f64 {
        self.beam_angle_deg.unwrap_or(match instrument {
            Instrument::Acm => ACM_PATH_ANGLE_DEG,
            _ => AD2CP_BEAM_ANGLE_DEG,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidingParams {
    /// Profiles with this many usable samples or fewer are voided.
    pub min_samples: usize,
    /// Profiles spanning this pressure range or less are voided \[dbar\].
    pub min_pressure_range_dbar: f64,
}

impl Default for VoidingParams {
    fn default() -> Self {
        VoidingParams {
            min_samples: 1,
            min_pressure_range_dbar: 0.0,
        }
    }
}

/// A pressure grid as given by the user. Missing values are derived from the
/// data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningArgs {
    pub min: Option<f64>,
    pub size: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningConfig {
    pub ctd: BinningArgs,
    pub eng: BinningArgs,
    pub current_meter: BinningArgs,
}

impl BinningConfig {
    pub fn for_instrument(&self, instrument: Instrument) -> &BinningArgs {
        match instrument {
            Instrument::Ctd => &self.ctd,
            Instrument::Eng => &self.eng,
            Instrument::Ad2cp | Instrument::Acm => &self.current_meter,
        }
    }
}
