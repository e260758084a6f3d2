// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. Changing any of the defaults below
changes the scientific output of a processing run; they are empirically tuned
per instrument family and are exposed through [`crate::DeploymentParams`]
rather than being used directly.
 */

/// Times are serial day numbers; this converts day differences to seconds.
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// The smoothing time constant applied to global (SBE 52-MP) CTD pressure
/// before looking for its longest monotonic run \[seconds\].
pub const GLOBAL_CTD_TIMESTAMP_GAMMA: f64 = 0.25;

/// Coastal CTD pressure is fine enough that no smoothing is needed.
pub const COASTAL_CTD_TIMESTAMP_GAMMA: f64 = 0.0;

/// The minimum number of pressure values common to both the untimed and the
/// reference record before timestamps can be derived.
pub const MIN_COMMON_PRESSURES: usize = 4;

/// Phase-wrap counts examined by the ambiguity correction, largest first.
pub const MAX_AMBIGUITY_WRAPS: u32 = 5;

/// Fraction of an ambiguity velocity below a wrap count at which a raw
/// velocity is considered wrapped.
pub const DEFAULT_AMBIGUITY_THRESHOLD: f64 = 0.25;

/// Effective radius of the current meter's sensing volume about the mooring
/// wire \[metres\].
pub const DEFAULT_WAG_RADIUS: f64 = 0.43;

/// Slant angle of the Nortek AD2CP transducers from the instrument Z axis
/// \[degrees\].
pub const AD2CP_BEAM_ANGLE_DEG: f64 = 25.0;

/// Angle of the FSI 3DMP acoustic paths from the instrument Z axis
/// \[degrees\].
pub const ACM_PATH_ANGLE_DEG: f64 = 45.0;

/// Pitch or roll beyond which the small-tilt rotation used for the ACM is no
/// longer trusted \[degrees\].
pub const DEFAULT_EXTREME_TILT_DEG: f64 = 10.0;

/// Time kept before the first detected backtrack when the backtrack policy
/// truncates a profile \[seconds\].
pub const DEFAULT_BACKTRACK_MARGIN: f64 = 30.0;

/// Net pressure changes smaller than this mark a profile as stationary
/// \[dbar\].
pub const STATIONARY_PRESSURE_CHANGE: f64 = 1.0;

/// Bin size used whenever a configured bin size is unusable \[dbar\].
pub const FALLBACK_BIN_SIZE: f64 = 1.0;
