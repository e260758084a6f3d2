// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Instrument-frame and geographic-frame velocities.
//!
//! The instrument +X axis points along the compass heading (clockwise from
//! north), +Y is 90° counter-clockwise from +X and +Z is up. Pitch rotates
//! about Y, roll about X; a level instrument has both at zero.

use ndarray::prelude::*;

/// A velocity in the instrument frame \[m/s\].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A velocity in the geographic frame \[m/s\].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Enu {
    /// East
    pub e: f64,
    /// North
    pub n: f64,
    /// Up
    pub u: f64,
}

impl Xyz {
    pub fn from_row(row: ArrayView1<f64>) -> Xyz {
        Xyz {
            x: row[0],
            y: row[1],
            z: row[2],
        }
    }

    /// Remove the instrument's tilt, giving the velocity in a frame that
    /// shares the instrument's heading but is level.
    pub fn level(self, pitch_rad: f64, roll_rad: f64) -> Xyz {
        let (s_r, c_r) = roll_rad.sin_cos();
        let (s_p, c_p) = pitch_rad.sin_cos();
        let y = c_r * self.y - s_r * self.z;
        let z = s_r * self.y + c_r * self.z;
        Xyz {
            x: c_p * self.x + s_p * z,
            y,
            z: -s_p * self.x + c_p * z,
        }
    }

    /// Rotate a level velocity by the heading.
    pub fn to_enu(self, heading_rad: f64) -> Enu {
        let (s_h, c_h) = heading_rad.sin_cos();
        Enu {
            e: self.x * s_h - self.y * c_h,
            n: self.x * c_h + self.y * s_h,
            u: self.z,
        }
    }
}

impl Enu {
    /// The inverse of [`Xyz::to_enu`].
    pub fn to_xyz(self, heading_rad: f64) -> Xyz {
        let (s_h, c_h) = heading_rad.sin_cos();
        Xyz {
            x: self.e * s_h + self.n * c_h,
            y: -self.e * c_h + self.n * s_h,
            z: self.u,
        }
    }
}

/// Rotate a `(samples, 3)` block of XYZ velocities into ENU. `pitch_deg` and
/// `roll_deg` may be empty, meaning the instrument is treated as level.
pub(super) fn rotate_to_enu(
    xyz: ArrayView2<f64>,
    heading_deg: &[f64],
    pitch_deg: &[f64],
    roll_deg: &[f64],
) -> Array2<f64> {
    let mut enu = Array2::from_elem((xyz.nrows(), 3), f64::NAN);
    for (i, (row, mut out)) in xyz.outer_iter().zip(enu.outer_iter_mut()).enumerate() {
        let pitch = pitch_deg.get(i).copied().unwrap_or(0.0).to_radians();
        let roll = roll_deg.get(i).copied().unwrap_or(0.0).to_radians();
        let v = Xyz::from_row(row)
            .level(pitch, roll)
            .to_enu(heading_deg[i].to_radians());
        out[0] = v.e;
        out[1] = v.n;
        out[2] = v.u;
    }
    enu
}

/// Rows whose pitch or roll magnitude exceeds `limit_deg`. NaN attitudes are
/// not flagged.
pub(super) fn extreme_tilt_rows(pitch_deg: &[f64], roll_deg: &[f64], limit_deg: f64) -> Vec<bool> {
    let n = pitch_deg.len().max(roll_deg.len());
    (0..n)
        .map(|i| {
            let pitch = pitch_deg.get(i).copied().unwrap_or(0.0);
            let roll = roll_deg.get(i).copied().unwrap_or(0.0);
            pitch.abs() > limit_deg || roll.abs() > limit_deg
        })
        .collect()
}
