// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Transducer geometry and the beam to instrument-frame transform.

Transducer `b` (1-4) points `angle` away from the instrument +Z axis, at an
azimuth of `(b - 1) * 90°` counter-clockwise from +X. The along-beam velocity
it measures is the projection of the instrument-frame velocity onto its unit
vector, so for the active transducers `beams = B xyz`, where the rows of `B`
are those unit vectors. Three active transducers give a square `B` that is
inverted directly; four give the least-squares (pseudo-) inverse.
 */

use ndarray::prelude::*;

use super::CurrentMeterError;
use crate::profile::Instrument;

/// Which transducers contributed to a profile's beam velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamMapping {
    /// AD2CP, transducers 1, 2 and 4.
    Beams124,
    /// AD2CP, transducers 2, 3 and 4.
    Beams234,
    /// ACM, all four acoustic paths.
    AllFour,
}

impl BeamMapping {
    /// Interpret the beam-mapping vector an importer attached to a profile.
    /// Zero entries are inactive slots. An empty vector is accepted for the
    /// ACM, which always uses every path.
    pub fn from_profile(
        instrument: Instrument,
        profile_number: u32,
        mapping: &[u8],
    ) -> Result<BeamMapping, CurrentMeterError> {
        let mut active: Vec<u8> = mapping.iter().copied().filter(|&b| b != 0).collect();
        active.sort_unstable();
        match (instrument, active.as_slice()) {
            (Instrument::Ad2cp, [1, 2, 4]) => Ok(BeamMapping::Beams124),
            (Instrument::Ad2cp, [2, 3, 4]) => Ok(BeamMapping::Beams234),
            (Instrument::Acm, [] | [1, 2, 3, 4]) => Ok(BeamMapping::AllFour),
            _ => Err(CurrentMeterError::UnknownBeamMapping {
                profile: profile_number,
                instrument,
                mapping: mapping.to_vec(),
            }),
        }
    }

    /// The 1-based transducer numbers in use.
    pub fn transducers(self) -> &'static [u8] {
        match self {
            BeamMapping::Beams124 => &[1, 2, 4],
            BeamMapping::Beams234 => &[2, 3, 4],
            BeamMapping::AllFour => &[1, 2, 3, 4],
        }
    }

    /// 0-based column indices into a 4-column beam-velocity block.
    pub fn columns(self) -> Vec<usize> {
        self.transducers()
            .iter()
            .map(|&b| usize::from(b) - 1)
            .collect()
    }
}

/// The unit vector of transducer `b` (1-based).
fn beam_unit_vector(b: u8, angle_rad: f64) -> [f64; 3] {
    let azimuth = f64::from(b - 1) * std::f64::consts::FRAC_PI_2;
    let (s_angle, c_angle) = angle_rad.sin_cos();
    let (s_az, c_az) = azimuth.sin_cos();
    [s_angle * c_az, s_angle * s_az, c_angle]
}

fn invert3(m: &Array2<f64>) -> Option<Array2<f64>> {
    let det = m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)]);
    if !det.is_normal() {
        return None;
    }
    // Cofactor of element (r, c), transposed into place.
    let inv = Array2::from_shape_fn((3, 3), |(r, c)| {
        let (r1, r2) = ((c + 1) % 3, (c + 2) % 3);
        let (c1, c2) = ((r + 1) % 3, (r + 2) % 3);
        (m[(r1, c1)] * m[(r2, c2)] - m[(r1, c2)] * m[(r2, c1)]) / det
    });
    Some(inv)
}

/// A constant matrix taking the active along-beam velocities to instrument
/// XYZ velocities.
#[derive(Debug, Clone)]
pub struct BeamGeometry {
    mapping: BeamMapping,
    /// `(3, num_active)`
    beam_to_xyz: Array2<f64>,
    /// `(num_active, 3)`
    xyz_to_beam: Array2<f64>,
}

impl BeamGeometry {
    pub fn new(mapping: BeamMapping, angle_deg: f64) -> Result<BeamGeometry, CurrentMeterError> {
        let angle_rad = angle_deg.to_radians();
        let transducers = mapping.transducers();
        let b = Array2::from_shape_fn((transducers.len(), 3), |(i, j)| {
            beam_unit_vector(transducers[i], angle_rad)[j]
        });
        let singular = CurrentMeterError::SingularGeometry { angle_deg };
        let beam_to_xyz = if transducers.len() == 3 {
            invert3(&b).ok_or(singular)?
        } else {
            // (B^T B)^-1 B^T
            let btb = b.t().dot(&b);
            invert3(&btb).ok_or(singular)?.dot(&b.t())
        };
        Ok(BeamGeometry {
            mapping,
            beam_to_xyz,
            xyz_to_beam: b,
        })
    }

    pub fn mapping(&self) -> BeamMapping {
        self.mapping
    }

    /// Transform a `(samples, 4)` block of beam velocities into a
    /// `(samples, 3)` block of XYZ velocities, using only the active columns.
    pub fn beam_to_xyz(&self, beams: ArrayView2<f64>) -> Array2<f64> {
        let active = beams.select(Axis(1), &self.mapping.columns());
        active.dot(&self.beam_to_xyz.t())
    }

    /// The along-beam velocities XYZ velocities would produce, as a
    /// `(samples, 4)` block with NaN in inactive columns.
    pub fn xyz_to_beam(&self, xyz: ArrayView2<f64>) -> Array2<f64> {
        let active = xyz.dot(&self.xyz_to_beam.t());
        let mut out = Array2::from_elem((xyz.nrows(), 4), f64::NAN);
        for (i, &c) in self.mapping.columns().iter().enumerate() {
            out.column_mut(c).assign(&active.column(i));
        }
        out
    }
}
