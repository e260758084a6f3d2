// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::ArrayView1;

use crate::{filter::sbefilter_1d, math::gradient, math::unwrap_degrees};

/// The heading and rotation-induced ("wag") velocity of a profiler.
pub(super) struct Wag {
    /// Unwrapped, smoothed heading \[degrees\].
    pub(super) heading_deg: Vec<f64>,
    /// `radius * dHeading/dt` \[m/s\].
    pub(super) velocity: Vec<f64>,
}

/// Unwrap and smooth the heading, then differentiate it. The wag velocity
/// is carried on the instrument Y axis.
pub(super) fn wag_velocity(heading_deg: &[f64], rate_hz: f64, gamma_s: f64, radius_m: f64) -> Wag {
    let unwrapped = unwrap_degrees(heading_deg);
    let smoothed = sbefilter_1d(ArrayView1::from(&unwrapped), rate_hz, gamma_s).to_vec();
    let radians: Vec<f64> = smoothed.iter().map(|h| h.to_radians()).collect();
    let velocity = gradient(&radians, 1.0 / rate_hz)
        .into_iter()
        .map(|d| radius_m * d)
        .collect();
    Wag {
        heading_deg: smoothed,
        velocity,
    }
}
