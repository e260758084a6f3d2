// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Reducing profiles onto a common pressure grid.

Bin `k` is centred on `min + k * size` and holds the mean of the usable
samples with pressure in `[centre - size/2, centre + size/2)`. Samples that
fall outside every bin are collected in a sentinel bin past the last one,
which is thrown away. A bin without samples is NaN.
 */


use std::collections::BTreeMap;

use log::{debug, trace};
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    collection::ProfileCollection,
    constants::FALLBACK_BIN_SIZE,
    params::BinningArgs,
    profile::{Channel, Instrument, Profile},
};

/// A pressure grid. `max - min` is always a whole number of `size`s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinningParams {
    pub min: f64,
    pub size: f64,
    pub max: f64,
}

impl BinningParams {
    /// Complete a user-given grid. A size that isn't positive and finite
    /// becomes 1. A missing min (max) is the data's min (max) rounded down
    /// (up) to a multiple of the size. `max` is then raised to the next whole
    /// number of sizes above `min`.
    pub fn derive(args: &BinningArgs, data_range: Option<(f64, f64)>) -> BinningParams {
        let size = match args.size {
            Some(s) if s.is_finite() && s > 0.0 => s,
            Some(s) => {
                debug!("Bin size {s} is unusable; using {FALLBACK_BIN_SIZE}");
                FALLBACK_BIN_SIZE
            }
            None => FALLBACK_BIN_SIZE,
        };
        let min = args
            .min
            .filter(|m| m.is_finite())
            .or_else(|| data_range.map(|(lo, _)| (lo / size).floor() * size))
            .unwrap_or(0.0);
        let max = args
            .max
            .filter(|m| m.is_finite())
            .or_else(|| data_range.map(|(_, hi)| (hi / size).ceil() * size))
            .unwrap_or(min)
            .max(min);

        // Tolerate rounding in a user-given max that is meant to be exact.
        let steps = ((max - min) / size - 1e-9).ceil().max(0.0);
        BinningParams {
            min,
            size,
            max: min + steps * size,
        }
    }

    /// [`BinningParams::derive`] with the data range taken from the usable
    /// pressures of a whole collection.
    pub fn derive_for_collection(
        args: &BinningArgs,
        collection: &ProfileCollection,
    ) -> BinningParams {
        let range = collection
            .iter()
            .filter_map(|p| p.masked_range(Channel::Pressure))
            .reduce(|(lo1, hi1), (lo2, hi2)| (lo1.min(lo2), hi1.max(hi2)));
        BinningParams::derive(args, range)
    }

    pub fn num_bins(&self) -> usize {
        ((self.max - self.min) / self.size).round() as usize + 1
    }

    pub fn centres(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.num_bins(), |k| self.min + k as f64 * self.size)
    }

    /// The bin a pressure falls in, or `num_bins()` (the sentinel) if none.
    pub fn bin_index(&self, pressure: f64) -> usize {
        let nbins = self.num_bins();
        let k = ((pressure - self.min) / self.size + 0.5).floor();
        if k >= 0.0 && k < nbins as f64 {
            k as usize
        } else {
            nbins
        }
    }
}

/// Reduce the usable samples of one profile onto the grid. Every requested
/// channel comes back with shape `[bins, channel width]`; channels whose row
/// count doesn't match the pressure are all NaN, as is everything from an
/// empty profile or one whose timestamps are all missing.
pub fn bin_profile(
    profile: &Profile,
    channels: &[Channel],
    params: &BinningParams,
) -> BTreeMap<Channel, Array2<f64>> {
    let nbins = params.num_bins();
    let pressure = profile.column(Channel::Pressure);
    let n = pressure.len();

    let time = profile.column(Channel::Time);
    let untimed = n > 0 && time.len() == n && time.iter().all(|t| t.is_nan());
    let bins: Vec<usize> = if untimed {
        vec![nbins; n]
    } else {
        let use_mask = profile.mask.len() == n;
        pressure
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                if use_mask && !profile.mask[i] {
                    nbins
                } else {
                    params.bin_index(p)
                }
            })
            .collect()
    };

    channels
        .iter()
        .map(|&c| {
            let data = profile.channel(c);
            let width = c.width();
            let mut sums = Array2::<f64>::zeros((nbins + 1, width));
            let mut counts = Array2::<u32>::zeros((nbins + 1, width));
            if data.nrows() == n && data.ncols() == width {
                for (row, &k) in data.outer_iter().zip(&bins) {
                    for (j, &v) in row.iter().enumerate() {
                        if !v.is_nan() {
                            sums[(k, j)] += v;
                            counts[(k, j)] += 1;
                        }
                    }
                }
            } else if n > 0 {
                trace!(
                    "Profile {}: {c} has {} rows, pressure has {n}; not binned",
                    profile.profile_number,
                    data.nrows()
                );
            }
            let means = Array2::from_shape_fn((nbins, width), |(k, j)| match counts[(k, j)] {
                0 => f64::NAN,
                count => sums[(k, j)] / f64::from(count),
            });
            (c, means)
        })
        .collect()
}

/// The binned product of one instrument's collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinnedGrid {
    pub instrument: Instrument,
    pub params: BinningParams,
    /// `[bins]`
    pub centres: Array1<f64>,
    pub profile_numbers: Vec<u32>,
    /// `[bins, profiles, channel width]`
    pub channels: BTreeMap<Channel, Array3<f64>>,
}

impl BinnedGrid {
    pub fn channel(&self, channel: Channel) -> Option<ArrayView3<f64>> {
        self.channels.get(&channel).map(|a| a.view())
    }

    /// The first component of a channel as `[bins, profiles]`.
    pub fn channel_2d(&self, channel: Channel) -> Option<ArrayView2<f64>> {
        self.channels
            .get(&channel)
            .map(|a| a.index_axis(Axis(2), 0))
    }
}

/// Bin every profile of a collection. Voided and empty profiles contribute
/// all-NaN columns so that every profile keeps its place.
pub fn bin_collection(
    collection: &ProfileCollection,
    channels: &[Channel],
    params: &BinningParams,
) -> BinnedGrid {
    let nbins = params.num_bins();
    let per_profile: Vec<BTreeMap<Channel, Array2<f64>>> = collection
        .profiles()
        .par_iter()
        .map(|p| bin_profile(p, channels, params))
        .collect();

    let mut grids: BTreeMap<Channel, Array3<f64>> = channels
        .iter()
        .map(|&c| (c, Array3::from_elem((nbins, per_profile.len(), c.width()), f64::NAN)))
        .collect();
    for (i_profile, binned) in per_profile.iter().enumerate() {
        for (c, means) in binned {
            if let Some(grid) = grids.get_mut(c) {
                grid.slice_mut(s![.., i_profile, ..]).assign(means);
            }
        }
    }
    debug!(
        "Binned {} {} profiles onto {nbins} bins ({}..{} by {})",
        per_profile.len(),
        collection.instrument,
        params.min,
        params.max,
        params.size
    );

    BinnedGrid {
        instrument: collection.instrument,
        params: *params,
        centres: params.centres(),
        profile_numbers: collection.iter().map(|p| p.profile_number).collect(),
        channels: grids,
    }
}
