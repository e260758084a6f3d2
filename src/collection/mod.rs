// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A deployment's worth of profiles from one instrument.
//!
//! Profile `n` always lives in slot `n - 1`; profiles that weren't imported or
//! weren't selected for processing stay in their slot with empty channels and
//! a status explaining why. This keeps every collection of a deployment the
//! same length and makes aggregation total.

mod aggregate;

pub use aggregate::{
    concatenate_columns_with_labels, concatenate_with_labels, pad_and_stack,
    pad_and_stack_columns, AggregatedChannels, LabelledRows,
};

use std::ops::RangeInclusive;

use log::{debug, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::profile::{Channel, Instrument, Profile, VoidState};

/// Status given to profiles outside the user's processing range.
pub const NOT_SELECTED: &str = "not selected for processing";

/// Status given to slots no profile was imported into.
pub const NO_DATA: &str = "no data";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCollection {
    pub instrument: Instrument,
    pub deployment_id: String,
    profiles: Vec<Profile>,
}

impl ProfileCollection {
    /// `num_profiles` empty profiles numbered from 1.
    pub fn new(instrument: Instrument, deployment_id: &str, num_profiles: u32) -> ProfileCollection {
        let profiles = (1..=num_profiles)
            .map(|n| {
                let mut p = Profile::new(instrument, n, deployment_id);
                p.log_status(NO_DATA);
                p
            })
            .collect();
        ProfileCollection {
            instrument,
            deployment_id: deployment_id.to_string(),
            profiles,
        }
    }

    /// Build a collection from imported profiles, which may arrive in any
    /// order and with gaps. Gaps become empty "no data" profiles. Profiles
    /// numbered 0, from another instrument, or duplicating an earlier number
    /// are dropped with a warning.
    pub fn from_profiles(
        instrument: Instrument,
        deployment_id: &str,
        profiles: Vec<Profile>,
    ) -> ProfileCollection {
        let num_profiles = profiles
            .iter()
            .map(|p| p.profile_number)
            .max()
            .unwrap_or(0);
        let mut collection = ProfileCollection::new(instrument, deployment_id, num_profiles);
        let mut filled = vec![false; num_profiles as usize];
        for p in profiles {
            if p.profile_number == 0 {
                warn!("Dropping a {} profile numbered 0", p.instrument);
                continue;
            }
            if p.instrument != instrument {
                warn!(
                    "Dropping profile {}: it is from the {} but the collection is for the {}",
                    p.profile_number, p.instrument, instrument
                );
                continue;
            }
            let slot = p.profile_number as usize - 1;
            if filled[slot] {
                warn!("Dropping a duplicate of profile {}", p.profile_number);
                continue;
            }
            filled[slot] = true;
            collection.profiles[slot] = p;
        }
        collection
    }

    /// Append empty "no data" profiles until there are `num_profiles`. A
    /// collection is never shortened.
    pub fn extend_to(&mut self, num_profiles: u32) {
        let first = self.profiles.len() as u32 + 1;
        for n in first..=num_profiles {
            let mut p = Profile::new(self.instrument, n, &self.deployment_id);
            p.log_status(NO_DATA);
            self.profiles.push(p);
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, profile_number: u32) -> Option<&Profile> {
        profile_number
            .checked_sub(1)
            .and_then(|i| self.profiles.get(i as usize))
    }

    pub fn get_mut(&mut self, profile_number: u32) -> Option<&mut Profile> {
        profile_number
            .checked_sub(1)
            .and_then(move |i| self.profiles.get_mut(i as usize))
    }

    pub fn iter(&self) -> std::slice::Iter<Profile> {
        self.profiles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<Profile> {
        self.profiles.iter_mut()
    }

    pub fn par_iter_mut(&mut self) -> rayon::slice::IterMut<Profile> {
        self.profiles.par_iter_mut()
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Void every profile outside `range`. They keep their slots.
    pub fn select_range(&mut self, range: &RangeInclusive<u32>) {
        let mut num_excluded = 0;
        for p in self
            .profiles
            .iter_mut()
            .filter(|p| !range.contains(&p.profile_number))
        {
            if !p.data_status.iter().any(|s| s == NOT_SELECTED) {
                p.void(NOT_SELECTED);
                num_excluded += 1;
            }
        }
        debug!(
            "{}: {num_excluded} profiles outside {}..={} were excluded",
            self.instrument,
            range.start(),
            range.end()
        );
    }

    /// The numbers of the profiles that still hold data.
    pub fn numbers_with_data(&self) -> Vec<u32> {
        self.profiles
            .iter()
            .filter(|p| !p.is_empty() && p.void_state != VoidState::Voided)
            .map(|p| p.profile_number)
            .collect()
    }

    /// One channel of every profile as a NaN-padded
    /// `[max_samples, num_profiles, components]` array.
    pub fn padded(&self, channel: Channel) -> Array3<f64> {
        let blocks: Vec<ArrayView2<f64>> =
            self.profiles.iter().map(|p| p.channel(channel)).collect();
        let mut out = pad_and_stack(&blocks);
        if out.len_of(Axis(2)) == 0 {
            // Every profile was empty with an unusual width; keep the schema
            // width so the shape stays predictable.
            out = Array3::from_elem((out.len_of(Axis(0)), self.len(), channel.width()), f64::NAN);
        }
        out
    }

    /// The first column of one channel of every profile as a NaN-padded
    /// `[max_samples, num_profiles]` array.
    pub fn padded_column(&self, channel: Channel) -> Array2<f64> {
        let columns: Vec<ArrayView1<f64>> =
            self.profiles.iter().map(|p| p.column(channel)).collect();
        pad_and_stack_columns(&columns)
    }

    /// One channel of every profile concatenated, plus the profile number of
    /// every row.
    pub fn flattened(&self, channel: Channel) -> (Array2<f64>, Array1<u32>) {
        let blocks: Vec<(u32, ArrayView2<f64>)> = self
            .profiles
            .iter()
            .map(|p| (p.profile_number, p.channel(channel)))
            .collect();
        concatenate_with_labels(&blocks)
    }

    /// The first column of one channel of every profile concatenated, plus
    /// the profile number of every sample.
    pub fn flattened_column(&self, channel: Channel) -> (Array1<f64>, Array1<u32>) {
        let columns: Vec<(u32, ArrayView1<f64>)> = self
            .profiles
            .iter()
            .map(|p| (p.profile_number, p.column(channel)))
            .collect();
        concatenate_columns_with_labels(&columns)
    }

    /// The padded and flat layouts of the given channels.
    pub fn aggregate(&self, channels: &[Channel]) -> AggregatedChannels {
        let padded = channels.iter().map(|&c| (c, self.padded(c))).collect();
        let flat = channels
            .iter()
            .map(|&c| {
                let (values, profile_numbers) = self.flattened(c);
                (
                    c,
                    LabelledRows {
                        values,
                        profile_numbers,
                    },
                )
            })
            .collect();
        AggregatedChannels {
            instrument: self.instrument,
            profile_numbers: self.profiles.iter().map(|p| p.profile_number).collect(),
            padded,
            flat,
        }
    }
}
