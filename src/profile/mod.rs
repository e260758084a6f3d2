// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-profile record and the fixed channel schema.
//!
//! Every [`Profile`] holds *every* [`Channel`], whether or not it is used by
//! the profile's instrument. Which channels take part in a processing stage
//! is given by [`ProcessingStage::active_channels`]; only active channels are
//! required to share a row count. Channels are always 2-D (samples x
//! components) so that scalar and vector channels flow through the same
//! code; a scalar channel has a single column.

mod channel;

pub use channel::{Channel, Instrument, ProcessingStage};

use std::collections::BTreeMap;

use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumString};

use crate::{constants::STATIONARY_PRESSURE_CHANGE, math::nan_min_max};

/// Which way the profiler moved through the water column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileDirection {
    /// Pressure decreasing.
    Ascending,
    /// Pressure increasing.
    Descending,
    Stationary,
    #[default]
    Unknown,
}

/// Where a profile is in the short-profile voiding state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidState {
    #[default]
    Unexamined,
    Retained,
    Voided,
}

/// One ascent or descent of the profiler as seen by one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Positive; 0 is reserved for "not processed".
    pub profile_number: u32,

    #[serde(default)]
    pub deployment_id: String,

    pub instrument: Instrument,

    #[serde(default)]
    pub stage: ProcessingStage,

    #[serde(default)]
    pub direction: ProfileDirection,

    /// Samples per second. NaN if unknown.
    #[serde(default = "nan", deserialize_with = "null_as_nan")]
    pub acquisition_rate_hz: f64,

    /// Human-readable annotations, in the order they were made.
    #[serde(default)]
    pub data_status: Vec<String>,

    /// Names of the processing steps applied, in order.
    #[serde(default)]
    pub code_history: Vec<String>,

    /// Which transducers were active (current meters only), e.g. `[1, 2, 4]`.
    #[serde(default)]
    pub beam_mapping: Vec<u8>,

    /// One flag per sample; true means usable.
    #[serde(default)]
    pub mask: Vec<bool>,

    #[serde(default)]
    pub void_state: VoidState,

    #[serde(default, deserialize_with = "channels_with_nulls")]
    channels: BTreeMap<Channel, Array2<f64>>,
}

fn nan() -> f64 {
    f64::NAN
}

// JSON has no NaN; serde_json writes it as null.
fn null_as_nan<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let num: Option<f64> = Deserialize::deserialize(d)?;
    Ok(num.unwrap_or(f64::NAN))
}

fn channels_with_nulls<'de, D>(d: D) -> Result<BTreeMap<Channel, Array2<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let channels: BTreeMap<Channel, Array2<Option<f64>>> = Deserialize::deserialize(d)?;
    Ok(channels
        .into_iter()
        .map(|(c, a)| (c, a.mapv(|v| v.unwrap_or(f64::NAN))))
        .collect())
}

impl Profile {
    /// A profile with no samples in any channel.
    pub fn new(instrument: Instrument, profile_number: u32, deployment_id: &str) -> Profile {
        Profile {
            profile_number,
            deployment_id: deployment_id.to_string(),
            instrument,
            stage: ProcessingStage::Raw,
            direction: ProfileDirection::Unknown,
            acquisition_rate_hz: f64::NAN,
            data_status: vec![],
            code_history: vec![],
            beam_mapping: vec![],
            mask: vec![],
            void_state: VoidState::Unexamined,
            channels: Channel::iter().map(|c| (c, c.empty())).collect(),
        }
    }

    /// Builder-style [`Profile::set_channel`].
    pub fn with_channel(mut self, channel: Channel, data: Array2<f64>) -> Profile {
        self.set_channel(channel, data);
        self
    }

    /// Builder-style [`Profile::set_column`].
    pub fn with_column(mut self, channel: Channel, data: Array1<f64>) -> Profile {
        self.set_column(channel, data);
        self
    }

    pub fn channel(&self, channel: Channel) -> ArrayView2<f64> {
        match self.channels.get(&channel) {
            Some(a) => a.view(),
            // Deserialised profiles may not list every channel.
            None => ArrayView2::from_shape((0, channel.width()), &[])
                .unwrap_or_else(|_| ArrayView2::from(&[] as &[[f64; 0]])),
        }
    }

    /// The first column of a channel. Scalar channels only have this column.
    pub fn column(&self, channel: Channel) -> ArrayView1<f64> {
        let a = self.channel(channel);
        if a.ncols() == 0 {
            ArrayView1::from(&[])
        } else {
            a.index_axis_move(Axis(1), 0)
        }
    }

    /// The first column of a channel as a contiguous vector.
    pub fn column_vec(&self, channel: Channel) -> Vec<f64> {
        self.column(channel).to_vec()
    }

    pub fn channel_mut(&mut self, channel: Channel) -> ArrayViewMut2<f64> {
        self.channels
            .entry(channel)
            .or_insert_with(|| channel.empty())
            .view_mut()
    }

    pub fn set_channel(&mut self, channel: Channel, data: Array2<f64>) {
        self.channels.insert(channel, data);
    }

    pub fn set_column(&mut self, channel: Channel, data: Array1<f64>) {
        self.channels.insert(channel, data.insert_axis(Axis(1)));
    }

    /// Reset a channel to zero rows, keeping its column count.
    pub fn clear_channel(&mut self, channel: Channel) {
        self.channels.insert(channel, channel.empty());
    }

    pub fn active_channels(&self) -> &'static [Channel] {
        self.stage.active_channels(self.instrument)
    }

    /// The number of samples; the largest row count over the active channels.
    pub fn num_samples(&self) -> usize {
        self.active_channels()
            .iter()
            .map(|&c| self.channel(c).nrows())
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Active channels whose row counts disagree with [`Profile::num_samples`],
    /// plus a mismatching mask.
    pub fn shape_mismatches(&self) -> Vec<String> {
        let n = self.num_samples();
        let mut out: Vec<String> = self
            .active_channels()
            .iter()
            .filter(|&&c| self.channel(c).nrows() != n)
            .map(|c| format!("{c} has {} rows, expected {n}", self.channel(*c).nrows()))
            .collect();
        if self.mask.len() != n {
            out.push(format!("mask has {} entries, expected {n}", self.mask.len()));
        }
        out
    }

    /// Mark every sample as usable.
    pub fn reset_mask(&mut self) {
        self.mask = vec![true; self.num_samples()];
    }

    /// AND another mask into this profile's mask.
    pub fn narrow_mask(&mut self, other: &[bool]) {
        debug_assert_eq!(self.mask.len(), other.len());
        self.mask
            .iter_mut()
            .zip(other)
            .for_each(|(m, &o)| *m = *m && o);
    }

    pub fn num_masked_samples(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Append a human-readable annotation.
    pub fn log_status<S: Into<String>>(&mut self, status: S) {
        let status = status.into();
        debug!("Profile {} ({}): {status}", self.profile_number, self.instrument);
        self.data_status.push(status);
    }

    /// Record that a processing step ran on this profile.
    pub fn log_step(&mut self, step: &str) {
        self.code_history.push(step.to_string());
    }

    /// Set the direction from the net change of the pressure record.
    pub fn infer_direction(&mut self) {
        let p = self.column(Channel::Pressure);
        let first = p.iter().find(|v| v.is_finite());
        let last = p.iter().rev().find(|v| v.is_finite());
        self.direction = match (first, last) {
            (Some(first), Some(last)) => {
                let change = last - first;
                if change > STATIONARY_PRESSURE_CHANGE {
                    ProfileDirection::Descending
                } else if change < -STATIONARY_PRESSURE_CHANGE {
                    ProfileDirection::Ascending
                } else {
                    ProfileDirection::Stationary
                }
            }
            _ => ProfileDirection::Unknown,
        };
    }

    /// Reset every active channel (and the mask) to zero rows and mark the
    /// profile as voided.
    pub fn void<S: Into<String>>(&mut self, reason: S) {
        for &c in self.active_channels() {
            self.clear_channel(c);
        }
        self.mask.clear();
        self.void_state = VoidState::Voided;
        self.log_status(reason);
    }

    pub fn is_voided(&self) -> bool {
        self.void_state == VoidState::Voided
    }

    /// Move to a new processing stage. Channels that are active in the old
    /// stage but not in the new one are emptied.
    pub fn advance_stage(&mut self, stage: ProcessingStage) {
        let retired: Vec<Channel> = self
            .active_channels()
            .iter()
            .copied()
            .filter(|c| !stage.active_channels(self.instrument).contains(c))
            .collect();
        for c in retired {
            self.clear_channel(c);
        }
        self.stage = stage;
    }

    /// The minimum and maximum of the masked, finite values of a channel's
    /// first column.
    pub fn masked_range(&self, channel: Channel) -> Option<(f64, f64)> {
        let masked = self.masked_column(channel);
        nan_min_max(&masked)
    }

    /// The first column of a channel, keeping only masked samples.
    pub fn masked_column(&self, channel: Channel) -> Vec<f64> {
        self.column(channel)
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, &m)| m)
            .map(|(&v, _)| v)
            .collect()
    }
}
