// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Assembling ragged per-profile arrays into single arrays.
//!
//! Empty inputs (voided or unselected profiles) contribute zero rows; they
//! never need special handling by the caller.

use std::collections::BTreeMap;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::profile::{Channel, Instrument};

/// The channels of one instrument's collection in both aggregate layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedChannels {
    pub instrument: Instrument,
    /// Profile number of every column of the padded arrays.
    pub profile_numbers: Vec<u32>,
    /// `[max_samples, profiles, channel width]`
    pub padded: BTreeMap<Channel, Array3<f64>>,
    pub flat: BTreeMap<Channel, LabelledRows>,
}

/// Every profile's samples of one channel, one profile after another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelledRows {
    /// `[samples, channel width]`
    pub values: Array2<f64>,
    /// The profile number of every row.
    pub profile_numbers: Array1<u32>,
}

impl AggregatedChannels {
    pub fn padded(&self, channel: Channel) -> Option<ArrayView3<f64>> {
        self.padded.get(&channel).map(|a| a.view())
    }

    pub fn flat(&self, channel: Channel) -> Option<&LabelledRows> {
        self.flat.get(&channel)
    }
}

/// Stack per-profile blocks (samples x components) side by side into one
/// array of shape `[max_samples, num_profiles, components]`, padding short
/// profiles with NaN. The component count is the widest input; a zero-row
/// block of any width is just padding.
pub fn pad_and_stack(blocks: &[ArrayView2<f64>]) -> Array3<f64> {
    let max_len = blocks.iter().map(|b| b.nrows()).max().unwrap_or(0);
    let width = blocks.iter().map(|b| b.ncols()).max().unwrap_or(0);
    let mut out = Array3::from_elem((max_len, blocks.len(), width), f64::NAN);
    for (i_profile, block) in blocks.iter().enumerate() {
        if block.nrows() == 0 {
            continue;
        }
        out.slice_mut(s![..block.nrows(), i_profile, ..block.ncols()])
            .assign(block);
    }
    out
}

/// [`pad_and_stack`] for single-column data: `[max_samples, num_profiles]`.
pub fn pad_and_stack_columns(columns: &[ArrayView1<f64>]) -> Array2<f64> {
    let max_len = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    let mut out = Array2::from_elem((max_len, columns.len()), f64::NAN);
    for (i_profile, column) in columns.iter().enumerate() {
        out.slice_mut(s![..column.len(), i_profile]).assign(column);
    }
    out
}

/// Concatenate per-profile blocks vertically, returning the concatenation and
/// a parallel vector holding the profile number of every row.
pub fn concatenate_with_labels(blocks: &[(u32, ArrayView2<f64>)]) -> (Array2<f64>, Array1<u32>) {
    let total: usize = blocks.iter().map(|(_, b)| b.nrows()).sum();
    let width = blocks.iter().map(|(_, b)| b.ncols()).max().unwrap_or(0);
    let mut out = Array2::from_elem((total, width), f64::NAN);
    let mut labels = Array1::zeros(total);
    let mut row = 0;
    for (number, block) in blocks {
        let n = block.nrows();
        if n == 0 {
            continue;
        }
        out.slice_mut(s![row..row + n, ..block.ncols()]).assign(block);
        labels.slice_mut(s![row..row + n]).fill(*number);
        row += n;
    }
    (out, labels)
}

/// [`concatenate_with_labels`] for single-column data.
pub fn concatenate_columns_with_labels(
    columns: &[(u32, ArrayView1<f64>)],
) -> (Array1<f64>, Array1<u32>) {
    let total: usize = columns.iter().map(|(_, c)| c.len()).sum();
    let mut values = Vec::with_capacity(total);
    let mut labels = Vec::with_capacity(total);
    for (number, column) in columns {
        values.extend(column.iter().copied());
        labels.extend(std::iter::repeat(*number).take(column.len()));
    }
    (Array1::from(values), Array1::from(labels))
}
