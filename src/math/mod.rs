// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics on plain sample sequences.
//!
//! Everything here works on slices of `f64` where NaN means "missing".


use std::collections::HashMap;

/// The direction a sequence predominantly travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Ascending,
    Descending,
}

/// Index of the (first) smallest and largest finite values. `None` if there
/// are no finite values.
pub fn nan_argmin_argmax(x: &[f64]) -> Option<(usize, usize)> {
    let mut out: Option<(usize, usize)> = None;
    for (i, &v) in x.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        match out.as_mut() {
            None => out = Some((i, i)),
            Some((i_min, i_max)) => {
                if v < x[*i_min] {
                    *i_min = i;
                }
                if v > x[*i_max] {
                    *i_max = i;
                }
            }
        }
    }
    out
}

/// The minimum and maximum finite values of `x`.
pub fn nan_min_max(x: &[f64]) -> Option<(f64, f64)> {
    nan_argmin_argmax(x).map(|(i_min, i_max)| (x[i_min], x[i_max]))
}

/// A sequence ascends if its global maximum occurs after its global minimum.
pub fn predominant_trend(x: &[f64]) -> Trend {
    match nan_argmin_argmax(x) {
        Some((i_min, i_max)) if i_max > i_min => Trend::Ascending,
        _ => Trend::Descending,
    }
}

/// Select the longest contiguous run of `x` that is strictly monotonic in the
/// sequence's predominant direction (see [`predominant_trend`]).
///
/// The sequence is bracketed by values that break any run in that direction
/// so that runs starting at the first element or ending at the last need no
/// special handling. If either end of the longest run touches a plateau (two
/// equal consecutive values), the point next to the plateau is dropped from
/// the run. When there are several runs of the same length the first wins. A
/// sequence with no step in the predominant direction yields an all-false
/// mask.
pub fn longest_monotonic_run(x: &[f64]) -> Vec<bool> {
    let n = x.len();
    let mut mask = vec![false; n];
    if n < 2 {
        return mask;
    }

    let trend = predominant_trend(x);
    let (head, tail) = match trend {
        Trend::Ascending => (f64::INFINITY, f64::NEG_INFINITY),
        Trend::Descending => (f64::NEG_INFINITY, f64::INFINITY),
    };
    let padded: Vec<f64> = std::iter::once(head)
        .chain(x.iter().copied())
        .chain(std::iter::once(tail))
        .collect();
    let steps_with_trend = padded.windows(2).map(|w| match trend {
        Trend::Ascending => w[1] > w[0],
        Trend::Descending => w[1] < w[0],
    });

    // Step `s` joins padded points `s` and `s + 1`.
    let mut best: Option<(usize, usize)> = None;
    let mut current_start = None;
    for (s, good) in steps_with_trend.chain(std::iter::once(false)).enumerate() {
        match (good, current_start) {
            (true, None) => current_start = Some(s),
            (false, Some(start)) => {
                let len = s - start;
                if best.map(|(_, l)| len > l).unwrap_or(true) {
                    best = Some((start, len));
                }
                current_start = None;
            }
            _ => (),
        }
    }

    let Some((first_step, num_steps)) = best else {
        return mask;
    };
    // Padded point `p` is original index `p - 1`. The bracketing values mean
    // no run can use step 0, so `first_step >= 1`.
    let mut first = first_step - 1;
    let mut last = first_step + num_steps - 1;
    if first > 0 && x[first - 1] == x[first] {
        first += 1;
    }
    if last + 1 < n && x[last + 1] == x[last] {
        last = last.saturating_sub(1);
    }
    if first <= last {
        mask[first..=last].iter_mut().for_each(|m| *m = true);
    }
    mask
}

/// A hashable stand-in for a float, for exact-equality lookups.
pub(crate) fn value_key(v: f64) -> u64 {
    // Treat 0.0 and -0.0 as the same value.
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Keep only the values of `x` that occur exactly once, in their original
/// order, along with a mask over `x` selecting them. Values occurring two or
/// more times are removed entirely. NaNs are never kept.
pub fn discard_degeneracy(x: &[f64]) -> (Vec<f64>, Vec<bool>) {
    let mut counts: HashMap<u64, usize> = HashMap::with_capacity(x.len());
    for &v in x.iter().filter(|v| !v.is_nan()) {
        *counts.entry(value_key(v)).or_default() += 1;
    }
    let mask: Vec<bool> = x
        .iter()
        .map(|&v| !v.is_nan() && counts[&value_key(v)] == 1)
        .collect();
    let values = x
        .iter()
        .zip(mask.iter())
        .filter(|(_, &m)| m)
        .map(|(&v, _)| v)
        .collect();
    (values, mask)
}

/// Linear interpolation of `(x, y)` onto `xi`, extrapolating linearly beyond
/// the ends of `x`. `x` must be strictly increasing and hold at least two
/// values; otherwise `None` is returned. NaN queries give NaN.
pub fn interp_linear_extrap(x: &[f64], y: &[f64], xi: &[f64]) -> Option<Vec<f64>> {
    if x.len() < 2 || x.len() != y.len() || x.windows(2).any(|w| !(w[1] > w[0])) {
        return None;
    }
    let last_segment = x.len() - 2;
    Some(
        xi.iter()
            .map(|&q| {
                if q.is_nan() {
                    return f64::NAN;
                }
                let i = x.partition_point(|&v| v <= q).saturating_sub(1).min(last_segment);
                let slope = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
                y[i] + slope * (q - x[i])
            })
            .collect(),
    )
}

/// Nearest-neighbour lookup of `(x, y)` at `xi`. Queries outside
/// `[x[0], x[last]]` (or NaN) get `fill`. `x` must be strictly increasing.
pub fn interp_nearest<T: Copy>(x: &[f64], y: &[T], xi: &[f64], fill: T) -> Vec<T> {
    if x.is_empty() || x.len() != y.len() {
        return vec![fill; xi.len()];
    }
    let (lo, hi) = (x[0], x[x.len() - 1]);
    xi.iter()
        .map(|&q| {
            if !(q >= lo && q <= hi) {
                return fill;
            }
            let i = x.partition_point(|&v| v < q);
            if i == 0 {
                y[0]
            } else if i == x.len() {
                y[x.len() - 1]
            } else if q - x[i - 1] <= x[i] - q {
                y[i - 1]
            } else {
                y[i]
            }
        })
        .collect()
}

/// The numerical derivative of evenly spaced samples. Interior points use the
/// average of the forward and backward first differences, the end points use
/// one-sided differences. A single sample has no derivative (NaN).
pub fn gradient(y: &[f64], spacing: f64) -> Vec<f64> {
    match y.len() {
        0 => vec![],
        1 => vec![f64::NAN],
        n => (0..n)
            .map(|i| {
                let d = if i == 0 {
                    y[1] - y[0]
                } else if i == n - 1 {
                    y[n - 1] - y[n - 2]
                } else {
                    (y[i + 1] - y[i - 1]) / 2.0
                };
                d / spacing
            })
            .collect(),
    }
}

/// Remove jumps of more than 180° between consecutive headings so that the
/// sequence is continuous. NaNs stay NaN and don't break the unwrapping.
pub fn unwrap_degrees(h: &[f64]) -> Vec<f64> {
    let mut offset = 0.0;
    let mut previous: Option<f64> = None;
    h.iter()
        .map(|&v| {
            if v.is_nan() {
                return v;
            }
            if let Some(p) = previous {
                let d = v - p;
                if d.abs() > 180.0 {
                    offset -= 360.0 * (d / 360.0).round();
                }
            }
            previous = Some(v);
            v + offset
        })
        .collect()
}

/// Wrap headings into [0, 360).
pub fn wrap_degrees(h: &[f64]) -> Vec<f64> {
    h.iter()
        .map(|&v| {
            let w = v.rem_euclid(360.0);
            // rem_euclid can round up to exactly 360 for tiny negative input.
            if w >= 360.0 {
                0.0
            } else {
                w
            }
        })
        .collect()
}
