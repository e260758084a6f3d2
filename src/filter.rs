// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
A zero-phase low-pass filter.

This is the single-pole recursive filter used by Sea-Bird's processing
software, run forward and then backward over the forward result so that the
net phase lag is zero. For a time constant `gamma` \[s\] and a sample rate
`acqrate` \[Hz\]:

```text
A = 1 / (1 + 2 * gamma * acqrate)
B = (1 - 2 * gamma * acqrate) * A
y[i] = A * (x[i] + x[i-1]) - B * y[i-1]
```
 */

use ndarray::prelude::*;

struct Coefficients {
    a: f64,
    b: f64,
}

impl Coefficients {
    fn new(acqrate: f64, gamma: f64) -> Coefficients {
        let two_gamma_rate = 2.0 * gamma * acqrate;
        let a = 1.0 / (1.0 + two_gamma_rate);
        Coefficients {
            a,
            b: (1.0 - two_gamma_rate) * a,
        }
    }

    /// Run the recursion in place over `v`, forward then backward.
    fn filter_in_place(&self, v: &mut [f64]) {
        let Coefficients { a, b } = *self;
        let n = v.len();
        if n < 2 {
            return;
        }

        let mut previous_x = v[0];
        for i in 1..n {
            let x = v[i];
            v[i] = a * (x + previous_x) - b * v[i - 1];
            previous_x = x;
        }

        let mut previous_x = v[n - 1];
        for i in (0..n - 1).rev() {
            let x = v[i];
            v[i] = a * (x + previous_x) - b * v[i + 1];
            previous_x = x;
        }
    }
}

/// Filter a single channel. NaNs are stripped before filtering and put back
/// in their original positions afterwards. A `gamma` of 0 or an empty input
/// returns the input unchanged.
pub fn sbefilter_1d(x: ArrayView1<f64>, acqrate: f64, gamma: f64) -> Array1<f64> {
    let mut out = x.to_owned();
    if gamma == 0.0 || x.is_empty() {
        return out;
    }
    let coefficients = Coefficients::new(acqrate, gamma);
    filter_column(out.view_mut(), &coefficients);
    out
}

/// Filter every column of `x` independently. Each column only uses its own
/// finite samples, so columns may have different numbers of leading or
/// trailing NaNs; all-NaN columns pass through untouched.
pub fn sbefilter(x: ArrayView2<f64>, acqrate: f64, gamma: f64) -> Array2<f64> {
    let mut out = x.to_owned();
    if gamma == 0.0 || x.is_empty() {
        return out;
    }
    let coefficients = Coefficients::new(acqrate, gamma);
    for column in out.columns_mut() {
        filter_column(column, &coefficients);
    }
    out
}

fn filter_column(mut column: ArrayViewMut1<f64>, coefficients: &Coefficients) {
    let valid: Vec<usize> = column
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i)
        .collect();
    if valid.is_empty() {
        return;
    }
    let mut packed: Vec<f64> = valid.iter().map(|&i| column[i]).collect();
    coefficients.filter_in_place(&mut packed);
    for (&i, v) in valid.iter().zip(packed) {
        column[i] = v;
    }
}
