// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod process;
mod verify_params;

use std::{path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};
use ndarray::prelude::*;

use mmp_toolbox::{Channel, Instrument, Profile, RawDeployment};

fn mmp() -> Command {
    Command::cargo_bin("mmp").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

const T0: f64 = 737_000.0;
const NUM_SAMPLES: usize = 61;

/// One descent from 10 to 40 dbar at 0.5 dbar/s, seen by the CTD (without
/// times) and the engineering stream (with times), both at 1 Hz.
fn descent(number: u32) -> (Profile, Profile) {
    let pressure = Array1::from_shape_fn(NUM_SAMPLES, |i| 10.0 + 0.5 * i as f64);
    let mut ctd = Profile::new(Instrument::Ctd, number, "CE09OSPM")
        .with_column(Channel::Pressure, pressure.clone())
        .with_column(Channel::Temperature, Array1::from_elem(NUM_SAMPLES, 12.0))
        .with_column(Channel::Conductivity, Array1::from_elem(NUM_SAMPLES, 4.0))
        .with_column(Channel::Oxygen, Array1::from_elem(NUM_SAMPLES, 200.0));
    ctd.acquisition_rate_hz = 1.0;

    let start = T0 + f64::from(number) / 24.0;
    let mut eng = Profile::new(Instrument::Eng, number, "CE09OSPM")
        .with_column(
            Channel::Time,
            Array1::from_shape_fn(NUM_SAMPLES, |i| start + i as f64 / 86400.0),
        )
        .with_column(Channel::Pressure, pressure)
        .with_column(Channel::Chlorophyll, Array1::from_elem(NUM_SAMPLES, 0.5))
        .with_column(Channel::Backscatter, Array1::from_elem(NUM_SAMPLES, 0.001))
        .with_column(Channel::Par, Array1::from_elem(NUM_SAMPLES, 10.0));
    eng.acquisition_rate_hz = 1.0;
    (ctd, eng)
}

/// Write a raw deployment of `num_profiles` identical descents.
fn write_raw_deployment(dir: &Path, num_profiles: u32) -> std::path::PathBuf {
    let mut raw = RawDeployment::default();
    for n in 1..=num_profiles {
        let (ctd, eng) = descent(n);
        raw.ctd.push(ctd);
        raw.eng.push(eng);
    }
    let file = dir.join("raw.json");
    std::fs::write(&file, serde_json::to_string(&raw).unwrap()).unwrap();
    file
}
