// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs::File;

use indoc::indoc;
use serde_json::Value;
use tempfile::TempDir;

use crate::{get_cmd_output, mmp, write_raw_deployment};

#[test]
fn test_process_bins_every_instrument() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let raw = write_raw_deployment(tmp_dir.path(), 3);
    let params = tmp_dir.path().join("params.toml");
    std::fs::write(
        &params,
        indoc! {r#"
            profiles_to_process = [1, 2]

            [binning.ctd]
            size = 10.0

            [binning.eng]
            min = 0.0
            size = 5.0
            max = 50.0
        "#},
    )
    .unwrap();
    let output = tmp_dir.path().join("binned.json");
    let processed = tmp_dir.path().join("processed.json");

    #[rustfmt::skip]
    let cmd = mmp()
        .args([
            "process",
            &format!("{}", params.display()),
            "--raw", &format!("{}", raw.display()),
            "--output", &format!("{}", output.display()),
            "--processed", &format!("{}", processed.display()),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "process failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");

    let binned: Value = serde_json::from_reader(File::open(&output).unwrap()).unwrap();
    let ctd = &binned["ctd"];
    assert_eq!(ctd["profile_numbers"], serde_json::json!([1, 2, 3]));
    assert_eq!(ctd["params"]["min"], 10.0);
    assert_eq!(ctd["params"]["max"], 40.0);
    let temperature = &ctd["channels"]["temperature"];
    assert_eq!(temperature["dim"], serde_json::json!([4, 3, 1]));
    // Profile 3 wasn't selected, so its column is NaN (null).
    for (i, v) in temperature["data"].as_array().unwrap().iter().enumerate() {
        if i % 3 == 2 {
            assert!(v.is_null());
        } else {
            assert_eq!(v.as_f64(), Some(12.0));
        }
    }

    let eng = &binned["eng"];
    assert_eq!(eng["centres"]["dim"], serde_json::json!([11]));
    assert!(binned.get("ad2cp").is_some());

    let processed: Value = serde_json::from_reader(File::open(&processed).unwrap()).unwrap();
    let statuses = &processed["eng"]["profiles"][2]["data_status"];
    assert!(statuses
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s == "not selected for processing"));
}

#[test]
fn test_process_needs_a_readable_raw_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let params = tmp_dir.path().join("params.json");
    std::fs::write(&params, "{}").unwrap();
    let raw = tmp_dir.path().join("raw.json");
    std::fs::write(&raw, "not json").unwrap();

    #[rustfmt::skip]
    let cmd = mmp()
        .args([
            "process",
            &format!("{}", params.display()),
            "--raw", &format!("{}", raw.display()),
            "--no-progress-bars",
        ])
        .current_dir(tmp_dir.path())
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(
        stderr.contains("Couldn't decode the raw deployment"),
        "unexpected stderr: {stderr}"
    );
    assert!(!tmp_dir.path().join("mmp_binned.json").exists());
}
