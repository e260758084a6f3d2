// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{get_cmd_output, mmp};

#[test]
fn test_verify_params() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let params = tmp_dir.path().join("params.toml");
    std::fs::write(&params, "deployment_id = \"GS01SUMO\"\n").unwrap();

    let cmd = mmp()
        .args(["verify-params", &format!("{}", params.display())])
        .ok();
    assert!(cmd.is_ok(), "verify-params failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("GS01SUMO"));
    // Defaults are filled in.
    assert!(stdout.contains("wag_radius_m = 0.43"));
}

#[test]
fn test_verify_params_rejects_unknown_formats() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let params = tmp_dir.path().join("params.yaml");
    std::fs::write(&params, "deployment_id: GS01SUMO\n").unwrap();

    let cmd = mmp()
        .args(["verify-params", &format!("{}", params.display())])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "unexpected stderr: {stderr}");
}
