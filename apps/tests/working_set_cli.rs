/*
 * Copyright 2022-2025 Crown Copyright
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */
use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*; // Used for writing assertions
use std::process::Command;

#[test]
fn help_lists_output_option() {
    let mut cmd = Command::new(cargo_bin!("working_set"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--out <OUTPUT>"))
        .stdout(predicate::str::contains("/user/cms/working_set_day"));
}

#[test]
fn help_explains_default_output_replaces_hdfs() {
    let mut cmd = Command::new(cargo_bin!("working_set"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("standing in for the cluster's HDFS"))
        .stdout(predicate::str::contains(
            "hdfs://analytix/user/ncsmith/working_set_day",
        ));
}

#[test]
fn rejects_unknown_arguments() {
    let mut cmd = Command::new(cargo_bin!("working_set"));
    cmd.args(["--input", "/tmp/jobs"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn refuses_non_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("part-0.parquet"), b"existing").unwrap();

    let mut cmd = Command::new(cargo_bin!("working_set"));
    cmd.arg("--out").arg(dir.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("is not empty"));
}

#[test]
fn fails_when_inputs_are_missing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("working_set_day");

    let mut cmd = Command::new(cargo_bin!("working_set"));
    cmd.arg("--out").arg(&output);
    cmd.assert().failure();
    assert!(!output.exists());
}
