// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const POLICY: &str = r#"{
    "governedSurfaces": [{
        "id": "FLEET-SURF-001",
        "name": "Lint configuration",
        "severity": "standards-required",
        "strategy": "sync",
        "paths": ["eslint.config.js"],
        "checksumValidation": true
    }],
    "complianceTargets": {"minimumScore": 80}
}"#;

const RUBRIC: &str = r#"{
    "passingScore": 10,
    "categories": [{
        "id": "testing",
        "name": "Testing",
        "checks": [{
            "id": "scripts.test",
            "type": "script-exists",
            "name": "test",
            "points": 10,
            "description": "package.json declares a test script"
        }]
    }]
}"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, content).expect("write");
}

fn govern(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ripple-govern"))
        .args(args)
        .output()
        .expect("spawn ripple-govern")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn drift_compliant_repo_exits_zero() {
    let golden = TempDir::new().expect("golden");
    let target = TempDir::new().expect("target");
    write(golden.path(), "golden-path.policy.json", POLICY);
    write(golden.path(), "eslint.config.js", "export default [];\n");
    write(target.path(), "eslint.config.js", "export default [];\n");

    let output = govern(&[
        "drift",
        "--golden-root",
        &golden.path().display().to_string(),
        "--target",
        &target.path().display().to_string(),
        "--source-version",
        "abc123d",
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    assert_eq!(
        report.get("schema").and_then(|v| v.as_str()),
        Some("ripple-fleet-drift/v1")
    );
    assert_eq!(
        report.get("complianceScore").and_then(|v| v.as_u64()),
        Some(100)
    );
    assert_eq!(
        report.get("sourceVersion").and_then(|v| v.as_str()),
        Some("abc123d")
    );
}

#[test]
fn drift_divergence_exits_two_with_remediation() {
    let golden = TempDir::new().expect("golden");
    let target = TempDir::new().expect("target");
    write(golden.path(), "golden-path.policy.json", POLICY);
    write(golden.path(), "eslint.config.js", "export default [strict];\n");
    write(target.path(), "eslint.config.js", "export default [];\n");

    let output = govern(&[
        "drift",
        "--golden-root",
        &golden.path().display().to_string(),
        "--target",
        &target.path().display().to_string(),
        "--source-version",
        "abc123d",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("CI_SUMMARY"));
    assert!(text.contains("Update eslint.config.js to match golden-path version"));
}

#[test]
fn missing_policy_manifest_degrades_to_synthetic_report() {
    let golden = TempDir::new().expect("golden");
    let target = TempDir::new().expect("target");

    let output = govern(&[
        "drift",
        "--golden-root",
        &golden.path().display().to_string(),
        "--target",
        &target.path().display().to_string(),
        "--source-version",
        "abc123d",
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(
        report.get("complianceScore").and_then(|v| v.as_u64()),
        Some(0)
    );
    let details = report["findings"][0]["details"][0]
        .as_str()
        .unwrap_or_default();
    assert!(details.contains("policy_config_invalid"));
}

#[test]
fn conformance_scores_and_gates() {
    let target = TempDir::new().expect("target");
    write(target.path(), "conformance.rubric.json", RUBRIC);
    write(
        target.path(),
        "package.json",
        r#"{"scripts": {"test": "vitest run"}}"#,
    );

    let output = govern(&[
        "conformance",
        "--target",
        &target.path().display().to_string(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    assert_eq!(report.get("score").and_then(|v| v.as_u64()), Some(10));
    assert_eq!(report.get("status").and_then(|v| v.as_str()), Some("pass"));

    fs::write(
        target.path().join("package.json"),
        r#"{"scripts": {}}"#,
    )
    .expect("rewrite");
    let output = govern(&[
        "conformance",
        "--target",
        &target.path().display().to_string(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(report.get("status").and_then(|v| v.as_str()), Some("fail"));
}

#[test]
fn api_diff_flags_new_required_field() {
    let dir = TempDir::new().expect("dir");
    write(
        dir.path(),
        "baseline.json",
        r#"{"openapi": "3.1.0", "paths": {"/v1/users": {"post": {
            "requestBody": {"content": {"application/json": {"schema": {"required": ["email", "name"]}}}},
            "responses": {"201": {}}
        }}}}"#,
    );
    write(
        dir.path(),
        "current.json",
        r#"{"openapi": "3.1.0", "paths": {"/v1/users": {"post": {
            "requestBody": {"content": {"application/json": {"schema": {"required": ["email", "name", "phone"]}}}},
            "responses": {"201": {}}
        }}}}"#,
    );

    let output = govern(&[
        "api-diff",
        "--baseline",
        &dir.path().join("baseline.json").display().to_string(),
        "--current",
        &dir.path().join("current.json").display().to_string(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(report.get("breaking").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        report["changes"][0]["type"].as_str(),
        Some("required-field-added")
    );
    assert_eq!(
        report["changes"][0]["detail"].as_str(),
        Some("New required request field: \"phone\"")
    );
}

#[test]
fn api_diff_without_git_history_passes_with_marker() {
    let dir = TempDir::new().expect("dir");
    write(
        dir.path(),
        "current.json",
        r#"{"openapi": "3.1.0", "paths": {"/health": {"get": {"responses": {"200": {}}}}}}"#,
    );

    let output = govern(&[
        "api-diff",
        "--base-ref",
        "v0.0.1",
        "--current",
        &dir.path().join("current.json").display().to_string(),
        "--contract-path",
        "openapi.json",
        "--target",
        &dir.path().display().to_string(),
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(0));
    let report = stdout_json(&output);
    assert_eq!(
        report.get("baseline").and_then(|v| v.as_str()),
        Some("not-found")
    );
    assert_eq!(report.get("status").and_then(|v| v.as_str()), Some("pass"));
}

#[test]
fn fleet_keeps_unreachable_repo_rows() {
    let golden = TempDir::new().expect("golden");
    let repo = TempDir::new().expect("repo");
    write(golden.path(), "golden-path.policy.json", POLICY);
    write(golden.path(), "eslint.config.js", "export default [];\n");
    write(repo.path(), "eslint.config.js", "export default [];\n");

    let missing = golden.path().join("no-such-repo");
    let output = govern(&[
        "fleet",
        "--golden-root",
        &golden.path().display().to_string(),
        "--repo",
        &repo.path().display().to_string(),
        "--repo",
        &missing.display().to_string(),
        "--source-version",
        "abc123d",
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(
        report.get("schema").and_then(|v| v.as_str()),
        Some("ripple-fleet-compliance/v1")
    );
    let fleet = report.get("fleet").and_then(|v| v.as_array()).expect("rows");
    assert_eq!(fleet.len(), 2);
    assert_eq!(fleet[0]["complianceScore"].as_u64(), Some(100));
    assert_eq!(fleet[1]["complianceScore"].as_u64(), Some(0));
    assert_eq!(fleet[1]["reason"].as_str(), Some("not a directory"));
    assert_eq!(report["summary"]["avgComplianceScore"].as_u64(), Some(50));
}

#[test]
fn schema_subcommand_prints_report_schema() {
    let output = govern(&["schema", "drift"]);
    assert_eq!(output.status.code(), Some(0));
    let schema = stdout_json(&output);
    assert!(schema.to_string().contains("ripple-fleet-drift/v1"));
}

#[test]
fn report_out_flag_writes_file() {
    let golden = TempDir::new().expect("golden");
    let target = TempDir::new().expect("target");
    write(golden.path(), "golden-path.policy.json", POLICY);
    write(golden.path(), "eslint.config.js", "export default [];\n");
    write(target.path(), "eslint.config.js", "export default [];\n");
    let out = target.path().join("drift.json");

    let output = govern(&[
        "drift",
        "--golden-root",
        &golden.path().display().to_string(),
        "--target",
        &target.path().display().to_string(),
        "--source-version",
        "abc123d",
        "--out",
        &out.display().to_string(),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("out file")).expect("json");
    assert_eq!(
        written.get("schema").and_then(|v| v.as_str()),
        Some("ripple-fleet-drift/v1")
    );
}
