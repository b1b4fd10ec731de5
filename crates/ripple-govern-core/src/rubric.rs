// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Weighted conformance scoring of a single repository against a rubric.

use std::path::Path;

use regex::Regex;
use serde_json::Value;

use ripple_govern_model::{
    CategoryScore, CheckKind, CheckOutcome, ConformanceReport, ConformanceSummary, ReportStatus,
    Rubric, RubricCheck, CONFORMANCE_REPORT_SCHEMA,
};

use crate::ports::Fs;

enum Verdict {
    Pass,
    Fail(String),
}

fn read_json(fs: &dyn Fs, root: &Path, rel: &str) -> Result<Value, String> {
    let path = Path::new(rel);
    if !fs.exists(root, path) {
        return Err(format!("{rel} not found"));
    }
    let text = fs
        .read_text(root, path)
        .map_err(|err| format!("{rel} unreadable: {err}"))?;
    serde_json::from_str(&text).map_err(|err| format!("{rel} is not valid JSON: {err}"))
}

fn field_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = cur.get(seg)?;
    }
    Some(cur)
}

fn non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn check_file_exists(fs: &dyn Fs, root: &Path, path: &str) -> Verdict {
    if fs.exists(root, Path::new(path)) {
        Verdict::Pass
    } else {
        Verdict::Fail(format!("{path} not found"))
    }
}

fn check_file_exists_any(fs: &dyn Fs, root: &Path, paths: &[String]) -> Verdict {
    if paths.iter().any(|p| fs.exists(root, Path::new(p))) {
        Verdict::Pass
    } else {
        Verdict::Fail(format!("none of [{}] found", paths.join(", ")))
    }
}

fn check_json_field(fs: &dyn Fs, root: &Path, file: &str, field: &str) -> Verdict {
    let doc = match read_json(fs, root, file) {
        Ok(doc) => doc,
        Err(detail) => return Verdict::Fail(detail),
    };
    match field_path(&doc, field) {
        Some(value) if non_empty(value) => Verdict::Pass,
        Some(_) => Verdict::Fail(format!("{file}: field {field} is empty")),
        None => Verdict::Fail(format!("{file}: field {field} is absent")),
    }
}

fn check_script_exists(fs: &dyn Fs, root: &Path, name: &str) -> Verdict {
    let doc = match read_json(fs, root, "package.json") {
        Ok(doc) => doc,
        Err(detail) => return Verdict::Fail(detail),
    };
    match doc.get("scripts").and_then(|s| s.get(name)) {
        Some(Value::String(cmd)) if !cmd.is_empty() => Verdict::Pass,
        Some(_) => Verdict::Fail(format!("package.json script `{name}` is empty")),
        None => Verdict::Fail(format!("package.json has no script `{name}`")),
    }
}

fn check_file_not_tracked(fs: &dyn Fs, root: &Path, ignore_file: &str, pattern: &str) -> Verdict {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => return Verdict::Fail(format!("invalid ignore pattern `{pattern}`: {err}")),
    };
    let path = Path::new(ignore_file);
    if !fs.exists(root, path) {
        return Verdict::Fail(format!("{ignore_file} not found"));
    }
    let text = match fs.read_text(root, path) {
        Ok(text) => text,
        Err(err) => return Verdict::Fail(format!("{ignore_file} unreadable: {err}")),
    };
    if text.lines().any(|line| regex.is_match(line)) {
        Verdict::Pass
    } else {
        Verdict::Fail(format!("{ignore_file} has no entry matching `{pattern}`"))
    }
}

/// Runs one rubric check. Unknown check kinds fail with a taxonomy code so
/// rubric authors get feedback instead of a stack trace.
pub fn run_check(fs: &dyn Fs, check: &RubricCheck, category: &str, root: &Path) -> CheckOutcome {
    let verdict = match &check.kind {
        CheckKind::FileExists { path } => check_file_exists(fs, root, path),
        CheckKind::FileExistsAny { paths } => check_file_exists_any(fs, root, paths),
        CheckKind::JsonField { file, field } => check_json_field(fs, root, file, field),
        CheckKind::ScriptExists { name } => check_script_exists(fs, root, name),
        CheckKind::FileNotTracked {
            ignore_file,
            pattern,
        } => check_file_not_tracked(fs, root, ignore_file, pattern),
        CheckKind::Unknown(raw) => Verdict::Fail(format!(
            "unknown_check_type: {}",
            raw.get("type")
                .and_then(Value::as_str)
                .unwrap_or("<missing type>")
        )),
    };
    let (passed, detail) = match verdict {
        Verdict::Pass => (true, None),
        Verdict::Fail(detail) => (false, Some(detail)),
    };
    CheckOutcome {
        id: check.id.clone(),
        category: category.to_string(),
        passed,
        points: check.points,
        points_awarded: if passed { check.points } else { 0 },
        description: check.description.clone(),
        remediation: check.remediation.clone(),
        detail,
    }
}

pub fn score_rubric(
    fs: &dyn Fs,
    rubric: &Rubric,
    target_root: &Path,
    timestamp: &str,
) -> ConformanceReport {
    let mut findings = Vec::new();
    let mut categories = Vec::new();

    for category in &rubric.categories {
        let outcomes: Vec<CheckOutcome> = category
            .checks
            .iter()
            .map(|check| run_check(fs, check, &category.id, target_root))
            .collect();
        let score = outcomes.iter().map(|o| o.points_awarded).sum();
        let max_score = outcomes.iter().map(|o| o.points).sum();
        let passed = outcomes.iter().filter(|o| o.passed).count() as u32;
        categories.push(CategoryScore {
            id: category.id.clone(),
            name: category.name.clone(),
            score,
            max_score,
            passed,
            total: outcomes.len() as u32,
        });
        findings.extend(outcomes);
    }

    let score: u32 = categories.iter().map(|c| c.score).sum();
    let max_score: u32 = categories.iter().map(|c| c.max_score).sum();
    let summary = ConformanceSummary {
        passed: findings.iter().filter(|o| o.passed).count() as u64,
        failed: findings.iter().filter(|o| !o.passed).count() as u64,
        total: findings.len() as u64,
    };
    let status = if score >= rubric.passing_score {
        ReportStatus::Pass
    } else {
        ReportStatus::Fail
    };

    ConformanceReport {
        schema: CONFORMANCE_REPORT_SCHEMA.to_string(),
        timestamp: timestamp.to_string(),
        target_path: target_root.display().to_string(),
        score,
        max_score,
        passing_score: rubric.passing_score,
        status,
        categories,
        findings,
        summary,
    }
}

/// Degraded report for a missing or unparseable rubric document.
#[must_use]
pub fn config_error_conformance_report(
    target_root: &Path,
    timestamp: &str,
    detail: &str,
) -> ConformanceReport {
    let finding = CheckOutcome {
        id: "rubric".to_string(),
        category: "configuration".to_string(),
        passed: false,
        points: 0,
        points_awarded: 0,
        description: "Rubric document loads and parses".to_string(),
        remediation: "Restore a valid conformance rubric".to_string(),
        detail: Some(format!("rubric_config_invalid: {detail}")),
    };
    ConformanceReport {
        schema: CONFORMANCE_REPORT_SCHEMA.to_string(),
        timestamp: timestamp.to_string(),
        target_path: target_root.display().to_string(),
        score: 0,
        max_score: 0,
        passing_score: 0,
        status: ReportStatus::Fail,
        categories: Vec::new(),
        findings: vec![finding],
        summary: ConformanceSummary {
            passed: 0,
            failed: 1,
            total: 1,
        },
    }
}
