// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Report rendering and the process exit-code contract CI depends on.

use serde::Serialize;

use ripple_govern_model::{
    display, ConformanceReport, ContractDiffReport, DriftReport, FleetComplianceReport,
    ReportStatus,
};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    PolicyFail = 2,
    EngineError = 3,
    Usage = 4,
}

impl ExitCode {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

pub fn render_json<T: Serialize>(report: &T) -> Result<String, String> {
    serde_json::to_string_pretty(report).map_err(|err| err.to_string())
}

pub fn render_drift_text(report: &DriftReport) -> String {
    let mut lines = vec![
        format!("drift: {}", display::drift_summary_line(report)),
        format!(
            "CI_SUMMARY schema={} score={} total={}",
            report.schema, report.compliance_score, report.summary.total
        ),
    ];
    for finding in &report.findings {
        lines.push(format!(
            "finding: {} status={} severity={}",
            finding.surface_id,
            finding.status.as_str(),
            finding.severity.as_str()
        ));
        for item in &finding.remediation {
            lines.push(format!("  fix: {item}"));
        }
    }
    lines.join("\n")
}

pub fn render_conformance_text(report: &ConformanceReport) -> String {
    let mut lines = vec![
        format!(
            "conformance: score={}/{} passing={} status={}",
            report.score, report.max_score, report.passing_score, report.status.as_str()
        ),
        format!(
            "CI_SUMMARY schema={} score={} status={}",
            report.schema,
            report.score,
            report.status.as_str()
        ),
    ];
    for category in &report.categories {
        lines.push(format!(
            "category: {} {}/{} ({}/{} checks)",
            category.id, category.score, category.max_score, category.passed, category.total
        ));
    }
    for outcome in report.findings.iter().filter(|o| !o.passed) {
        let detail = outcome.detail.as_deref().unwrap_or("failed");
        lines.push(format!("failed: {} ({detail})", outcome.id));
    }
    lines.join("\n")
}

pub fn render_contract_text(report: &ContractDiffReport) -> String {
    let mut lines = vec![
        format!("api-diff: {}", display::contract_summary_line(report)),
        format!(
            "CI_SUMMARY schema={} breaking={} status={}",
            report.schema,
            report.breaking,
            report.status.as_str()
        ),
    ];
    for change in &report.changes {
        lines.push(format!(
            "change: {} {} {} {}",
            change.kind.as_str(),
            change.method.to_uppercase(),
            change.path,
            change.detail
        ));
    }
    lines.join("\n")
}

pub fn render_fleet_text(report: &FleetComplianceReport) -> String {
    let mut lines = vec![
        format!("fleet: {}", display::fleet_summary_line(report)),
        format!(
            "CI_SUMMARY schema={} repos={} below_target={}",
            report.schema, report.summary.repo_count, report.summary.repos_below_target
        ),
    ];
    for entry in &report.fleet {
        let mark = if entry.meets_target { "ok" } else { "below" };
        match &entry.reason {
            Some(reason) => lines.push(format!(
                "repo: {} score={} [{mark}] ({reason})",
                entry.repo, entry.compliance_score
            )),
            None => lines.push(format!(
                "repo: {} score={} critical={} standards={} [{mark}]",
                entry.repo, entry.compliance_score, entry.critical_drifts, entry.standards_drifts
            )),
        }
    }
    lines.join("\n")
}

/// Drift gates on the presence of unexcepted drifted/missing findings.
#[must_use]
pub fn exit_code_for_drift(report: &DriftReport) -> ExitCode {
    if report.summary.drifted > 0 || report.summary.missing > 0 {
        ExitCode::PolicyFail
    } else {
        ExitCode::Success
    }
}

#[must_use]
pub fn exit_code_for_status(status: ReportStatus) -> ExitCode {
    match status {
        ReportStatus::Pass => ExitCode::Success,
        ReportStatus::Fail => ExitCode::PolicyFail,
    }
}

/// The fleet roll-up gates on repositories falling below the target.
#[must_use]
pub fn exit_code_for_fleet(report: &FleetComplianceReport) -> ExitCode {
    if report.summary.repos_below_target > 0 {
        ExitCode::PolicyFail
    } else {
        ExitCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_govern_model::{DriftSummary, FleetSummary};

    fn drift(drifted: u64, missing: u64) -> DriftReport {
        DriftReport {
            schema: "ripple-fleet-drift/v1".to_string(),
            timestamp: "t".to_string(),
            source_version: "abc".to_string(),
            target_path: "/repo".to_string(),
            compliance_score: 100,
            findings: Vec::new(),
            exceptions: Vec::new(),
            summary: DriftSummary {
                compliant: 1,
                drifted,
                missing,
                exception: 0,
                total: 1 + drifted + missing,
            },
        }
    }

    #[test]
    fn drift_exit_codes_gate_on_unexcepted_findings() {
        assert_eq!(exit_code_for_drift(&drift(0, 0)), ExitCode::Success);
        assert_eq!(exit_code_for_drift(&drift(1, 0)), ExitCode::PolicyFail);
        assert_eq!(exit_code_for_drift(&drift(0, 1)), ExitCode::PolicyFail);
    }

    #[test]
    fn status_exit_codes() {
        assert_eq!(exit_code_for_status(ReportStatus::Pass).as_i32(), 0);
        assert_eq!(exit_code_for_status(ReportStatus::Fail).as_i32(), 2);
    }

    #[test]
    fn fleet_text_marks_unreachable_rows() {
        let report = FleetComplianceReport {
            schema: "ripple-fleet-compliance/v1".to_string(),
            timestamp: "t".to_string(),
            golden_path_version: "abc".to_string(),
            fleet: vec![crate::fleet::unreachable_entry("repo-x", "not a directory")],
            summary: FleetSummary {
                avg_compliance_score: 0,
                repos_below_target: 1,
                total_critical_drifts: 0,
                repo_count: 1,
            },
        };
        let text = render_fleet_text(&report);
        assert!(text.contains("repo-x"));
        assert!(text.contains("not a directory"));
        assert_eq!(exit_code_for_fleet(&report), ExitCode::PolicyFail);
    }

    #[test]
    fn drift_text_has_machine_grep_line() {
        let text = render_drift_text(&drift(0, 0));
        assert!(text.contains("CI_SUMMARY"));
    }
}
