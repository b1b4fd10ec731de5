// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Fleet-wide reduction of per-repository drift reports.

use ripple_govern_model::{
    DriftReport, FindingStatus, FleetComplianceReport, FleetEntry, FleetSummary, SurfaceSeverity,
    FLEET_REPORT_SCHEMA,
};

fn drift_count(report: &DriftReport, severity: SurfaceSeverity) -> u64 {
    report
        .findings
        .iter()
        .filter(|f| {
            matches!(f.status, FindingStatus::Drifted | FindingStatus::Missing)
                && f.severity == severity
        })
        .count() as u64
}

/// One fleet row for a repository that was scanned successfully.
#[must_use]
pub fn fleet_entry(repo: &str, report: &DriftReport, minimum_score: u32) -> FleetEntry {
    FleetEntry {
        repo: repo.to_string(),
        compliance_score: report.compliance_score,
        critical_drifts: drift_count(report, SurfaceSeverity::SecurityCritical),
        standards_drifts: drift_count(report, SurfaceSeverity::StandardsRequired),
        meets_target: report.compliance_score >= minimum_score,
        reason: None,
    }
}

/// A repository that could not be scanned still occupies a row; dropping it
/// would corrupt the fleet average.
#[must_use]
pub fn unreachable_entry(repo: &str, reason: &str) -> FleetEntry {
    FleetEntry {
        repo: repo.to_string(),
        compliance_score: 0,
        critical_drifts: 0,
        standards_drifts: 0,
        meets_target: false,
        reason: Some(reason.to_string()),
    }
}

#[must_use]
pub fn aggregate(
    fleet: Vec<FleetEntry>,
    golden_path_version: &str,
    timestamp: &str,
) -> FleetComplianceReport {
    let repo_count = fleet.len() as u64;
    let avg_compliance_score = if fleet.is_empty() {
        0
    } else {
        let sum: u64 = fleet.iter().map(|e| u64::from(e.compliance_score)).sum();
        ((sum as f64 / fleet.len() as f64).round()) as u32
    };
    let summary = FleetSummary {
        avg_compliance_score,
        repos_below_target: fleet.iter().filter(|e| !e.meets_target).count() as u64,
        total_critical_drifts: fleet.iter().map(|e| e.critical_drifts).sum(),
        repo_count,
    };
    FleetComplianceReport {
        schema: FLEET_REPORT_SCHEMA.to_string(),
        timestamp: timestamp.to_string(),
        golden_path_version: golden_path_version.to_string(),
        fleet,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_govern_model::{
        compliance_score, DriftSummary, Finding, SurfaceId, DRIFT_REPORT_SCHEMA,
    };

    fn finding(id: &str, status: FindingStatus, severity: SurfaceSeverity) -> Finding {
        Finding {
            surface_id: SurfaceId::parse(id).expect("id"),
            name: id.to_string(),
            status,
            severity,
            details: Vec::new(),
            remediation: Vec::new(),
        }
    }

    fn report(findings: Vec<Finding>) -> DriftReport {
        let summary = DriftSummary::from_findings(&findings);
        DriftReport {
            schema: DRIFT_REPORT_SCHEMA.to_string(),
            timestamp: "t".to_string(),
            source_version: "abc".to_string(),
            target_path: "/repo".to_string(),
            compliance_score: compliance_score(&summary),
            findings,
            exceptions: Vec::new(),
            summary,
        }
    }

    fn scored_report(score: u32) -> DriftReport {
        let mut r = report(Vec::new());
        r.compliance_score = score;
        r
    }

    #[test]
    fn counts_split_by_severity_and_skip_advisory() {
        let r = report(vec![
            finding("A-1", FindingStatus::Drifted, SurfaceSeverity::SecurityCritical),
            finding("A-2", FindingStatus::Missing, SurfaceSeverity::SecurityCritical),
            finding("A-3", FindingStatus::Drifted, SurfaceSeverity::StandardsRequired),
            finding("A-4", FindingStatus::Drifted, SurfaceSeverity::Advisory),
            finding("A-5", FindingStatus::Compliant, SurfaceSeverity::SecurityCritical),
            finding("A-6", FindingStatus::Exception, SurfaceSeverity::SecurityCritical),
        ]);
        let entry = fleet_entry("repo-a", &r, 80);
        assert_eq!(entry.critical_drifts, 2);
        assert_eq!(entry.standards_drifts, 1);
    }

    #[test]
    fn average_and_below_target_match_policy_threshold() {
        let entries = vec![
            fleet_entry("repo-a", &scored_report(100), 80),
            fleet_entry("repo-b", &scored_report(80), 80),
            fleet_entry("repo-c", &scored_report(60), 80),
        ];
        let fleet = aggregate(entries, "abc123", "t");
        assert_eq!(fleet.summary.avg_compliance_score, 80);
        // 80 meets the target via >=; only the 60 falls below.
        assert_eq!(fleet.summary.repos_below_target, 1);
        assert_eq!(fleet.summary.repo_count, 3);
    }

    #[test]
    fn unreachable_repo_keeps_its_row() {
        let entries = vec![
            fleet_entry("repo-a", &scored_report(100), 80),
            unreachable_entry("repo-b", "clone failed: connection reset"),
        ];
        let fleet = aggregate(entries, "abc123", "t");
        assert_eq!(fleet.summary.avg_compliance_score, 50);
        assert_eq!(fleet.summary.repos_below_target, 1);
        assert_eq!(
            fleet.fleet[1].reason.as_deref(),
            Some("clone failed: connection reset")
        );
    }

    #[test]
    fn empty_fleet_aggregates_to_zeroes() {
        let fleet = aggregate(Vec::new(), "abc123", "t");
        assert_eq!(fleet.summary.repo_count, 0);
        assert_eq!(fleet.summary.avg_compliance_score, 0);
    }
}
