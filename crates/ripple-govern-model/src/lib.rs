// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Policy and report model for the golden-path governance engine.
//!
//! Boundary: this crate is a leaf; it must not depend on the engine or the
//! CLI, and it performs no I/O. Everything here is plain data plus small
//! derivations over that data.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DRIFT_REPORT_SCHEMA: &str = "ripple-fleet-drift/v1";
pub const CONFORMANCE_REPORT_SCHEMA: &str = "ripple-conformance/v1";
pub const CONTRACT_DIFF_REPORT_SCHEMA: &str = "ripple-api-breaking/v1";
pub const FLEET_REPORT_SCHEMA: &str = "ripple-fleet-compliance/v1";

fn is_surface_id_segment(seg: &str) -> bool {
    !seg.is_empty()
        && seg
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Identifier of one governed surface, e.g. `FLEET-SURF-001`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn parse(value: &str) -> Result<Self, String> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err("surface id cannot be empty".to_string());
        }
        if !raw.split('-').all(is_surface_id_segment) {
            return Err(format!(
                "invalid surface id `{raw}`: expected UPPERCASE segments joined by `-`"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceSeverity {
    SecurityCritical,
    StandardsRequired,
    Advisory,
}

impl SurfaceSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecurityCritical => "security-critical",
            Self::StandardsRequired => "standards-required",
            Self::Advisory => "advisory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Content must match the golden path byte-for-byte (or hash-for-hash).
    Sync,
    /// Existence is enforced; downstream repos are expected to extend content.
    Merge,
    /// Report only.
    Advisory,
}

/// One JSON field to compare between the golden path and the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldProbe {
    pub file: String,
    /// Dot-separated key path inside the JSON document.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GovernedSurface {
    pub id: SurfaceId,
    pub name: String,
    pub severity: SurfaceSeverity,
    pub strategy: SyncStrategy,
    pub paths: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldProbe>,
    #[serde(default)]
    pub checksum_validation: bool,
}

pub const DEFAULT_EXCEPTION_VALIDITY_DAYS: u32 = 90;

const fn default_exception_validity_days() -> u32 {
    DEFAULT_EXCEPTION_VALIDITY_DAYS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComplianceTargets {
    pub minimum_score: u32,
    #[serde(default = "default_exception_validity_days")]
    pub exception_validity_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyManifest {
    pub governed_surfaces: Vec<GovernedSurface>,
    pub compliance_targets: ComplianceTargets,
}

/// A developer-authored override found as an in-repo comment.
///
/// Expiry is evaluated by the caller against the policy's validity window;
/// it is never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exception {
    pub surface_id: SurfaceId,
    pub justification: String,
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noted_on: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Compliant,
    Drifted,
    Missing,
    Exception,
}

impl FindingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::Drifted => "drifted",
            Self::Missing => "missing",
            Self::Exception => "exception",
        }
    }
}

/// Per-surface comparison outcome. `status` is write-once per comparator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub surface_id: SurfaceId,
    pub name: String,
    pub status: FindingStatus,
    pub severity: SurfaceSeverity,
    pub details: Vec<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub compliant: u64,
    pub drifted: u64,
    pub missing: u64,
    pub exception: u64,
    pub total: u64,
}

impl DriftSummary {
    #[must_use]
    pub fn from_findings(findings: &[Finding]) -> Self {
        let count = |status: FindingStatus| {
            findings.iter().filter(|f| f.status == status).count() as u64
        };
        Self {
            compliant: count(FindingStatus::Compliant),
            drifted: count(FindingStatus::Drifted),
            missing: count(FindingStatus::Missing),
            exception: count(FindingStatus::Exception),
            total: findings.len() as u64,
        }
    }
}

/// `round(100 × compliant / total)`; vacuously 100 for an empty finding set.
#[must_use]
pub fn compliance_score(summary: &DriftSummary) -> u32 {
    if summary.total == 0 {
        return 100;
    }
    let ratio = summary.compliant as f64 / summary.total as f64;
    (ratio * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub schema: String,
    pub timestamp: String,
    pub source_version: String,
    pub target_path: String,
    pub compliance_score: u32,
    pub findings: Vec<Finding>,
    pub exceptions: Vec<Exception>,
    pub summary: DriftSummary,
}

/// One weighted conformance assertion.
///
/// The `Unknown` fallback keeps an author typo in `type` from aborting the
/// whole rubric; the scorer turns it into a failed outcome with a taxonomy
/// code instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum CheckKind {
    FileExists {
        path: String,
    },
    FileExistsAny {
        paths: Vec<String>,
    },
    JsonField {
        file: String,
        field: String,
    },
    ScriptExists {
        name: String,
    },
    FileNotTracked {
        #[serde(default = "default_ignore_file")]
        ignore_file: String,
        pattern: String,
    },
    #[serde(untagged)]
    Unknown(Value),
}

fn default_ignore_file() -> String {
    ".gitignore".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricCheck {
    pub id: String,
    #[serde(flatten)]
    pub kind: CheckKind,
    pub points: u32,
    pub description: String,
    #[serde(default)]
    pub remediation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricCategory {
    pub id: String,
    pub name: String,
    pub checks: Vec<RubricCheck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub passing_score: u32,
    pub categories: Vec<RubricCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pass,
    Fail,
}

impl ReportStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub id: String,
    pub category: String,
    pub passed: bool,
    pub points: u32,
    pub points_awarded: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remediation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub max_score: u32,
    pub passed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceSummary {
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceReport {
    pub schema: String,
    pub timestamp: String,
    pub target_path: String,
    pub score: u32,
    pub max_score: u32,
    pub passing_score: u32,
    pub status: ReportStatus,
    pub categories: Vec<CategoryScore>,
    pub findings: Vec<CheckOutcome>,
    pub summary: ConformanceSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeSeverity {
    Breaking,
    NonBreaking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    PathRemoved,
    MethodRemoved,
    OperationIdChanged,
    RequiredFieldAdded,
    RequiredParamAdded,
    ResponseCodeRemoved,
    PathAdded,
    MethodAdded,
}

impl ChangeKind {
    /// Breaking/non-breaking is a property of the kind, never a per-change
    /// judgement call.
    #[must_use]
    pub const fn severity(self) -> ChangeSeverity {
        match self {
            Self::PathRemoved
            | Self::MethodRemoved
            | Self::OperationIdChanged
            | Self::RequiredFieldAdded
            | Self::RequiredParamAdded
            | Self::ResponseCodeRemoved => ChangeSeverity::Breaking,
            Self::PathAdded | Self::MethodAdded => ChangeSeverity::NonBreaking,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathRemoved => "path-removed",
            Self::MethodRemoved => "method-removed",
            Self::OperationIdChanged => "operation-id-changed",
            Self::RequiredFieldAdded => "required-field-added",
            Self::RequiredParamAdded => "required-param-added",
            Self::ResponseCodeRemoved => "response-code-removed",
            Self::PathAdded => "path-added",
            Self::MethodAdded => "method-added",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub severity: ChangeSeverity,
    pub path: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub detail: String,
}

impl ContractChange {
    /// Builds a change with the severity derived from its kind, keeping the
    /// taxonomy invariant unforgeable at construction.
    #[must_use]
    pub fn new(kind: ChangeKind, path: &str, method: &str, detail: String) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            path: path.to_string(),
            method: method.to_string(),
            operation_id: None,
            detail,
        }
    }

    #[must_use]
    pub fn with_operation_id(mut self, operation_id: Option<String>) -> Self {
        self.operation_id = operation_id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineResolution {
    Found,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDiffReport {
    pub schema: String,
    pub timestamp: String,
    pub status: ReportStatus,
    pub base_ref: String,
    pub baseline: BaselineResolution,
    pub breaking: u64,
    pub non_breaking: u64,
    pub changes: Vec<ContractChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetEntry {
    pub repo: String,
    pub compliance_score: u32,
    pub critical_drifts: u64,
    pub standards_drifts: u64,
    pub meets_target: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub avg_compliance_score: u32,
    pub repos_below_target: u64,
    pub total_critical_drifts: u64,
    pub repo_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetComplianceReport {
    pub schema: String,
    pub timestamp: String,
    pub golden_path_version: String,
    pub fleet: Vec<FleetEntry>,
    pub summary: FleetSummary,
}

pub mod fingerprint {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    pub fn finding_fingerprint(finding: &Finding) -> String {
        let mut hasher = DefaultHasher::new();
        finding.surface_id.hash(&mut hasher);
        finding.status.hash(&mut hasher);
        finding.severity.hash(&mut hasher);
        finding.details.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    pub fn change_fingerprint(change: &ContractChange) -> String {
        let mut hasher = DefaultHasher::new();
        change.kind.hash(&mut hasher);
        change.path.hash(&mut hasher);
        change.method.hash(&mut hasher);
        change.detail.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

pub mod display {
    use super::*;

    pub fn drift_summary_line(report: &DriftReport) -> String {
        format!(
            "target={} score={} compliant={} drifted={} missing={} exception={}",
            report.target_path,
            report.compliance_score,
            report.summary.compliant,
            report.summary.drifted,
            report.summary.missing,
            report.summary.exception
        )
    }

    pub fn contract_summary_line(report: &ContractDiffReport) -> String {
        format!(
            "status={} breaking={} non_breaking={}",
            report.status.as_str(),
            report.breaking,
            report.non_breaking
        )
    }

    pub fn fleet_summary_line(report: &FleetComplianceReport) -> String {
        format!(
            "repos={} avg_score={} below_target={} critical_drifts={}",
            report.summary.repo_count,
            report.summary.avg_compliance_score,
            report.summary.repos_below_target,
            report.summary.total_critical_drifts
        )
    }
}

pub fn drift_report_json_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ripple fleet drift report",
        "type": "object",
        "required": ["schema", "timestamp", "sourceVersion", "targetPath", "complianceScore", "findings", "exceptions", "summary"],
        "properties": {
            "schema": {"type": "string", "const": DRIFT_REPORT_SCHEMA},
            "timestamp": {"type": "string"},
            "sourceVersion": {"type": "string"},
            "targetPath": {"type": "string"},
            "complianceScore": {"type": "integer", "minimum": 0, "maximum": 100},
            "findings": {"type": "array"},
            "exceptions": {"type": "array"},
            "summary": {"type": "object"}
        }
    })
}

pub fn conformance_report_json_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ripple conformance report",
        "type": "object",
        "required": ["schema", "timestamp", "targetPath", "score", "maxScore", "passingScore", "status", "categories", "findings", "summary"],
        "properties": {
            "schema": {"type": "string", "const": CONFORMANCE_REPORT_SCHEMA},
            "timestamp": {"type": "string"},
            "targetPath": {"type": "string"},
            "score": {"type": "integer", "minimum": 0},
            "maxScore": {"type": "integer", "minimum": 0},
            "passingScore": {"type": "integer", "minimum": 0},
            "status": {"enum": ["pass", "fail"]},
            "categories": {"type": "array"},
            "findings": {"type": "array"},
            "summary": {"type": "object"}
        }
    })
}

pub fn contract_diff_report_json_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ripple api breaking-change report",
        "type": "object",
        "required": ["schema", "timestamp", "status", "baseRef", "baseline", "breaking", "nonBreaking", "changes"],
        "properties": {
            "schema": {"type": "string", "const": CONTRACT_DIFF_REPORT_SCHEMA},
            "timestamp": {"type": "string"},
            "status": {"enum": ["pass", "fail"]},
            "baseRef": {"type": "string"},
            "baseline": {"enum": ["found", "not-found"]},
            "breaking": {"type": "integer", "minimum": 0},
            "nonBreaking": {"type": "integer", "minimum": 0},
            "changes": {"type": "array"}
        }
    })
}

pub fn fleet_report_json_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ripple fleet compliance report",
        "type": "object",
        "required": ["schema", "timestamp", "goldenPathVersion", "fleet", "summary"],
        "properties": {
            "schema": {"type": "string", "const": FLEET_REPORT_SCHEMA},
            "timestamp": {"type": "string"},
            "goldenPathVersion": {"type": "string"},
            "fleet": {"type": "array"},
            "summary": {"type": "object"}
        }
    })
}
