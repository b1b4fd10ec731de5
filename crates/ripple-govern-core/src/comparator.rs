// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Per-surface drift detection between a golden-path checkout and a target
//! repository.

use std::path::Path;

use serde_json::Value;

use ripple_govern_model::{
    compliance_score, DriftReport, DriftSummary, Exception, Finding, FindingStatus,
    GovernedSurface, PolicyManifest, SurfaceId, SurfaceSeverity, SyncStrategy,
    DRIFT_REPORT_SCHEMA,
};

use crate::adapters::sha256_hex;
use crate::exceptions::{active_exceptions, ExceptionScanner};
use crate::ports::Fs;

#[derive(Debug, Clone)]
pub struct DriftOptions {
    pub source_version: String,
    pub timestamp: String,
    /// ISO date; dated exceptions noted before this are ignored.
    pub exception_cutoff: Option<String>,
}

/// Escalation ladder: missing > drifted > compliant.
fn escalate(current: FindingStatus, observed: FindingStatus) -> FindingStatus {
    let rank = |status: FindingStatus| match status {
        FindingStatus::Missing => 2,
        FindingStatus::Drifted => 1,
        FindingStatus::Compliant | FindingStatus::Exception => 0,
    };
    if rank(observed) > rank(current) {
        observed
    } else {
        current
    }
}

fn field_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = cur.get(seg)?;
    }
    Some(cur)
}

struct SurfaceInspection {
    status: FindingStatus,
    details: Vec<String>,
    remediation: Vec<String>,
}

impl SurfaceInspection {
    fn new() -> Self {
        Self {
            status: FindingStatus::Compliant,
            details: Vec::new(),
            remediation: Vec::new(),
        }
    }

    fn observe(&mut self, status: FindingStatus, detail: String, fix: Option<String>) {
        self.status = escalate(self.status, status);
        self.details.push(detail);
        if let Some(fix) = fix {
            if !self.remediation.contains(&fix) {
                self.remediation.push(fix);
            }
        }
    }
}

fn contents_match(
    fs: &dyn Fs,
    surface: &GovernedSurface,
    golden_root: &Path,
    target_root: &Path,
    rel: &str,
) -> Result<bool, String> {
    let path = Path::new(rel);
    let golden = fs
        .read_bytes(golden_root, path)
        .map_err(|err| err.to_string())?;
    let target = fs
        .read_bytes(target_root, path)
        .map_err(|err| err.to_string())?;
    if surface.checksum_validation {
        Ok(sha256_hex(&golden) == sha256_hex(&target))
    } else {
        Ok(golden == target)
    }
}

fn inspect_paths(
    fs: &dyn Fs,
    surface: &GovernedSurface,
    golden_root: &Path,
    target_root: &Path,
    inspection: &mut SurfaceInspection,
) {
    for rel in &surface.paths {
        let path = Path::new(rel);
        if !fs.exists(golden_root, path) {
            // Nothing to enforce for this path.
            inspection
                .details
                .push(format!("golden path does not provide {rel}; skipped"));
            continue;
        }
        if !fs.exists(target_root, path) {
            inspection.observe(
                FindingStatus::Missing,
                format!("target is missing {rel}"),
                Some(format!("Copy {rel} from the golden path")),
            );
            continue;
        }
        match surface.strategy {
            SyncStrategy::Sync => match contents_match(fs, surface, golden_root, target_root, rel)
            {
                Ok(true) => {}
                Ok(false) => inspection.observe(
                    FindingStatus::Drifted,
                    format!("content drift in {rel}"),
                    Some(format!("Update {rel} to match golden-path version")),
                ),
                Err(detail) => inspection.observe(
                    FindingStatus::Drifted,
                    format!("could not compare {rel}: {detail}"),
                    Some(format!("Update {rel} to match golden-path version")),
                ),
            },
            // Downstream repos extend merge surfaces; existence is the contract.
            SyncStrategy::Merge => {}
            SyncStrategy::Advisory => {
                match contents_match(fs, surface, golden_root, target_root, rel) {
                    Ok(true) | Err(_) => {}
                    Ok(false) => inspection
                        .details
                        .push(format!("advisory: {rel} diverges from the golden path")),
                }
            }
        }
    }
}

fn inspect_fields(
    fs: &dyn Fs,
    surface: &GovernedSurface,
    golden_root: &Path,
    target_root: &Path,
    inspection: &mut SurfaceInspection,
) {
    for probe in &surface.fields {
        let path = Path::new(&probe.file);
        if !fs.exists(golden_root, path) {
            inspection.details.push(format!(
                "golden path does not provide {}; field {} skipped",
                probe.file, probe.key
            ));
            continue;
        }
        if !fs.exists(target_root, path) {
            inspection.observe(
                FindingStatus::Missing,
                format!("target is missing {} (field {})", probe.file, probe.key),
                Some(format!("Copy {} from the golden path", probe.file)),
            );
            continue;
        }
        let golden_doc = read_json(fs, golden_root, path);
        let target_doc = read_json(fs, target_root, path);
        let (golden_doc, target_doc) = match (golden_doc, target_doc) {
            (Ok(g), Ok(t)) => (g, t),
            (Err(detail), _) | (_, Err(detail)) => {
                inspection.observe(
                    FindingStatus::Drifted,
                    format!("field {} in {}: {detail}", probe.key, probe.file),
                    Some(format!("Restore valid JSON in {}", probe.file)),
                );
                continue;
            }
        };
        let golden_value = field_path(&golden_doc, &probe.key);
        let target_value = field_path(&target_doc, &probe.key);
        match (golden_value, target_value) {
            (None, _) => inspection.details.push(format!(
                "golden path {} has no field {}; skipped",
                probe.file, probe.key
            )),
            (Some(expected), None) => inspection.observe(
                FindingStatus::Drifted,
                format!(
                    "field {} missing from target {} (golden={expected})",
                    probe.key, probe.file
                ),
                Some(format!(
                    "Set {} in {} to the golden-path value",
                    probe.key, probe.file
                )),
            ),
            (Some(expected), Some(actual)) => {
                // serde_json equality: object keys unordered, arrays ordered.
                if expected != actual {
                    inspection.observe(
                        FindingStatus::Drifted,
                        format!(
                            "field {} in {}: golden={expected} target={actual}",
                            probe.key, probe.file
                        ),
                        Some(format!(
                            "Set {} in {} to the golden-path value",
                            probe.key, probe.file
                        )),
                    );
                }
            }
        }
    }
}

fn read_json(fs: &dyn Fs, root: &Path, path: &Path) -> Result<Value, String> {
    let text = fs
        .read_text(root, path)
        .map_err(|err| format!("unreadable: {err}"))?;
    serde_json::from_str(&text).map_err(|err| format!("invalid JSON: {err}"))
}

/// Evaluates one governed surface. Returns the finding plus any active
/// exceptions that suppressed comparison.
pub fn check_surface(
    fs: &dyn Fs,
    scanner: &dyn ExceptionScanner,
    surface: &GovernedSurface,
    golden_root: &Path,
    target_root: &Path,
    exception_cutoff: Option<&str>,
) -> (Finding, Vec<Exception>) {
    let exceptions = active_exceptions(
        scanner.scan(fs, target_root, surface),
        exception_cutoff,
    );
    if !exceptions.is_empty() {
        let details = exceptions
            .iter()
            .map(|ex| {
                format!(
                    "exception at {}:{}: {}",
                    ex.file, ex.line, ex.justification
                )
            })
            .collect();
        let finding = Finding {
            surface_id: surface.id.clone(),
            name: surface.name.clone(),
            status: FindingStatus::Exception,
            severity: surface.severity,
            details,
            remediation: Vec::new(),
        };
        return (finding, exceptions);
    }

    let mut inspection = SurfaceInspection::new();
    inspect_paths(fs, surface, golden_root, target_root, &mut inspection);
    inspect_fields(fs, surface, golden_root, target_root, &mut inspection);

    let finding = Finding {
        surface_id: surface.id.clone(),
        name: surface.name.clone(),
        status: inspection.status,
        severity: surface.severity,
        details: inspection.details,
        remediation: inspection.remediation,
    };
    (finding, Vec::new())
}

/// Runs every governed surface and assembles the drift report.
pub fn run_drift(
    fs: &dyn Fs,
    scanner: &dyn ExceptionScanner,
    manifest: &PolicyManifest,
    golden_root: &Path,
    target_root: &Path,
    options: &DriftOptions,
) -> DriftReport {
    let mut findings = Vec::new();
    let mut exceptions = Vec::new();
    for surface in &manifest.governed_surfaces {
        let (finding, surface_exceptions) = check_surface(
            fs,
            scanner,
            surface,
            golden_root,
            target_root,
            options.exception_cutoff.as_deref(),
        );
        findings.push(finding);
        exceptions.extend(surface_exceptions);
    }
    let summary = DriftSummary::from_findings(&findings);
    DriftReport {
        schema: DRIFT_REPORT_SCHEMA.to_string(),
        timestamp: options.timestamp.clone(),
        source_version: options.source_version.clone(),
        target_path: target_root.display().to_string(),
        compliance_score: compliance_score(&summary),
        findings,
        exceptions,
        summary,
    }
}

/// Degraded report for a missing or unparseable policy manifest: one
/// synthetic finding, score zero, still machine-readable.
#[must_use]
pub fn config_error_drift_report(
    target_root: &Path,
    options: &DriftOptions,
    detail: &str,
) -> DriftReport {
    let finding = Finding {
        surface_id: SurfaceId::parse("POLICY-CONFIG")
            .unwrap_or_else(|_| unreachable!("static surface id literal is valid")),
        name: "Policy manifest".to_string(),
        status: FindingStatus::Missing,
        severity: SurfaceSeverity::SecurityCritical,
        details: vec![format!("policy_config_invalid: {detail}")],
        remediation: vec!["Restore a valid golden-path policy manifest".to_string()],
    };
    let findings = vec![finding];
    let summary = DriftSummary::from_findings(&findings);
    DriftReport {
        schema: DRIFT_REPORT_SCHEMA.to_string(),
        timestamp: options.timestamp.clone(),
        source_version: options.source_version.clone(),
        target_path: target_root.display().to_string(),
        compliance_score: compliance_score(&summary),
        findings,
        exceptions: Vec::new(),
        summary,
    }
}
