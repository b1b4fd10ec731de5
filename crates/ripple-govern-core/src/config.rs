// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Loading and validation of the two declarative inputs: the policy
//! manifest and the conformance rubric.

use std::collections::BTreeSet;
use std::path::Path;

use ripple_govern_model::{PolicyManifest, Rubric};

use crate::ports::Fs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}

fn read(fs: &dyn Fs, root: &Path, path: &Path) -> Result<String, ConfigError> {
    if !fs.exists(root, path) {
        return Err(ConfigError(format!("no such file: {}", path.display())));
    }
    fs.read_text(root, path)
        .map_err(|err| ConfigError(err.to_string()))
}

pub fn load_policy_manifest(
    fs: &dyn Fs,
    root: &Path,
    path: &Path,
) -> Result<PolicyManifest, ConfigError> {
    let text = read(fs, root, path)?;
    let manifest: PolicyManifest = serde_json::from_str(&text)
        .map_err(|err| ConfigError(format!("{}: {err}", path.display())))?;
    validate_policy_manifest(&manifest)?;
    Ok(manifest)
}

pub fn validate_policy_manifest(manifest: &PolicyManifest) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for surface in &manifest.governed_surfaces {
        if !seen.insert(surface.id.as_str().to_string()) {
            return Err(ConfigError(format!(
                "duplicate governed surface id {}",
                surface.id
            )));
        }
        if surface.paths.is_empty() && surface.fields.is_empty() {
            return Err(ConfigError(format!(
                "surface {} governs no paths and no fields",
                surface.id
            )));
        }
    }
    if manifest.compliance_targets.minimum_score > 100 {
        return Err(ConfigError(format!(
            "complianceTargets.minimumScore must be <= 100, got {}",
            manifest.compliance_targets.minimum_score
        )));
    }
    Ok(())
}

pub fn load_rubric(fs: &dyn Fs, root: &Path, path: &Path) -> Result<Rubric, ConfigError> {
    let text = read(fs, root, path)?;
    let rubric: Rubric = serde_json::from_str(&text)
        .map_err(|err| ConfigError(format!("{}: {err}", path.display())))?;
    validate_rubric(&rubric)?;
    Ok(rubric)
}

pub fn validate_rubric(rubric: &Rubric) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for category in &rubric.categories {
        for check in &category.checks {
            if !seen.insert(check.id.clone()) {
                return Err(ConfigError(format!("duplicate rubric check id {}", check.id)));
            }
            if check.points == 0 {
                return Err(ConfigError(format!(
                    "rubric check {} must be worth at least one point",
                    check.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RealFs;
    use std::fs as stdfs;

    #[test]
    fn valid_manifest_loads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("policy.json");
        stdfs::write(
            &path,
            r#"{
                "governedSurfaces": [{
                    "id": "FLEET-SURF-001",
                    "name": "Lint configuration",
                    "severity": "standards-required",
                    "strategy": "sync",
                    "paths": ["eslint.config.js"]
                }],
                "complianceTargets": {"minimumScore": 80}
            }"#,
        )
        .expect("write");
        let manifest =
            load_policy_manifest(&RealFs, dir.path(), Path::new("policy.json")).expect("load");
        assert_eq!(manifest.governed_surfaces.len(), 1);
        assert_eq!(manifest.compliance_targets.minimum_score, 80);
    }

    #[test]
    fn duplicate_surface_ids_are_rejected() {
        let raw = r#"{
            "governedSurfaces": [
                {"id": "A-1", "name": "a", "severity": "advisory", "strategy": "sync", "paths": ["x"]},
                {"id": "A-1", "name": "b", "severity": "advisory", "strategy": "sync", "paths": ["y"]}
            ],
            "complianceTargets": {"minimumScore": 80}
        }"#;
        let manifest: PolicyManifest = serde_json::from_str(raw).expect("parse");
        assert!(validate_policy_manifest(&manifest).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_policy_manifest(&RealFs, dir.path(), Path::new("absent.json"))
            .expect_err("must fail");
        assert!(err.0.contains("no such file"));
    }

    #[test]
    fn zero_point_rubric_check_is_rejected() {
        let raw = r#"{
            "passingScore": 10,
            "categories": [{"id": "c", "name": "C", "checks": [
                {"id": "x", "type": "file-exists", "path": "README.md", "points": 0, "description": "d"}
            ]}]
        }"#;
        let rubric: Rubric = serde_json::from_str(raw).expect("parse");
        assert!(validate_rubric(&rubric).is_err());
    }
}
