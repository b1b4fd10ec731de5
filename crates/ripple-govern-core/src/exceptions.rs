// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Detection of in-repo policy overrides.
//!
//! An exception is one comment line inside a governed file:
//!
//! ```text
//! // golden-path-exception: FLEET-SURF-001 2026-05-01 -- upstream bug #482
//! ```
//!
//! The date token is optional. Expiry is the caller's concern; the scanner
//! only reports what it found and where.

use std::path::Path;

use regex::Regex;

use ripple_govern_model::{Exception, GovernedSurface, SurfaceId};

use crate::ports::Fs;

pub trait ExceptionScanner {
    fn scan(&self, fs: &dyn Fs, target_root: &Path, surface: &GovernedSurface) -> Vec<Exception>;
}

pub struct CommentScanner {
    marker: Regex,
}

impl Default for CommentScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentScanner {
    #[must_use]
    pub fn new() -> Self {
        let marker = Regex::new(
            r"golden-path-exception:\s*(?P<id>[A-Z0-9][A-Z0-9-]*)(?:\s+(?P<date>\d{4}-\d{2}-\d{2}))?(?:\s*--\s*(?P<why>.+))?",
        )
        .unwrap_or_else(|_| unreachable!("exception marker regex is a tested literal"));
        Self { marker }
    }

    fn scan_text(&self, surface_id: &SurfaceId, file: &str, text: &str) -> Vec<Exception> {
        let mut out = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let Some(caps) = self.marker.captures(line) else {
                continue;
            };
            let id = caps.name("id").map(|m| m.as_str()).unwrap_or_default();
            if id != surface_id.as_str() {
                continue;
            }
            let justification = caps
                .name("why")
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "no justification recorded".to_string());
            out.push(Exception {
                surface_id: surface_id.clone(),
                justification,
                file: file.to_string(),
                line: (index + 1) as u32,
                noted_on: caps.name("date").map(|m| m.as_str().to_string()),
            });
        }
        out
    }
}

impl ExceptionScanner for CommentScanner {
    fn scan(&self, fs: &dyn Fs, target_root: &Path, surface: &GovernedSurface) -> Vec<Exception> {
        let mut out = Vec::new();
        for rel in &surface.paths {
            let path = Path::new(rel);
            if !fs.exists(target_root, path) {
                continue;
            }
            // Unreadable or binary files fail open: no override detected.
            let Ok(text) = fs.read_text(target_root, path) else {
                continue;
            };
            out.extend(self.scan_text(&surface.id, rel, &text));
        }
        out
    }
}

/// Keeps exceptions that have not expired. `cutoff` is an ISO `YYYY-MM-DD`
/// date; ISO dates order lexically, so no clock is needed here. Undated
/// exceptions never expire locally.
#[must_use]
pub fn active_exceptions(exceptions: Vec<Exception>, cutoff: Option<&str>) -> Vec<Exception> {
    match cutoff {
        None => exceptions,
        Some(cutoff) => exceptions
            .into_iter()
            .filter(|ex| match ex.noted_on.as_deref() {
                None => true,
                Some(date) => date >= cutoff,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_govern_model::{SurfaceSeverity, SyncStrategy};

    fn surface(id: &str, paths: &[&str]) -> GovernedSurface {
        GovernedSurface {
            id: SurfaceId::parse(id).expect("id"),
            name: id.to_string(),
            severity: SurfaceSeverity::StandardsRequired,
            strategy: SyncStrategy::Sync,
            paths: paths.iter().map(|p| (*p).to_string()).collect(),
            fields: Vec::new(),
            checksum_validation: false,
        }
    }

    struct MapFs(std::collections::BTreeMap<String, String>);

    impl Fs for MapFs {
        fn read_text(
            &self,
            _root: &Path,
            path: &Path,
        ) -> Result<String, crate::ports::AdapterError> {
            self.0
                .get(&path.display().to_string())
                .cloned()
                .ok_or(crate::ports::AdapterError::Io {
                    op: "read_to_string",
                    path: path.to_path_buf(),
                    detail: "missing".to_string(),
                })
        }

        fn read_bytes(
            &self,
            root: &Path,
            path: &Path,
        ) -> Result<Vec<u8>, crate::ports::AdapterError> {
            self.read_text(root, path).map(String::into_bytes)
        }

        fn exists(&self, _root: &Path, path: &Path) -> bool {
            self.0.contains_key(&path.display().to_string())
        }
    }

    #[test]
    fn finds_marker_with_date_and_justification() {
        let fs = MapFs(std::collections::BTreeMap::from([(
            "eslint.config.js".to_string(),
            "// golden-path-exception: FLEET-SURF-001 2026-05-01 -- upstream bug #482\nexport default {};\n"
                .to_string(),
        )]));
        let scanner = CommentScanner::new();
        let found = scanner.scan(&fs, Path::new("/repo"), &surface("FLEET-SURF-001", &["eslint.config.js"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 1);
        assert_eq!(found[0].noted_on.as_deref(), Some("2026-05-01"));
        assert_eq!(found[0].justification, "upstream bug #482");
    }

    #[test]
    fn marker_for_other_surface_is_ignored() {
        let fs = MapFs(std::collections::BTreeMap::from([(
            "a.js".to_string(),
            "// golden-path-exception: OTHER-SURF-002 -- not ours\n".to_string(),
        )]));
        let scanner = CommentScanner::new();
        let found = scanner.scan(&fs, Path::new("/repo"), &surface("FLEET-SURF-001", &["a.js"]));
        assert!(found.is_empty());
    }

    #[test]
    fn undated_marker_has_fallback_justification() {
        let fs = MapFs(std::collections::BTreeMap::from([(
            "a.js".to_string(),
            "# golden-path-exception: FLEET-SURF-001\n".to_string(),
        )]));
        let scanner = CommentScanner::new();
        let found = scanner.scan(&fs, Path::new("/repo"), &surface("FLEET-SURF-001", &["a.js"]));
        assert_eq!(found.len(), 1);
        assert!(found[0].noted_on.is_none());
        assert_eq!(found[0].justification, "no justification recorded");
    }

    #[test]
    fn cutoff_filters_dated_exceptions_only() {
        let mk = |date: Option<&str>| Exception {
            surface_id: SurfaceId::parse("FLEET-SURF-001").expect("id"),
            justification: "x".to_string(),
            file: "a.js".to_string(),
            line: 1,
            noted_on: date.map(str::to_string),
        };
        let kept = active_exceptions(
            vec![mk(Some("2026-01-01")), mk(Some("2026-06-01")), mk(None)],
            Some("2026-05-08"),
        );
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|ex| ex.noted_on.as_deref() != Some("2026-01-01")));
    }
}
