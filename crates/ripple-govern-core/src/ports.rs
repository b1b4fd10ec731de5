// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Effect seams for the engine. The comparator, scorer, differ, and
//! aggregator only ever touch the host through these traits, so tests can
//! substitute in-memory fakes without process or network mocking.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
    PathViolation {
        path: PathBuf,
        detail: String,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { op, path, detail } => {
                write!(f, "{op} failed for {}: {detail}", path.display())
            }
            Self::PathViolation { path, detail } => {
                write!(f, "path violation at {}: {detail}", path.display())
            }
        }
    }
}

impl std::error::Error for AdapterError {}

/// Read-only filesystem access rooted at a repository.
pub trait Fs {
    fn read_text(&self, root: &Path, path: &Path) -> Result<String, AdapterError>;
    fn read_bytes(&self, root: &Path, path: &Path) -> Result<Vec<u8>, AdapterError>;
    fn exists(&self, root: &Path, path: &Path) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCapture {
    pub program: String,
    pub args: Vec<String>,
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Subprocess seam; the engine itself never spawns, only the CLI layer does
/// (git baseline retrieval stays outside the algorithmic core).
pub trait ProcessRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
    ) -> Result<CommandCapture, AdapterError>;
}
