// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};

use crate::ports::{AdapterError, CommandCapture, Fs, ProcessRunner};

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[derive(Debug, Default)]
pub struct RealFs;

impl Fs for RealFs {
    fn read_text(&self, root: &Path, path: &Path) -> Result<String, AdapterError> {
        let target = resolve(root, path);
        let text = fs::read_to_string(&target).map_err(|err| AdapterError::Io {
            op: "read_to_string",
            path: target,
            detail: err.to_string(),
        })?;
        Ok(normalize_line_endings(&text))
    }

    fn read_bytes(&self, root: &Path, path: &Path) -> Result<Vec<u8>, AdapterError> {
        let target = resolve(root, path);
        fs::read(&target).map_err(|err| AdapterError::Io {
            op: "read",
            path: target,
            detail: err.to_string(),
        })
    }

    fn exists(&self, root: &Path, path: &Path) -> bool {
        resolve(root, path).is_file()
    }
}

#[derive(Debug, Default)]
pub struct RealProcessRunner;

impl ProcessRunner for RealProcessRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
    ) -> Result<CommandCapture, AdapterError> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|err| AdapterError::Io {
                op: "spawn",
                path: cwd.to_path_buf(),
                detail: format!("{program}: {err}"),
            })?;
        Ok(CommandCapture {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn line_endings_normalize_to_lf() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
