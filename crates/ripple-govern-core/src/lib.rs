// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Golden-path governance engine: drift comparator, rubric scorer, OpenAPI
//! contract differ, and fleet aggregator.
//!
//! Boundary: everything here is synchronous and side-effect-free apart from
//! reads through the [`ports::Fs`] seam. Subprocess and network effects
//! (git baseline retrieval) belong to the CLI layer.

pub mod adapters;
pub mod comparator;
pub mod config;
pub mod contract;
pub mod exceptions;
pub mod fleet;
pub mod logging;
pub mod ports;
pub mod report;
pub mod rubric;

pub use adapters::{normalize_line_endings, sha256_hex, RealFs, RealProcessRunner};
pub use comparator::{check_surface, config_error_drift_report, run_drift, DriftOptions};
pub use config::{load_policy_manifest, load_rubric, ConfigError};
pub use contract::{detect_changes, diff_report, extract_operations, parse_contract};
pub use exceptions::{active_exceptions, CommentScanner, ExceptionScanner};
pub use fleet::{aggregate, fleet_entry, unreachable_entry};
pub use ports::{AdapterError, CommandCapture, Fs, ProcessRunner};
pub use report::{
    exit_code_for_drift, exit_code_for_fleet, exit_code_for_status, render_conformance_text,
    render_contract_text, render_drift_text, render_fleet_text, render_json, ExitCode,
};
pub use rubric::{config_error_conformance_report, run_check, score_rubric};

pub const CRATE_NAME: &str = "ripple-govern-core";
