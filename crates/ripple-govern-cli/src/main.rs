// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;

use chrono::{Days, SecondsFormat, Utc};
use clap::Parser;

use ripple_govern_core::{
    aggregate, config_error_conformance_report, config_error_drift_report, diff_report,
    exit_code_for_drift, exit_code_for_fleet, exit_code_for_status, fleet_entry,
    load_policy_manifest, load_rubric, parse_contract, render_conformance_text,
    render_contract_text, render_drift_text, render_fleet_text, render_json, run_drift,
    score_rubric, unreachable_entry, CommentScanner, DriftOptions, ExitCode, ProcessRunner,
    RealFs, RealProcessRunner,
};
use ripple_govern_core::logging::{render_log, LogFormat, LogLevel, LogRecord};
use ripple_govern_model::{
    conformance_report_json_schema, contract_diff_report_json_schema, drift_report_json_schema,
    fleet_report_json_schema, PolicyManifest, DEFAULT_EXCEPTION_VALIDITY_DAYS,
};

use crate::cli::{Cli, Command, SchemaKind};

const DEFAULT_POLICY_FILE: &str = "golden-path.policy.json";
const DEFAULT_RUBRIC_FILE: &str = "conformance.rubric.json";
const DEFAULT_CONTRACT_PATH: &str = "openapi.json";

struct Console {
    verbose: bool,
    quiet: bool,
}

impl Console {
    fn log(&self, level: LogLevel, code: &str, message: &str) {
        if self.quiet {
            return;
        }
        if !self.verbose && level == LogLevel::Debug {
            return;
        }
        let record = LogRecord::new(level, code, message);
        if let Ok(line) = render_log(&record, LogFormat::Human) {
            eprintln!("{line}");
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn exception_cutoff(validity_days: u32) -> Option<String> {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(u64::from(validity_days)))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn resolve_target(target: Option<PathBuf>) -> Result<PathBuf, String> {
    match target {
        Some(path) => Ok(path),
        None => std::env::current_dir().map_err(|err| err.to_string()),
    }
}

fn git_short_rev(root: &Path) -> Option<String> {
    let capture = RealProcessRunner
        .run("git", &["rev-parse", "--short", "HEAD"], root)
        .ok()?;
    if capture.status != 0 {
        return None;
    }
    let rev = capture.stdout.trim().to_string();
    if rev.is_empty() {
        None
    } else {
        Some(rev)
    }
}

fn emit(payload: &str, out: Option<&Path>) -> Result<(), String> {
    match out {
        Some(path) => fs::write(path, payload).map_err(|err| {
            format!("could not write {}: {err}", path.display())
        }),
        None => {
            println!("{payload}");
            Ok(())
        }
    }
}

fn emit_report<T: serde::Serialize>(
    report: &T,
    text: String,
    json: bool,
    out: Option<&Path>,
) -> Result<(), String> {
    let payload = if json || out.is_some() {
        render_json(report)?
    } else {
        text
    };
    emit(&payload, out)
}

fn drift_options(
    manifest: Option<&PolicyManifest>,
    golden_root: &Path,
    source_version: Option<String>,
    console: &Console,
) -> DriftOptions {
    let source_version = source_version
        .or_else(|| git_short_rev(golden_root))
        .unwrap_or_else(|| "unknown".to_string());
    let validity_days = manifest
        .map(|m| m.compliance_targets.exception_validity_days)
        .unwrap_or(DEFAULT_EXCEPTION_VALIDITY_DAYS);
    let cutoff = exception_cutoff(validity_days);
    console.log(
        LogLevel::Debug,
        "DRIFT_OPTIONS",
        &format!("source_version={source_version} exception_cutoff={cutoff:?}"),
    );
    DriftOptions {
        source_version,
        timestamp: now_rfc3339(),
        exception_cutoff: cutoff,
    }
}

fn run_drift_command(
    golden_root: PathBuf,
    target: Option<PathBuf>,
    policy: Option<PathBuf>,
    source_version: Option<String>,
    json: bool,
    out: Option<PathBuf>,
    console: &Console,
) -> Result<ExitCode, String> {
    let target = resolve_target(target)?;
    let policy_path = policy.unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_FILE));
    let report = match load_policy_manifest(&RealFs, &golden_root, &policy_path) {
        Ok(manifest) => {
            let options = drift_options(Some(&manifest), &golden_root, source_version, console);
            console.log(
                LogLevel::Info,
                "DRIFT_RUN",
                &format!("scanning {} surfaces", manifest.governed_surfaces.len()),
            );
            run_drift(
                &RealFs,
                &CommentScanner::new(),
                &manifest,
                &golden_root,
                &target,
                &options,
            )
        }
        Err(err) => {
            console.log(LogLevel::Error, "POLICY_CONFIG", &err.to_string());
            let options = drift_options(None, &golden_root, source_version, console);
            config_error_drift_report(&target, &options, &err.to_string())
        }
    };
    emit_report(&report, render_drift_text(&report), json, out.as_deref())?;
    Ok(exit_code_for_drift(&report))
}

fn run_conformance_command(
    target: Option<PathBuf>,
    rubric: Option<PathBuf>,
    json: bool,
    out: Option<PathBuf>,
    console: &Console,
) -> Result<ExitCode, String> {
    let target = resolve_target(target)?;
    let rubric_path = rubric.unwrap_or_else(|| PathBuf::from(DEFAULT_RUBRIC_FILE));
    let timestamp = now_rfc3339();
    let report = match load_rubric(&RealFs, &target, &rubric_path) {
        Ok(rubric) => {
            console.log(
                LogLevel::Info,
                "CONFORMANCE_RUN",
                &format!("{} categories", rubric.categories.len()),
            );
            score_rubric(&RealFs, &rubric, &target, &timestamp)
        }
        Err(err) => {
            console.log(LogLevel::Error, "RUBRIC_CONFIG", &err.to_string());
            config_error_conformance_report(&target, &timestamp, &err.to_string())
        }
    };
    emit_report(
        &report,
        render_conformance_text(&report),
        json,
        out.as_deref(),
    )?;
    Ok(exit_code_for_status(report.status))
}

fn load_baseline_document(
    baseline: Option<PathBuf>,
    base_ref: Option<&str>,
    contract_path: &str,
    repo: &Path,
    console: &Console,
) -> Result<(String, Option<serde_json::Value>), String> {
    if let Some(path) = baseline {
        let text = fs::read_to_string(&path)
            .map_err(|err| format!("could not read {}: {err}", path.display()))?;
        let doc = parse_contract(&text)?;
        return Ok((path.display().to_string(), Some(doc)));
    }
    let Some(base_ref) = base_ref else {
        return Err("either --baseline or --base-ref is required".to_string());
    };
    let spec = format!("{base_ref}:{contract_path}");
    match RealProcessRunner.run("git", &["show", &spec], repo) {
        Ok(capture) if capture.status == 0 => {
            let doc = parse_contract(&capture.stdout)?;
            Ok((base_ref.to_string(), Some(doc)))
        }
        Ok(capture) => {
            // First release: nothing to break.
            console.log(
                LogLevel::Warn,
                "BASELINE",
                &format!("git show {spec} failed: {}", capture.stderr.trim()),
            );
            Ok((base_ref.to_string(), None))
        }
        Err(err) => {
            console.log(LogLevel::Warn, "BASELINE", &err.to_string());
            Ok((base_ref.to_string(), None))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_api_diff_command(
    baseline: Option<PathBuf>,
    base_ref: Option<String>,
    current: PathBuf,
    contract_path: Option<String>,
    target: Option<PathBuf>,
    json: bool,
    out: Option<PathBuf>,
    console: &Console,
) -> Result<ExitCode, String> {
    if baseline.is_none() && base_ref.is_none() {
        console.log(
            LogLevel::Error,
            "USAGE",
            "either --baseline or --base-ref is required",
        );
        return Ok(ExitCode::Usage);
    }
    let repo = resolve_target(target)?;
    let contract_path = contract_path.unwrap_or_else(|| DEFAULT_CONTRACT_PATH.to_string());
    let current_text = fs::read_to_string(&current)
        .map_err(|err| format!("could not read {}: {err}", current.display()))?;
    let current_doc = parse_contract(&current_text)?;
    let (base_ref, baseline_doc) = load_baseline_document(
        baseline,
        base_ref.as_deref(),
        &contract_path,
        &repo,
        console,
    )?;
    let report = diff_report(
        baseline_doc.as_ref(),
        &current_doc,
        &base_ref,
        &now_rfc3339(),
    );
    console.log(
        LogLevel::Info,
        "API_DIFF",
        &format!(
            "breaking={} non_breaking={}",
            report.breaking, report.non_breaking
        ),
    );
    emit_report(&report, render_contract_text(&report), json, out.as_deref())?;
    Ok(exit_code_for_status(report.status))
}

fn run_fleet_command(
    golden_root: PathBuf,
    repos: Vec<PathBuf>,
    policy: Option<PathBuf>,
    source_version: Option<String>,
    json: bool,
    out: Option<PathBuf>,
    console: &Console,
) -> Result<ExitCode, String> {
    let policy_path = policy.unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_FILE));
    let manifest = match load_policy_manifest(&RealFs, &golden_root, &policy_path) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            console.log(LogLevel::Error, "POLICY_CONFIG", &err.to_string());
            None
        }
    };
    let options = drift_options(manifest.as_ref(), &golden_root, source_version, console);

    let mut entries = Vec::new();
    for repo in &repos {
        let label = repo.display().to_string();
        let Some(manifest) = manifest.as_ref() else {
            entries.push(unreachable_entry(&label, "policy_config_invalid"));
            continue;
        };
        if !repo.is_dir() {
            console.log(LogLevel::Warn, "FLEET_REPO", &format!("{label}: not a directory"));
            entries.push(unreachable_entry(&label, "not a directory"));
            continue;
        }
        let report = run_drift(
            &RealFs,
            &CommentScanner::new(),
            manifest,
            &golden_root,
            repo,
            &options,
        );
        entries.push(fleet_entry(&label, &report, manifest.compliance_targets.minimum_score));
    }

    let report = aggregate(entries, &options.source_version, &options.timestamp);
    console.log(
        LogLevel::Info,
        "FLEET_RUN",
        &format!("aggregated {} repositories", report.summary.repo_count),
    );
    emit_report(&report, render_fleet_text(&report), json, out.as_deref())?;
    Ok(exit_code_for_fleet(&report))
}

fn run_schema_command(kind: SchemaKind, out: Option<PathBuf>) -> Result<ExitCode, String> {
    let schema = match kind {
        SchemaKind::Drift => drift_report_json_schema(),
        SchemaKind::Conformance => conformance_report_json_schema(),
        SchemaKind::ApiBreaking => contract_diff_report_json_schema(),
        SchemaKind::Fleet => fleet_report_json_schema(),
    };
    let payload = render_json(&schema)?;
    emit(&payload, out.as_deref())?;
    Ok(ExitCode::Success)
}

fn dispatch(cli: Cli, console: &Console) -> Result<ExitCode, String> {
    match cli.command {
        Command::Drift {
            golden_root,
            target,
            policy,
            source_version,
            json,
            out,
        } => run_drift_command(golden_root, target, policy, source_version, json, out, console),
        Command::Conformance {
            target,
            rubric,
            json,
            out,
        } => run_conformance_command(target, rubric, json, out, console),
        Command::ApiDiff {
            baseline,
            base_ref,
            current,
            contract_path,
            target,
            json,
            out,
        } => run_api_diff_command(
            baseline,
            base_ref,
            current,
            contract_path,
            target,
            json,
            out,
            console,
        ),
        Command::Fleet {
            golden_root,
            repos,
            policy,
            source_version,
            json,
            out,
        } => run_fleet_command(golden_root, repos, policy, source_version, json, out, console),
        Command::Schema { kind, out } => run_schema_command(kind, out),
    }
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    let console = Console {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    match dispatch(cli, &console) {
        Ok(code) => ProcessExitCode::from(code.as_i32() as u8),
        Err(message) => {
            console.log(LogLevel::Error, "ENGINE", &message);
            ProcessExitCode::from(ExitCode::EngineError.as_i32() as u8)
        }
    }
}
