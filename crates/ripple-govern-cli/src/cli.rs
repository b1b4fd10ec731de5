// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ripple-govern", version, disable_help_subcommand = true)]
#[command(about = "Golden-path governance engine")]
pub struct Cli {
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare a target repository against the golden path.
    Drift {
        #[arg(long)]
        golden_root: PathBuf,
        /// Target repository; defaults to the current directory.
        #[arg(long)]
        target: Option<PathBuf>,
        /// Policy manifest; defaults to golden-path.policy.json in the golden root.
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Golden-path revision recorded in the report; defaults to `git rev-parse`.
        #[arg(long)]
        source_version: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Score a repository against the weighted conformance rubric.
    Conformance {
        #[arg(long)]
        target: Option<PathBuf>,
        /// Rubric document; defaults to conformance.rubric.json in the target.
        #[arg(long)]
        rubric: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Diff two OpenAPI documents and classify breaking changes.
    ApiDiff {
        /// Baseline contract file. Mutually exclusive with --base-ref.
        #[arg(long, conflicts_with = "base_ref")]
        baseline: Option<PathBuf>,
        /// Git ref to read the baseline contract from (via `git show`).
        #[arg(long)]
        base_ref: Option<String>,
        /// Current contract file (JSON or YAML).
        #[arg(long)]
        current: PathBuf,
        /// Repo-relative contract path used with --base-ref.
        #[arg(long)]
        contract_path: Option<String>,
        /// Repository to run `git show` in; defaults to the current directory.
        #[arg(long)]
        target: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Aggregate drift reports for a set of repositories.
    Fleet {
        #[arg(long)]
        golden_root: PathBuf,
        /// Repositories to scan, one path per flag occurrence.
        #[arg(long = "repo", required = true)]
        repos: Vec<PathBuf>,
        #[arg(long)]
        policy: Option<PathBuf>,
        #[arg(long)]
        source_version: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the JSON schema of a report kind.
    Schema {
        #[arg(value_enum)]
        kind: SchemaKind,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SchemaKind {
    Drift,
    Conformance,
    ApiBreaking,
    Fleet,
}
