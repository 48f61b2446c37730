// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

use crate::exec::ApprovalPolicy;

/// Command-line arguments for `pipewright`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipewright",
    version,
    about = "Run declarative build pipelines: parallel jobs, sequential stages.",
    long_about = None
)]
#[command(group(ArgGroup::new("approval").args(["approve", "deny"])))]
pub struct CliArgs {
    /// Path to the pipeline file (TOML, or YAML when it ends in .yaml/.yml).
    ///
    /// Default: `Pipeline.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Pipeline.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEWRIGHT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the execution plan, but don't run any task.
    #[arg(long)]
    pub dry_run: bool,

    /// Upper bound on jobs running at the same time.
    ///
    /// Overrides `[config].max_parallel_jobs`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_parallel_jobs: Option<u32>,

    /// Directory under which every job gets its own workspace.
    ///
    /// Overrides `[config].workspace_root`.
    #[arg(long, value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Answer every approval request with "yes" without prompting.
    #[arg(long)]
    pub approve: bool,

    /// Answer every approval request with "no" without prompting.
    #[arg(long)]
    pub deny: bool,
}

impl CliArgs {
    pub fn approval_policy(&self) -> ApprovalPolicy {
        if self.approve {
            ApprovalPolicy::AutoApprove
        } else if self.deny {
            ApprovalPolicy::AutoDeny
        } else {
            ApprovalPolicy::Prompt
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_and_deny_are_mutually_exclusive() {
        let res = CliArgs::try_parse_from(["pipewright", "--approve", "--deny"]);
        assert!(res.is_err());
    }

    #[test]
    fn approval_policy_defaults_to_prompt() {
        let args = CliArgs::try_parse_from(["pipewright"]).unwrap();
        assert_eq!(args.approval_policy(), ApprovalPolicy::Prompt);
        assert_eq!(args.config, "Pipeline.toml");

        let args = CliArgs::try_parse_from(["pipewright", "--deny"]).unwrap();
        assert_eq!(args.approval_policy(), ApprovalPolicy::AutoDeny);
    }

    #[test]
    fn zero_parallel_jobs_is_rejected() {
        let res = CliArgs::try_parse_from(["pipewright", "--max-parallel-jobs", "0"]);
        assert!(res.is_err());
    }
}
