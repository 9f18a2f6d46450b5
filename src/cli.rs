//! CLI argument parsing for the decision desk.
//!
//! The CLI is intentionally thin: each command triggers exactly one
//! end-to-end pipeline run, so the same core logic can sit under any
//! user-facing surface.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "reqdesk",
    version,
    about = "Look up requests in a tabular source and submit decisions",
    after_help = "Examples:\n  reqdesk show --config desk.json AB-12\n  reqdesk show --config desk.json --json AB-12\n  reqdesk decide --config desk.json AB-12 --approve\n  reqdesk decide --config desk.json AB-12 --reject --reason \"wrong amount\"\n  reqdesk decide --config desk.json AB-12 --approve --lines lines.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands, one pipeline run each.
#[derive(Subcommand, Debug)]
pub enum Command {
    Show(ShowArgs),
    Decide(DecideArgs),
}

/// Locate a request and render its payload table.
#[derive(Parser, Debug)]
#[command(about = "Locate a request and render its payload")]
pub struct ShowArgs {
    /// Pipeline configuration file (JSON)
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Identifier to search for
    pub term: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Collect a decision for a request and deliver it to its callback URL.
#[derive(Parser, Debug)]
#[command(about = "Decide on a request and submit the decision")]
pub struct DecideArgs {
    /// Pipeline configuration file (JSON)
    #[arg(long, value_name = "PATH")]
    pub config: PathBuf,

    /// Identifier to search for
    pub term: String,

    /// Approve the request
    #[arg(long, conflicts_with = "reject")]
    pub approve: bool,

    /// Reject the request (requires --reason)
    #[arg(long)]
    pub reject: bool,

    /// Free-text reason; required with --reject
    #[arg(long, default_value = "")]
    pub reason: String,

    /// JSON file with one {"outcome","note"} entry per payload row
    #[arg(long, value_name = "PATH")]
    pub lines: Option<PathBuf>,
}
