//! `pdd join`: merge a scanner snapshot into the ledger without touching
//! the tracker.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pdd_core::config::ServiceConfig;
use pdd_core::deploy::{DeployOptions, merge};
use pdd_core::scan::SnapshotScanner;
use serde::Serialize;
use tracing::info;

use super::LedgerArgs;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct JoinArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Scanner output (JSON array of puzzles).
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Mark puzzles missing from the snapshot as gone.
    #[arg(long)]
    pub retire_missing: bool,
}

#[derive(Debug, Serialize)]
pub struct JoinOutput {
    pub tracker: &'static str,
    pub repo: String,
    pub ledger: PathBuf,
    pub entries: usize,
    pub added: Vec<String>,
    pub retired: Vec<String>,
}

pub fn run_join(args: &JoinArgs, config: &ServiceConfig, output: OutputMode) -> Result<()> {
    let store = args.ledger.store(config);
    let _lock = args.ledger.lock(&store)?;

    let options = DeployOptions {
        retire_missing: args.retire_missing,
    };
    let (ledger, report) = merge(&SnapshotScanner::new(&args.snapshot), &store, options)?;
    info!(
        ledger = %args.ledger.key(),
        added = report.added.len(),
        retired = report.retired.len(),
        "snapshot joined"
    );

    let result = JoinOutput {
        tracker: args.ledger.tracker.as_str(),
        repo: args.ledger.repo.clone(),
        ledger: store.path().to_path_buf(),
        entries: ledger.len(),
        added: report.added,
        retired: report.retired,
    };
    render_mode(output, &result, write_text, write_pretty)
}

fn write_text(result: &JoinOutput, w: &mut dyn Write) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\tentries={}\tadded={}\tretired={}",
        result.tracker,
        result.repo,
        result.entries,
        result.added.len(),
        result.retired.len()
    )
}

fn write_pretty(result: &JoinOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("pdd join {} {}", result.tracker, result.repo))?;
    pretty_kv(w, "Ledger", result.ledger.display().to_string())?;
    pretty_kv(w, "Entries", result.entries.to_string())?;
    pretty_kv(w, "Added", result.added.len().to_string())?;
    pretty_kv(w, "Retired", result.retired.len().to_string())
}
