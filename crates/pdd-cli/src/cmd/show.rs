//! `pdd show`: list ledger entries with their ticket state.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use pdd_core::StoredPuzzle;
use pdd_core::config::ServiceConfig;
use pdd_core::storage::LedgerStore;
use serde::Serialize;

use super::LedgerArgs;
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub tracker: &'static str,
    pub repo: String,
    pub puzzles: Vec<StoredPuzzle>,
}

pub fn run_show(args: &ShowArgs, config: &ServiceConfig, output: OutputMode) -> Result<()> {
    let puzzles = args
        .ledger
        .store(config)
        .load()
        .map_err(pdd_core::Error::from)?;
    let result = ShowOutput {
        tracker: args.ledger.tracker.as_str(),
        repo: args.ledger.repo.clone(),
        puzzles,
    };
    render_mode(output, &result, write_text, write_pretty)
}

fn ticket_state(puzzle: &StoredPuzzle) -> String {
    match &puzzle.issue {
        None => "-".to_string(),
        Some(issue) if issue.is_closed() => format!("#{} closed", issue.number),
        Some(issue) => format!("#{} open", issue.number),
    }
}

const fn liveness(puzzle: &StoredPuzzle) -> &'static str {
    if puzzle.alive { "alive" } else { "gone" }
}

fn write_text(result: &ShowOutput, w: &mut dyn Write) -> io::Result<()> {
    for puzzle in &result.puzzles {
        writeln!(
            w,
            "{}\t{}\t{}\t{}:{}",
            puzzle.id,
            liveness(puzzle),
            ticket_state(puzzle),
            puzzle.file,
            puzzle.lines
        )?;
    }
    Ok(())
}

fn write_pretty(result: &ShowOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "{} {} ({} puzzles)",
            result.tracker,
            result.repo,
            result.puzzles.len()
        ),
    )?;
    for puzzle in &result.puzzles {
        pretty_kv(w, "Puzzle", &puzzle.id)?;
        pretty_kv(w, "State", liveness(puzzle))?;
        pretty_kv(w, "Ticket", ticket_state(puzzle))?;
        pretty_kv(w, "Location", format!("{}:{}", puzzle.file, puzzle.lines))?;
        pretty_kv(w, "Body", &puzzle.body)?;
        pretty_rule(w)?;
    }
    Ok(())
}
