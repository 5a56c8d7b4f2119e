//! `pdd deploy`: scan a checkout, merge into the ledger, sync tickets.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use pdd_core::config::{RepoConfig, ServiceConfig};
use pdd_core::deploy::{DeployOptions, DeployReport, deploy};
use pdd_core::scan::{CommandScanner, Scanner, SnapshotScanner};
use pdd_core::storage::FsLedgerStore;
use pdd_core::tickets::TrackerTickets;
use pdd_core::vcs::{RepoInfo, Vcs};
use serde::Serialize;
use tracing::info;

use super::LedgerArgs;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use crate::tracker::{GiteaVcs, GithubVcs, TrackerKind};

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Checked-out source tree; `.0nepdd.yml` is read from here.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,

    /// Read puzzles from a scanner JSON file instead of running the scanner.
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Default branch, used in puzzle links when the head commit is unknown.
    #[arg(long, value_name = "NAME", default_value = "master")]
    pub branch: String,

    /// Head commit hash for puzzle links.
    #[arg(long, value_name = "SHA")]
    pub head: Option<String>,

    /// Mark puzzles missing from this scan as gone and close their tickets.
    #[arg(long)]
    pub retire_missing: bool,
}

/// `pdd deploy` result.
#[derive(Debug, Serialize)]
pub struct DeployOutput {
    pub tracker: &'static str,
    pub repo: String,
    pub ledger: PathBuf,
    #[serde(flatten)]
    pub report: DeployReport,
}

pub fn run_deploy(args: &DeployArgs, config: &ServiceConfig, output: OutputMode) -> Result<()> {
    let store = args.ledger.store(config);
    let _lock = args.ledger.lock(&store)?;

    let scanner = scanner(args, config);
    let options = DeployOptions {
        retire_missing: args.retire_missing,
    };
    let repo_config = RepoConfig::load(&args.source);
    let mut repo = RepoInfo::new(args.ledger.repo.clone(), args.branch.clone());
    if let Some(head) = &args.head {
        repo = repo.with_head(head.clone());
    }

    let report = match args.ledger.tracker {
        TrackerKind::Gitea => {
            let host = config
                .gitea
                .host
                .as_deref()
                .context("gitea host is not configured; set [gitea] host in config.toml")?;
            let vcs = GiteaVcs::new(host, config.gitea.token.as_deref(), repo, repo_config);
            run_with(vcs, scanner.as_ref(), &store, options)?
        }
        TrackerKind::Github => {
            let vcs = GithubVcs::new(
                &config.github.api_url,
                &config.github.web_url,
                config.github.token.as_deref(),
                repo,
                repo_config,
            );
            run_with(vcs, scanner.as_ref(), &store, options)?
        }
    };

    let result = DeployOutput {
        tracker: args.ledger.tracker.as_str(),
        repo: args.ledger.repo.clone(),
        ledger: store.path().to_path_buf(),
        report,
    };
    render_mode(output, &result, write_text, write_pretty)
}

fn scanner(args: &DeployArgs, config: &ServiceConfig) -> Box<dyn Scanner> {
    match &args.snapshot {
        Some(path) => Box::new(SnapshotScanner::new(path)),
        None => Box::new(CommandScanner::new(
            config.scanner.command.clone(),
            &args.source,
        )),
    }
}

fn run_with<V: Vcs>(
    vcs: V,
    scanner: &dyn Scanner,
    store: &FsLedgerStore,
    options: DeployOptions,
) -> Result<DeployReport> {
    info!(tracker = vcs.name(), repo = %vcs.repo().full_name, "deploy started");
    let tickets = TrackerTickets::new(vcs);
    Ok(deploy(scanner, store, &tickets, options)?)
}

fn write_text(result: &DeployOutput, w: &mut dyn Write) -> io::Result<()> {
    let report = &result.report;
    writeln!(
        w,
        "{}\t{}\tadded={}\tretired={}\topened={}\tclosed={}",
        result.tracker,
        result.repo,
        report.added.len(),
        report.retired.len(),
        report.opened.len(),
        report.closed.len()
    )
}

fn write_pretty(result: &DeployOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("pdd deploy {} {}", result.tracker, result.repo))?;
    pretty_kv(w, "Ledger", result.ledger.display().to_string())?;
    for (label, ids) in [
        ("Added", &result.report.added),
        ("Retired", &result.report.retired),
        ("Opened", &result.report.opened),
        ("Closed", &result.report.closed),
    ] {
        let value = if ids.is_empty() {
            "-".to_string()
        } else {
            ids.join(", ")
        };
        pretty_kv(w, label, value)?;
    }
    Ok(())
}
