#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tracker;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use pdd_core::config::{ServiceConfig, resolve_service_config};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pdd: keep tracker tickets in sync with puzzles in the code",
    long_about = None
)]
struct Cli {
    /// Service config file (default: <config dir>/pdd/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }

    fn service_config(&self) -> Result<ServiceConfig> {
        resolve_service_config(self.config.as_deref(), |name| env::var(name).ok())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Scan, merge and sync tickets",
        long_about = "Scan a checked-out source tree, merge its puzzles into the ledger, \
                      then open and close tracker tickets to match.",
        after_help = "EXAMPLES:\n    # Run the scanner in a checkout and sync GitHub issues\n    pdd deploy --tracker github --repo yegor256/pdd --source ./pdd --head $(git -C pdd rev-parse HEAD)\n\n    # Use a pre-computed snapshot and close tickets of removed puzzles\n    pdd deploy --tracker gitea --repo team/app --snapshot puzzles.json --retire-missing"
    )]
    Deploy(cmd::deploy::DeployArgs),

    #[command(
        about = "Merge a snapshot into the ledger",
        long_about = "Merge a scanner snapshot into the ledger without calling the tracker.",
        after_help = "EXAMPLES:\n    pdd join --tracker gitea --repo team/app --snapshot puzzles.json"
    )]
    Join(cmd::join::JoinArgs),

    #[command(
        about = "List ledger entries",
        long_about = "List every puzzle in the ledger with its liveness and ticket state.",
        after_help = "EXAMPLES:\n    pdd show --tracker github --repo yegor256/pdd\n\n    # Emit machine-readable output\n    pdd show --tracker github --repo yegor256/pdd --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(about = "Generate shell completions")]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PDD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "pdd=debug,pdd_core=debug,pdd_cli=debug,info"
        } else {
            "pdd=info,pdd_core=info,pdd_cli=info,warn"
        })
    });

    let format = env::var("PDD_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> Result<()> {
    match &cli.command {
        Commands::Deploy(args) => cmd::deploy::run_deploy(args, &cli.service_config()?, output),
        Commands::Join(args) => cmd::join::run_join(args, &cli.service_config()?, output),
        Commands::Show(args) => cmd::show::run_show(args, &cli.service_config()?, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(command = ?cli.command, "starting");

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = %format!("{err:#}"), "command failed");
            let _ = render_error(output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}
