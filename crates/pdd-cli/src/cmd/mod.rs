pub mod completions;
pub mod deploy;
pub mod join;
pub mod show;

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use pdd_core::config::ServiceConfig;
use pdd_core::lock::LedgerLock;
use pdd_core::storage::{FsLedgerStore, ledger_key};

use crate::tracker::TrackerKind;

/// Which ledger a command works on.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Issue tracker hosting the repository.
    #[arg(long, value_enum)]
    pub tracker: TrackerKind,

    /// Repository full name.
    #[arg(long, value_name = "OWNER/NAME", value_parser = parse_repo)]
    pub repo: String,

    /// Seconds to wait for another pass holding the ledger lock.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub lock_timeout: u64,
}

impl LedgerArgs {
    pub fn key(&self) -> String {
        ledger_key(self.tracker.as_str(), &self.repo)
    }

    pub fn store(&self, config: &ServiceConfig) -> FsLedgerStore {
        FsLedgerStore::new(&config.storage_dir, &self.key())
    }

    /// Take the exclusive lock guarding `store` for the rest of the command.
    pub fn lock(&self, store: &FsLedgerStore) -> Result<LedgerLock> {
        LedgerLock::acquire(&store.lock_path(), Duration::from_secs(self.lock_timeout))
            .map_err(|err| pdd_core::Error::from(err).into())
    }
}

fn parse_repo(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    match trimmed.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(trimmed.to_string())
        }
        _ => Err(format!("invalid repo '{trimmed}': expected <owner>/<name>")),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_repo;

    #[test]
    fn repo_requires_owner_and_name() {
        assert_eq!(parse_repo(" owner/repo ").as_deref(), Ok("owner/repo"));
        assert!(parse_repo("repo").is_err());
        assert!(parse_repo("/repo").is_err());
        assert!(parse_repo("owner/").is_err());
        assert!(parse_repo("a/b/c").is_err());
    }
}
