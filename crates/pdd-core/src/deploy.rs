//! One full reconciliation pass: scan, merge, persist, then sync tickets.

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::expose::{Clock, Synchronizer};
use crate::model::StoredPuzzle;
use crate::reconcile::{join, retire_missing};
use crate::scan::Scanner;
use crate::storage::LedgerStore;
use crate::tickets::Tickets;

/// Knobs for [`deploy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Mark ledger entries that vanished from the scan as no longer alive, so
    /// their tickets get closed in the same pass.
    pub retire_missing: bool,
}

/// Summary of a deploy pass; ids in ledger order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub added: Vec<String>,
    pub retired: Vec<String>,
    pub opened: Vec<String>,
    pub closed: Vec<String>,
}

/// Load the ledger, merge the current scan into it, save, then expose.
///
/// # Errors
///
/// Returns the first storage, scanner, rendering or tracker failure. Ledger
/// saves made before the failure are kept.
pub fn deploy(
    scanner: &dyn Scanner,
    store: &dyn LedgerStore,
    tickets: &dyn Tickets,
    options: DeployOptions,
) -> Result<DeployReport> {
    deploy_with_clock(scanner, store, tickets, options, chrono::Utc::now)
}

/// [`deploy`] with a pinned clock for close timestamps.
///
/// # Errors
///
/// Same as [`deploy`].
pub fn deploy_with_clock(
    scanner: &dyn Scanner,
    store: &dyn LedgerStore,
    tickets: &dyn Tickets,
    options: DeployOptions,
    clock: Clock,
) -> Result<DeployReport> {
    let (ledger, mut report) = merge(scanner, store, options)?;

    let exposure = Synchronizer::with_clock(store, clock).expose(&ledger, tickets)?;
    report.opened = exposure.opened;
    report.closed = exposure.closed;

    info!(
        added = report.added.len(),
        retired = report.retired.len(),
        opened = report.opened.len(),
        closed = report.closed.len(),
        "deploy finished"
    );
    Ok(report)
}

/// Scan and merge into the stored ledger without touching any tracker.
///
/// Returns the saved ledger and a report with `added`/`retired` filled in.
///
/// # Errors
///
/// Returns an error if the ledger cannot be loaded or saved, or if the
/// scanner fails. Nothing is saved when the scan fails.
pub fn merge(
    scanner: &dyn Scanner,
    store: &dyn LedgerStore,
    options: DeployOptions,
) -> Result<(Vec<StoredPuzzle>, DeployReport)> {
    let before = store.load()?;
    let snapshot = scanner.scan()?;

    let mut ledger = join(&before, &snapshot);
    let added = ledger[before.len()..]
        .iter()
        .map(|puzzle| puzzle.id.clone())
        .collect();

    let retired = if options.retire_missing {
        let (after, retired) = retire_missing(&ledger, &snapshot);
        ledger = after;
        retired
    } else {
        Vec::new()
    };

    store.save(&ledger)?;

    Ok((
        ledger,
        DeployReport {
            added,
            retired,
            ..DeployReport::default()
        },
    ))
}
