//! Ticket synchronization: open and close tracker issues so they follow the
//! ledger.
//!
//! Every transition is saved as soon as it happens. A pass that fails halfway
//! keeps what it already saved, and the predicates make the next pass pick
//! up exactly where this one stopped.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{StoredIssue, StoredPuzzle};
use crate::storage::LedgerStore;
use crate::tickets::Tickets;

/// Source of the close timestamp.
pub type Clock = fn() -> DateTime<Utc>;

/// The puzzle left the code but its ticket is still open.
#[must_use]
pub fn closeable(puzzle: &StoredPuzzle) -> bool {
    !puzzle.alive && puzzle.issue.as_ref().is_some_and(|issue| !issue.is_closed())
}

/// The puzzle is in the code and has no open ticket.
#[must_use]
pub fn openable(puzzle: &StoredPuzzle) -> bool {
    puzzle.alive && puzzle.issue.as_ref().is_none_or(StoredIssue::is_closed)
}

/// Outcome of one [`Synchronizer::expose`] pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exposure {
    pub ledger: Vec<StoredPuzzle>,
    pub opened: Vec<String>,
    pub closed: Vec<String>,
}

/// Drives [`Tickets`] over a ledger and persists each transition.
pub struct Synchronizer<'a, S: LedgerStore + ?Sized> {
    store: &'a S,
    clock: Clock,
}

impl<'a, S: LedgerStore + ?Sized> Synchronizer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_clock(store, Utc::now)
    }

    pub const fn with_clock(store: &'a S, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Open tickets for live puzzles and close tickets of gone ones.
    ///
    /// Works on a copy of `puzzles`.
    ///
    /// # Errors
    ///
    /// The first tracker or storage failure aborts the pass and is returned.
    /// Transitions saved before it stay saved.
    pub fn expose(&self, puzzles: &[StoredPuzzle], tickets: &dyn Tickets) -> Result<Exposure> {
        let mut ledger = puzzles.to_vec();
        let mut opened = Vec::new();
        let mut closed = Vec::new();

        for index in 0..ledger.len() {
            let puzzle = &ledger[index];

            if closeable(puzzle) {
                if tickets.close(puzzle)? {
                    let stamp = self.now();
                    let id = puzzle.id.clone();
                    if let Some(issue) = ledger[index].issue.as_mut() {
                        issue.closed = Some(stamp);
                    }
                    self.store.save(&ledger)?;
                    info!(puzzle = %id, "ticket closed");
                    closed.push(id);
                }
                continue;
            }

            if openable(puzzle) {
                if let Some(issue) = tickets.submit(puzzle)? {
                    let id = puzzle.id.clone();
                    ledger[index].issue = Some(StoredIssue {
                        href: issue.href,
                        number: issue.number.clone(),
                        closed: None,
                    });
                    self.store.save(&ledger)?;
                    info!(puzzle = %id, issue = %issue.number, "ticket opened");
                    opened.push(id);
                }
                continue;
            }

            debug!(puzzle = %puzzle.id, "no ticket transition");
        }

        Ok(Exposure {
            ledger,
            opened,
            closed,
        })
    }

    fn now(&self) -> String {
        (self.clock)().to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}
