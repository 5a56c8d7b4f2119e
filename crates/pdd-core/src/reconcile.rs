//! Merging scanner snapshots into the puzzle ledger.
//!
//! [`join`] is purely additive: entries already in the ledger keep every field
//! verbatim, including `alive` and `issue`. Marking vanished puzzles as dead is
//! a separate, explicit step ([`retire_missing`]) that callers opt into.

use std::collections::HashSet;

use crate::model::{ScannedPuzzle, StoredPuzzle};

/// Append every snapshot puzzle whose id is not yet in `before`.
///
/// Existing entries come first in their original order, followed by new
/// entries in snapshot order. Duplicate ids inside `snapshot` are added once.
#[must_use]
pub fn join(before: &[StoredPuzzle], snapshot: &[ScannedPuzzle]) -> Vec<StoredPuzzle> {
    let mut after = before.to_vec();
    let mut known: HashSet<&str> = before.iter().map(|p| p.id.as_str()).collect();

    for puzzle in snapshot {
        if known.insert(puzzle.id.as_str()) {
            after.push(StoredPuzzle::from_scan(puzzle));
        }
    }

    after
}

/// Mark alive entries that are absent from `snapshot` as no longer alive.
///
/// Returns the updated ledger copy and the ids that were retired. Entries that
/// are already dead, or still present in the snapshot, are left untouched.
#[must_use]
pub fn retire_missing(
    ledger: &[StoredPuzzle],
    snapshot: &[ScannedPuzzle],
) -> (Vec<StoredPuzzle>, Vec<String>) {
    let present: HashSet<&str> = snapshot.iter().map(|p| p.id.as_str()).collect();
    let mut retired = Vec::new();

    let after = ledger
        .iter()
        .map(|puzzle| {
            let mut puzzle = puzzle.clone();
            if puzzle.alive && !present.contains(puzzle.id.as_str()) {
                puzzle.alive = false;
                retired.push(puzzle.id.clone());
            }
            puzzle
        })
        .collect();

    (after, retired)
}
