use serde::{Deserialize, Serialize};

/// A puzzle as reported by the scanner for the current source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedPuzzle {
    pub id: String,
    pub ticket: String,
    pub estimate: i64,
    pub role: String,
    pub lines: String,
    pub body: String,
    pub file: String,
    pub author: String,
    pub email: String,
    pub time: String,
}

/// Tracker ticket attached to a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIssue {
    pub href: String,
    pub number: String,
    /// RFC 3339 timestamp of the close; `None` while the ticket is open.
    #[serde(default)]
    pub closed: Option<String>,
}

impl StoredIssue {
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed.is_some()
    }
}

/// One ledger entry. Field order is the on-disk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPuzzle {
    pub id: String,
    pub ticket: String,
    pub estimate: i64,
    pub role: String,
    pub lines: String,
    pub body: String,
    pub file: String,
    pub author: String,
    pub email: String,
    pub time: String,
    pub alive: bool,
    pub issue: Option<StoredIssue>,
}

impl StoredPuzzle {
    /// First sighting of a puzzle: alive, no ticket yet.
    #[must_use]
    pub fn from_scan(puzzle: &ScannedPuzzle) -> Self {
        Self {
            id: puzzle.id.clone(),
            ticket: puzzle.ticket.clone(),
            estimate: puzzle.estimate,
            role: puzzle.role.clone(),
            lines: puzzle.lines.clone(),
            body: puzzle.body.clone(),
            file: puzzle.file.clone(),
            author: puzzle.author.clone(),
            email: puzzle.email.clone(),
            time: puzzle.time.clone(),
            alive: true,
            issue: None,
        }
    }

    /// `(start, stop)` of the puzzle's line range.
    #[must_use]
    pub fn line_span(&self) -> (&str, &str) {
        line_span(&self.lines)
    }
}

/// Split a `"start-stop"` range. A bare number is a one-line range.
#[must_use]
pub fn line_span(lines: &str) -> (&str, &str) {
    let trimmed = lines.trim();
    trimmed
        .split_once('-')
        .map_or((trimmed, trimmed), |(start, stop)| {
            (start.trim(), stop.trim())
        })
}
