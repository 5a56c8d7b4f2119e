use std::fmt;

use crate::lock::LockError;
use crate::render::RenderError;
use crate::scan::ScanError;
use crate::storage::StorageError;
use crate::vcs::TransportError;

/// Machine-readable error codes surfaced by the CLI and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TitleTruncationFailed,
    TrackerRequestFailed,
    TrackerResponseInvalid,
    ScannerFailed,
    SnapshotInvalid,
    LedgerCorrupt,
    LedgerReadFailed,
    LedgerWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TitleTruncationFailed => "E2001",
            Self::TrackerRequestFailed => "E4001",
            Self::TrackerResponseInvalid => "E4002",
            Self::ScannerFailed => "E4101",
            Self::SnapshotInvalid => "E4102",
            Self::LedgerCorrupt => "E3003",
            Self::LedgerReadFailed => "E5003",
            Self::LedgerWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TitleTruncationFailed => "Ticket title could not be truncated",
            Self::TrackerRequestFailed => "Tracker request failed",
            Self::TrackerResponseInvalid => "Tracker returned an unexpected response",
            Self::ScannerFailed => "Puzzle scanner failed",
            Self::SnapshotInvalid => "Puzzle snapshot is not valid JSON",
            Self::LedgerCorrupt => "Ledger file is corrupt",
            Self::LedgerReadFailed => "Ledger read failed",
            Self::LedgerWriteFailed => "Ledger write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::TitleTruncationFailed => {
                Some("Shorten the first word of the puzzle body or raise title-length.")
            }
            Self::TrackerRequestFailed => {
                Some("Check the tracker token and host; the next deploy retries pending work.")
            }
            Self::TrackerResponseInvalid => Some("Verify the tracker API version is supported."),
            Self::ScannerFailed => Some("Run the scanner command by hand in the source tree."),
            Self::SnapshotInvalid => Some("Regenerate the snapshot with the puzzle scanner."),
            Self::LedgerCorrupt => Some("Restore the ledger file from backup or remove it."),
            Self::LedgerReadFailed | Self::LedgerWriteFailed => {
                Some("Check disk space and permissions on the storage directory.")
            }
            Self::LockContention => Some("Retry after the other `pdd` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Any failure that can end a reconciliation pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl Error {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(err) => err.code(),
            Self::Render(_) => ErrorCode::TitleTruncationFailed,
            Self::Storage(err) => err.code(),
            Self::Scan(err) => err.code(),
            Self::Lock(err) => err.code(),
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
