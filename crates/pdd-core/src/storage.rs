//! Ledger persistence.
//!
//! A ledger is stored as one flat JSON array of [`StoredPuzzle`] records per
//! `<tracker>-<repo>` key. Every save rewrites the whole array.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ErrorCode;
use crate::model::StoredPuzzle;

/// Errors from loading or saving a ledger.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ledger {path} is not a valid puzzle list: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize ledger {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::LedgerReadFailed,
            Self::Write { .. } => ErrorCode::LedgerWriteFailed,
            Self::Parse { .. } => ErrorCode::LedgerCorrupt,
            Self::Serialize { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

/// Load/save contract for one ledger.
pub trait LedgerStore {
    /// Read the whole ledger. A ledger that was never saved is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the ledger exists but cannot be read or
    /// parsed.
    fn load(&self) -> Result<Vec<StoredPuzzle>, StorageError>;

    /// Replace the stored ledger with `puzzles`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the ledger cannot be serialized or written.
    fn save(&self, puzzles: &[StoredPuzzle]) -> Result<(), StorageError>;
}

/// Storage key for a tracker/repository pair.
#[must_use]
pub fn ledger_key(tracker: &str, repo_full_name: &str) -> String {
    format!("{}-{repo_full_name}", tracker.to_lowercase())
}

/// Ledger kept as `<dir>/<encoded key>.json`.
#[derive(Debug, Clone)]
pub struct FsLedgerStore {
    key: String,
    path: PathBuf,
}

impl FsLedgerStore {
    #[must_use]
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            key: key.to_string(),
            path: dir.join(format!("{}.json", encode_key(key))),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path of the advisory lock guarding this ledger.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }
}

impl LedgerStore for FsLedgerStore {
    fn load(&self) -> Result<Vec<StoredPuzzle>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, puzzles: &[StoredPuzzle]) -> Result<(), StorageError> {
        let write_err = |source: io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut body =
            serde_json::to_vec_pretty(puzzles).map_err(|source| StorageError::Serialize {
                key: self.key.clone(),
                source,
            })?;
        body.push(b'\n');

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, body).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        debug!(ledger = %self.key, entries = puzzles.len(), "ledger saved");
        Ok(())
    }
}

/// In-memory ledger; counts saves so callers can observe persistence cadence.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    puzzles: RefCell<Vec<StoredPuzzle>>,
    saves: Cell<usize>,
}

impl MemoryLedgerStore {
    #[must_use]
    pub fn new(puzzles: Vec<StoredPuzzle>) -> Self {
        Self {
            puzzles: RefCell::new(puzzles),
            saves: Cell::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<StoredPuzzle> {
        self.puzzles.borrow().clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Vec<StoredPuzzle>, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, puzzles: &[StoredPuzzle]) -> Result<(), StorageError> {
        *self.puzzles.borrow_mut() = puzzles.to_vec();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// Percent-encode everything except `[A-Za-z0-9._-]` so a key is one file name.
fn encode_key(key: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        let is_safe = byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte == b'.';
        if is_safe {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push(char::from(HEX[usize::from(byte >> 4)]));
            encoded.push(char::from(HEX[usize::from(byte & 0x0F)]));
        }
    }
    encoded
}
