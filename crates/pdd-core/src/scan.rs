//! Puzzle scanners.
//!
//! A scanner yields the puzzles present in a source tree right now. The
//! puzzle extractor itself is an external program (`gopdd -v` by default)
//! that prints a JSON array of [`ScannedPuzzle`] records.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::ErrorCode;
use crate::model::ScannedPuzzle;

/// Errors from producing a puzzle snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to spawn scanner `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("scanner `{command}` exited with {}: {stderr}", exit_label(*.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("puzzle snapshot from {origin} is not a puzzle list: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read puzzle snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Spawn { .. } | Self::Failed { .. } => ErrorCode::ScannerFailed,
            Self::Parse { .. } | Self::Read { .. } => ErrorCode::SnapshotInvalid,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
}

/// Source of the current puzzle snapshot.
pub trait Scanner {
    /// # Errors
    ///
    /// Returns [`ScanError`] when the snapshot cannot be produced or parsed.
    fn scan(&self) -> Result<Vec<ScannedPuzzle>, ScanError>;
}

/// Parse a JSON array of scanned puzzles. `origin` only labels errors.
///
/// # Errors
///
/// Returns [`ScanError::Parse`] if `raw` is not blank and not a puzzle array.
pub fn parse_snapshot(raw: &str, origin: &str) -> Result<Vec<ScannedPuzzle>, ScanError> {
    // gopdd prints nothing at all for a tree without puzzles.
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|source| ScanError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Runs a shell command inside a checked-out source tree.
#[derive(Debug, Clone)]
pub struct CommandScanner {
    command: String,
    dir: PathBuf,
}

impl CommandScanner {
    #[must_use]
    pub fn new(command: impl Into<String>, dir: &Path) -> Self {
        Self {
            command: command.into(),
            dir: dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Scanner for CommandScanner {
    fn scan(&self) -> Result<Vec<ScannedPuzzle>, ScanError> {
        debug!(command = %self.command, dir = %self.dir.display(), "running puzzle scanner");

        let output = Command::new("sh")
            .args(["-c", &self.command])
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ScanError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ScanError::Failed {
                command: self.command.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let puzzles = parse_snapshot(&stdout, &self.command)?;
        debug!(count = puzzles.len(), "scanner finished");
        Ok(puzzles)
    }
}

/// Reads a snapshot previously written by the scanner.
#[derive(Debug, Clone)]
pub struct SnapshotScanner {
    path: PathBuf,
}

impl SnapshotScanner {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Scanner for SnapshotScanner {
    fn scan(&self) -> Result<Vec<ScannedPuzzle>, ScanError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| ScanError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_snapshot(&raw, &self.path.display().to_string())
    }
}

/// Fixed snapshot, handy for tests and offline passes.
impl Scanner for Vec<ScannedPuzzle> {
    fn scan(&self) -> Result<Vec<ScannedPuzzle>, ScanError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::scanned;

    fn snapshot_json(ids: &[&str]) -> String {
        let puzzles: Vec<_> = ids.iter().map(|id| scanned(id)).collect();
        serde_json::to_string(&puzzles).expect("serialize")
    }

    #[test]
    fn parses_scanner_records() {
        let puzzles = parse_snapshot(&snapshot_json(&["a", "b"]), "test").expect("parse");
        assert_eq!(puzzles, vec![scanned("a"), scanned("b")]);
    }

    #[test]
    fn blank_output_is_an_empty_snapshot() {
        assert!(parse_snapshot("  \n", "test").expect("parse").is_empty());
    }

    #[test]
    fn non_list_output_is_a_parse_error() {
        let err = parse_snapshot("{\"id\":\"x\"}", "gopdd -v").expect_err("object");
        assert!(matches!(err, ScanError::Parse { ref origin, .. } if origin == "gopdd -v"));
        assert_eq!(err.code(), ErrorCode::SnapshotInvalid);
    }

    #[test]
    fn snapshot_scanner_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("puzzles.json");
        fs::write(&path, snapshot_json(&["x"])).expect("write");

        let puzzles = SnapshotScanner::new(&path).scan().expect("scan");
        assert_eq!(puzzles.len(), 1);
        assert_eq!(puzzles[0].id, "x");
    }

    #[test]
    fn missing_snapshot_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SnapshotScanner::new(&dir.path().join("absent.json"))
            .scan()
            .expect_err("missing");
        assert!(matches!(err, ScanError::Read { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn command_scanner_runs_in_source_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("out.json"), snapshot_json(&["p1"])).expect("write");

        let puzzles = CommandScanner::new("cat out.json", dir.path())
            .scan()
            .expect("scan");
        assert_eq!(puzzles, vec![scanned("p1")]);
    }

    #[cfg(unix)]
    #[test]
    fn command_scanner_reports_exit_code_and_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = CommandScanner::new("echo broken tree >&2; exit 3", dir.path())
            .scan()
            .expect_err("non-zero exit");

        match &err {
            ScanError::Failed { code, stderr, .. } => {
                assert_eq!(*code, Some(3));
                assert_eq!(stderr, "broken tree");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.code(), ErrorCode::ScannerFailed);
        assert!(err.to_string().contains("exited with code 3"));
    }

    #[cfg(unix)]
    #[test]
    fn command_scanner_rejects_garbage_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = CommandScanner::new("echo not-json", dir.path())
            .scan()
            .expect_err("garbage");
        assert!(matches!(err, ScanError::Parse { .. }));
    }
}
