//! pdd-core library: puzzle ledger reconciliation and ticket lifecycle.
//!
//! A scan of the source tree is merged into a persisted ledger
//! ([`reconcile::join`]), then [`expose::Synchronizer`] opens tracker tickets
//! for live puzzles and closes tickets of puzzles that left the code.
//! [`deploy::deploy`] chains both.
//!
//! # Conventions
//!
//! - **Errors**: each module owns a `thiserror` enum; [`Error`] unifies them
//!   and maps every failure to an [`ErrorCode`].
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod deploy;
pub mod error;
pub mod expose;
pub mod lock;
pub mod model;
pub mod reconcile;
pub mod render;
pub mod scan;
pub mod storage;
pub mod tickets;
pub mod vcs;

pub use deploy::{DeployOptions, DeployReport, deploy};
pub use error::{Error, ErrorCode, Result};
pub use model::{ScannedPuzzle, StoredIssue, StoredPuzzle};
