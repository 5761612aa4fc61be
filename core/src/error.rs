//! Error types for statedb

use crate::types::{Account, Amount};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for statedb
#[derive(Error, Debug)]
pub enum LedgerError {
    // ============ Store Errors ============
    #[error("Ledger store unavailable at {path}: {reason}")]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("Corrupt ledger record #{index}: {reason}")]
    CorruptRecord { index: u64, reason: String },

    #[error("Replay failed at record #{index}: {source}")]
    ReplayFailed {
        index: u64,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("Append failed: {0}")]
    AppendFailed(String),

    #[error("Ledger store at {path} refuses writes: {reason}")]
    StorePoisoned { path: PathBuf, reason: String },

    #[error("Already exists: {0}")]
    AlreadyExists(PathBuf),

    // ============ Transaction Errors ============
    #[error("Insufficient balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: Account,
        required: Amount,
        available: Amount,
    },

    #[error("Balance overflow crediting {account}")]
    BalanceOverflow { account: Account },

    #[error("Ledger is still replaying and does not accept new transactions")]
    NotLive,

    // ============ Persist Errors ============
    #[error("Persist failed after {persisted} record(s), {remaining} still queued: {source}")]
    PersistFailure {
        persisted: usize,
        remaining: usize,
        #[source]
        source: Box<LedgerError>,
    },

    // ============ Genesis Errors ============
    #[error("Genesis unavailable at {path}: {reason}")]
    GenesisUnavailable { path: PathBuf, reason: String },

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    // ============ General Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    /// Errors that leave the ledger unusable until its files are repaired.
    /// The rest reject a single request.
    pub fn is_fatal(&self) -> bool {
        match self {
            LedgerError::PersistFailure { source, .. } => source.is_fatal(),
            _ => matches!(
                self,
                LedgerError::StoreUnavailable { .. }
                    | LedgerError::StorePoisoned { .. }
                    | LedgerError::CorruptRecord { .. }
                    | LedgerError::ReplayFailed { .. }
                    | LedgerError::GenesisUnavailable { .. }
                    | LedgerError::InvalidGenesis(_)
            ),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let corrupt = LedgerError::CorruptRecord {
            index: 3,
            reason: "bad json".into(),
        };
        assert!(corrupt.is_fatal());

        let insufficient = LedgerError::InsufficientBalance {
            account: Account::from("alice"),
            required: Amount::new(150),
            available: Amount::new(100),
        };
        assert!(!insufficient.is_fatal());
        assert_eq!(
            insufficient.to_string(),
            "Insufficient balance for alice: required 150, available 100"
        );
    }

    #[test]
    fn test_persist_failure_source() {
        use std::error::Error as _;

        let err = LedgerError::PersistFailure {
            persisted: 1,
            remaining: 2,
            source: Box::new(LedgerError::AppendFailed("disk full".into())),
        };
        assert!(!err.is_fatal());
        assert!(err.source().is_some());
        assert!(err.to_string().contains("2 still queued"));
    }

    #[test]
    fn test_poisoned_store_is_fatal() {
        let err = LedgerError::StorePoisoned {
            path: PathBuf::from("tx.db"),
            reason: "truncate failed".into(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("refuses writes"));

        let persist = LedgerError::PersistFailure {
            persisted: 0,
            remaining: 1,
            source: Box::new(err),
        };
        assert!(persist.is_fatal());
    }
}
