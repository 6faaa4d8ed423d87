//! Event store errors

use thiserror::Error;

use crate::hash::ChainError;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Journal integrity error: {0}")]
    Chain(#[from] ChainError),

    #[error("Journal unusable after a failed write; reopen to recover")]
    Poisoned,

    #[error("Replay failed at sequence {sequence}: {source}")]
    Replay {
        sequence: u64,
        #[source]
        source: lending_ledger::LedgerError,
    },
}
