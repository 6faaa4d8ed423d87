//! Ledger errors

use lending_core::{Address, PositionKind};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{kind} position already initialized for {owner}")]
    AlreadyInitialized { owner: Address, kind: PositionKind },

    #[error("{kind} position not found for {owner}")]
    NotFound { owner: Address, kind: PositionKind },

    #[error("Underflow on {kind} position of {owner}: balance {balance}, delta {delta}")]
    Underflow {
        owner: Address,
        kind: PositionKind,
        balance: Decimal,
        delta: Decimal,
    },

    #[error("Overflow on {kind} position of {owner}")]
    Overflow { owner: Address, kind: PositionKind },
}
