//! Position record types

use chrono::{DateTime, Utc};
use lending_core::{Address, Amount, PositionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single position record
///
/// For `Collateral` records `balance` is the deposited collateral; for
/// `Loan` records it is the outstanding principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Owner identity (immutable after creation)
    pub owner: Address,
    /// Record kind
    pub kind: PositionKind,
    /// Derived address of this record
    pub address: Address,
    /// Current balance, never negative
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PositionRecord {
    /// Create a zero-balance record
    pub fn new(owner: Address, kind: PositionKind, at: DateTime<Utc>) -> Self {
        Self {
            owner,
            kind,
            address: kind.address_for(&owner),
            balance: Amount::ZERO,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Signed change to one position record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionDelta {
    pub owner: Address,
    pub kind: PositionKind,
    pub delta: Decimal,
}

impl PositionDelta {
    pub fn credit(owner: Address, kind: PositionKind, amount: Amount) -> Self {
        Self {
            owner,
            kind,
            delta: amount.value(),
        }
    }

    pub fn debit(owner: Address, kind: PositionKind, amount: Amount) -> Self {
        Self {
            owner,
            kind,
            delta: -amount.value(),
        }
    }
}
