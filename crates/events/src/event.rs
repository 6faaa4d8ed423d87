//! Journal record types

use chrono::{DateTime, Utc};
use lending_core::{Address, Amount, PositionKind};
use serde::{Deserialize, Serialize};

/// A committed change to one owner's positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionEvent {
    /// A zero-balance record was created
    Initialized { owner: Address, kind: PositionKind },

    /// Collateral moved into the collateral vault
    Deposited { owner: Address, amount: Amount },

    /// Loan asset moved out of the loan vault
    Borrowed { owner: Address, amount: Amount },

    /// Loan asset moved back into the loan vault
    Repaid { owner: Address, amount: Amount },

    /// Debt written down and collateral seized by a third party
    Liquidated {
        owner: Address,
        liquidator: Address,
        repaid: Amount,
        collateral_seized: Amount,
    },

    /// The transfer journaled at `sequence` never happened
    ///
    /// Written after a payout from a vault fails. Replay skips the
    /// referenced record.
    Reverted { owner: Address, sequence: u64 },
}

impl PositionEvent {
    /// Owner whose positions changed
    pub fn owner(&self) -> &Address {
        match self {
            PositionEvent::Initialized { owner, .. }
            | PositionEvent::Deposited { owner, .. }
            | PositionEvent::Borrowed { owner, .. }
            | PositionEvent::Repaid { owner, .. }
            | PositionEvent::Liquidated { owner, .. }
            | PositionEvent::Reverted { owner, .. } => owner,
        }
    }

    /// Short name used in logs and hashes
    pub fn name(&self) -> &'static str {
        match self {
            PositionEvent::Initialized { .. } => "initialized",
            PositionEvent::Deposited { .. } => "deposited",
            PositionEvent::Borrowed { .. } => "borrowed",
            PositionEvent::Repaid { .. } => "repaid",
            PositionEvent::Liquidated { .. } => "liquidated",
            PositionEvent::Reverted { .. } => "reverted",
        }
    }
}

/// A sequenced, hash-linked journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Strictly increasing, starting at 1
    pub sequence: u64,
    /// Hash of the previous record ("GENESIS" for the first)
    pub prev_hash: String,
    /// SHA-256 over this record's content
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    /// Caller-visible id of the operation that produced the event
    pub correlation_id: String,
    pub event: PositionEvent,
}
