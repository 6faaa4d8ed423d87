//! Lending Ledger - Position records
//!
//! All balance changes of the protocol land here. The ledger keeps one
//! record per `(owner, PositionKind)` and guarantees that no record ever
//! holds a negative balance.
//!
//! # Key Types
//! - `PositionLedger`: Keyed store of position records
//! - `PositionRecord`: Collateral balance or loan principal of one owner
//! - `PositionDelta`: Signed change applied to one record

pub mod error;
pub mod record;
pub mod store;

pub use error::LedgerError;
pub use record::{PositionDelta, PositionRecord};
pub use store::PositionLedger;
