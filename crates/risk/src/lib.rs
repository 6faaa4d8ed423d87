//! Lending Risk Engine - Pre-commit gatekeeper
//!
//! The Risk Engine decides whether a borrow is within the loan-to-value
//! limit and whether a position may be liquidated. It holds no balances:
//! every decision is computed from the authoritative ledger values passed
//! in at decision time.

pub mod engine;
pub mod error;
pub mod liquidation;
pub mod params;

pub use engine::{PositionStatus, Prices, RiskEngine};
pub use error::RiskError;
pub use liquidation::Seizure;
pub use params::RiskParams;
