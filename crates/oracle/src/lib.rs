//! Lending Price Oracle
//!
//! Provides per-asset valuation for the risk engine. Collateral and loan
//! assets are valued in a common quote unit; `ParityOracle` prices every
//! asset at 1, which reproduces the single-unit collateral ratios.
//! `MockOracle` holds configurable prices for tests.

mod error;
mod mock;
mod parity;
mod types;

pub use error::OracleError;
pub use mock::MockOracle;
pub use parity::ParityOracle;
pub use types::{Price, PriceOracle};
