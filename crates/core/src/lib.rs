//! Lending Core - Domain types
//!
//! This crate contains the fundamental types shared by every lending crate:
//! - `Amount`: Non-negative decimal wrapper for token amounts
//! - `Address`: 32-byte identity / account address (hex encoded)
//! - `PositionKind`: Collateral or Loan position discriminator

pub mod address;
pub mod amount;
pub mod position;

pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError};
pub use position::PositionKind;
