//! Custody error types

use lending_core::Address;
use rust_decimal::Decimal;
use thiserror::Error;

/// Custody-related errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// Token account does not exist
    #[error("Token account not found: {0}")]
    AccountNotFound(Address),

    /// Source account lacks the requested amount
    #[error("Insufficient funds in {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: Address,
        available: Decimal,
        required: Decimal,
    },

    /// Protocol vault lacks the requested amount
    #[error("Vault {vault} holds {available}, cannot pay out {required}")]
    VaultInsufficient {
        vault: Address,
        available: Decimal,
        required: Decimal,
    },

    /// Transfer was not signed by the controller of the source account
    #[error("{authority} is not the controller of {account}")]
    Unauthorized { account: Address, authority: Address },

    /// Credit would overflow the account balance
    #[error("Balance overflow in {0}")]
    BalanceOverflow(Address),

    /// Source and destination hold different assets
    #[error("Asset mismatch: {from_asset} -> {to_asset}")]
    AssetMismatch { from_asset: String, to_asset: String },
}
