//! Core custody types

use async_trait::async_trait;
use lending_core::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::CustodyError;

/// A token-holding account managed by the custody facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    /// Account address
    pub address: Address,
    /// Controller allowed to move funds out of the account
    pub owner: Address,
    /// Asset code held by the account (e.g., SOL, USDC)
    pub asset: String,
    /// Current balance
    pub balance: Amount,
}

/// Custody trait - interface to the external token-custody facility
///
/// Implementations can be:
/// - InMemoryCustody: For tests and local tooling
/// - An SPL-token or bank-rail adapter in a deployment
///
/// Transfers are not assumed idempotent; callers must not retry blindly.
#[async_trait]
pub trait Custody: Send + Sync {
    /// Look up a token account
    async fn account(&self, address: &Address) -> Result<TokenAccount, CustodyError>;

    /// Move `amount` from `from` to `to`, authorized by `authority`
    ///
    /// Fails with `InsufficientFunds` if `from` holds less than `amount`.
    async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
        authority: &Address,
    ) -> Result<(), CustodyError>;

    /// Current balance of a token account
    async fn balance(&self, address: &Address) -> Result<Amount, CustodyError> {
        Ok(self.account(address).await?.balance)
    }
}
