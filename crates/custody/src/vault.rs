//! Protocol vault handle
//!
//! A vault is a pooled custody account controlled by the protocol's vault
//! authority. Users never move vault funds directly; every movement goes
//! through `pull_from_user` or `push_to_user`.

use lending_core::{Address, Amount};

use crate::error::CustodyError;
use crate::types::Custody;

/// Seed of the derived vault authority
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault";

/// Handle to one protocol-controlled vault account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    /// Vault token account
    pub address: Address,
    /// Identity allowed to move funds out of the vault
    pub authority: Address,
    /// Asset held by the vault
    pub asset: String,
}

impl Vault {
    pub fn new(address: Address, authority: Address, asset: impl Into<String>) -> Self {
        Self {
            address,
            authority,
            asset: asset.into().to_uppercase(),
        }
    }

    /// Derived authority controlling every vault of the protocol
    pub fn derived_authority() -> Address {
        Address::derive(&[VAULT_AUTHORITY_SEED])
    }

    /// Move `amount` from a user account into the vault
    ///
    /// `user` must control `user_account`.
    pub async fn pull_from_user(
        &self,
        custody: &dyn Custody,
        user_account: &Address,
        user: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        custody
            .transfer(user_account, &self.address, amount, user)
            .await
    }

    /// Move `amount` from the vault to a user account
    ///
    /// Fails with `VaultInsufficient` if the vault holds less than `amount`.
    pub async fn push_to_user(
        &self,
        custody: &dyn Custody,
        user_account: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.ensure_can_pay(custody, amount).await?;

        custody
            .transfer(&self.address, user_account, amount, &self.authority)
            .await
            .map_err(|e| match e {
                CustodyError::InsufficientFunds {
                    available, required, ..
                } => CustodyError::VaultInsufficient {
                    vault: self.address,
                    available,
                    required,
                },
                other => other,
            })
    }

    /// Check that the vault holds at least `amount`
    pub async fn ensure_can_pay(&self, custody: &dyn Custody, amount: Amount) -> Result<(), CustodyError> {
        let available = custody.balance(&self.address).await?;
        if available < amount {
            return Err(CustodyError::VaultInsufficient {
                vault: self.address,
                available: available.value(),
                required: amount.value(),
            });
        }
        Ok(())
    }

    /// Current vault balance
    pub async fn balance(&self, custody: &dyn Custody) -> Result<Amount, CustodyError> {
        custody.balance(&self.address).await
    }
}
