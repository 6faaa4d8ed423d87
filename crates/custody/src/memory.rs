//! In-memory custody for tests and local tooling
//!
//! Holds token accounts in a map guarded by a single lock. Every transfer
//! checks and moves balances under that lock, so a transfer is atomic with
//! respect to any other transfer.

use async_trait::async_trait;
use lending_core::{Address, Amount};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::CustodyError;
use crate::types::{Custody, TokenAccount};

/// In-memory token ledger
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    accounts: RwLock<HashMap<Address, TokenAccount>>,
}

impl InMemoryCustody {
    /// Create an empty custody
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the canonical `asset` account controlled by `owner`
    pub fn associated_address(owner: &Address, asset: &str) -> Address {
        Address::derive(&[
            b"token-account",
            owner.as_bytes(),
            asset.to_uppercase().as_bytes(),
        ])
    }

    /// Open (or return the existing) canonical `asset` account for `owner`
    pub fn open_account(&self, owner: Address, asset: &str) -> Address {
        let address = Self::associated_address(&owner, asset);
        self.open_account_at(address, owner, asset);
        address
    }

    /// Open an account at an explicit address
    ///
    /// Existing accounts are left untouched.
    pub fn open_account_at(&self, address: Address, owner: Address, asset: &str) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.entry(address).or_insert_with(|| TokenAccount {
            address,
            owner,
            asset: asset.to_uppercase(),
            balance: Amount::ZERO,
        });
    }

    /// Credit tokens out of thin air (test faucet)
    pub fn mint_to(&self, address: &Address, amount: Amount) -> Result<(), CustodyError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let account = accounts
            .get_mut(address)
            .ok_or(CustodyError::AccountNotFound(*address))?;
        account.balance = account
            .balance
            .checked_add(&amount)
            .ok_or(CustodyError::BalanceOverflow(*address))?;
        Ok(())
    }

    /// Number of open accounts
    pub fn account_count(&self) -> usize {
        self.accounts.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Custody for InMemoryCustody {
    async fn account(&self, address: &Address) -> Result<TokenAccount, CustodyError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts
            .get(address)
            .cloned()
            .ok_or(CustodyError::AccountNotFound(*address))
    }

    async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
        authority: &Address,
    ) -> Result<(), CustodyError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);

        let source = accounts
            .get(from)
            .ok_or(CustodyError::AccountNotFound(*from))?;
        let destination = accounts.get(to).ok_or(CustodyError::AccountNotFound(*to))?;

        if source.owner != *authority {
            return Err(CustodyError::Unauthorized {
                account: *from,
                authority: *authority,
            });
        }

        if source.asset != destination.asset {
            return Err(CustodyError::AssetMismatch {
                from_asset: source.asset.clone(),
                to_asset: destination.asset.clone(),
            });
        }

        let new_source = source
            .balance
            .checked_sub(&amount)
            .ok_or(CustodyError::InsufficientFunds {
                account: *from,
                available: source.balance.value(),
                required: amount.value(),
            })?;

        if from == to {
            return Ok(());
        }

        let new_destination = destination
            .balance
            .checked_add(&amount)
            .ok_or(CustodyError::BalanceOverflow(*to))?;

        if let Some(account) = accounts.get_mut(from) {
            account.balance = new_source;
        }
        if let Some(account) = accounts.get_mut(to) {
            account.balance = new_destination;
        }

        tracing::debug!(
            from = %from.short(),
            to = %to.short(),
            amount = %amount,
            "Custody transfer settled"
        );

        Ok(())
    }
}
