//! Shared market fixture for the integration suites

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use lending_core::{Address, Amount};
use lending_custody::{Custody, InMemoryCustody};
use lending_oracle::MockOracle;
use lending_protocol::{Caller, Keypair, LendingProtocol, ProtocolConfig, Receipt};
use rust_decimal::Decimal;

pub fn units(n: u64) -> Amount {
    Amount::from_units(n)
}

/// A protocol wired to in-memory custody and a mock oracle at parity
pub struct Market {
    pub protocol: Arc<LendingProtocol>,
    pub custody: Arc<InMemoryCustody>,
    pub oracle: Arc<MockOracle>,
}

/// A funded user with canonical token accounts for both assets
pub struct User {
    pub keypair: Keypair,
    pub collateral_account: Address,
    pub loan_account: Address,
}

impl User {
    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    pub fn caller(&self) -> Caller {
        self.keypair.caller()
    }
}

impl Market {
    pub fn new() -> Self {
        Self::with_config(ProtocolConfig::default())
    }

    pub fn with_config(config: ProtocolConfig) -> Self {
        let custody = Arc::new(InMemoryCustody::new());
        let oracle = Arc::new(parity_oracle());
        let protocol = LendingProtocol::new(config, custody.clone(), oracle.clone()).unwrap();
        Self::assemble(protocol, custody, oracle)
    }

    /// Market backed by a journal in `path`, sharing an existing custody
    pub fn with_journal(path: &Path, custody: Arc<InMemoryCustody>) -> Self {
        Self::with_journal_config(path, custody, ProtocolConfig::default())
    }

    pub fn with_journal_config(path: &Path, custody: Arc<InMemoryCustody>, config: ProtocolConfig) -> Self {
        let oracle = Arc::new(parity_oracle());
        let protocol = LendingProtocol::new(config, custody.clone(), oracle.clone())
            .unwrap()
            .with_journal(path)
            .unwrap();
        Self::assemble(protocol, custody, oracle)
    }

    fn assemble(protocol: LendingProtocol, custody: Arc<InMemoryCustody>, oracle: Arc<MockOracle>) -> Self {
        for vault in [protocol.collateral_vault(), protocol.loan_vault()] {
            custody.open_account_at(vault.address, vault.authority, &vault.asset);
        }
        Self {
            protocol: Arc::new(protocol),
            custody,
            oracle,
        }
    }

    /// Seed the loan vault with lendable liquidity
    pub fn fund_loan_vault(&self, amount: u64) {
        self.custody
            .mint_to(&self.protocol.loan_vault().address, units(amount))
            .unwrap();
    }

    /// New user holding `collateral` units of the collateral asset and
    /// `loan` units of the loan asset
    pub fn user(&self, collateral: u64, loan: u64) -> User {
        let keypair = Keypair::generate();
        let config = self.protocol.config();
        let collateral_account = self.custody.open_account(keypair.address(), &config.collateral_asset);
        let loan_account = self.custody.open_account(keypair.address(), &config.loan_asset);
        self.custody.mint_to(&collateral_account, units(collateral)).unwrap();
        self.custody.mint_to(&loan_account, units(loan)).unwrap();

        User {
            keypair,
            collateral_account,
            loan_account,
        }
    }

    /// Initialize both positions of `user`
    pub async fn open_positions(&self, user: &User) {
        let owner = user.address();
        self.protocol
            .initialize_collateral_account(&user.caller(), &owner)
            .await
            .unwrap();
        self.protocol
            .initialize_loan_account(&user.caller(), &owner)
            .await
            .unwrap();
    }

    pub async fn deposit(&self, user: &User, amount: u64) -> Result<Receipt, lending_protocol::LendingError> {
        let accounts = self.protocol.deposit_accounts(user.address(), user.collateral_account);
        self.protocol.deposit(&user.caller(), &accounts, units(amount)).await
    }

    pub async fn borrow(&self, user: &User, amount: u64) -> Result<Receipt, lending_protocol::LendingError> {
        let accounts = self.protocol.borrow_accounts(user.address(), user.loan_account);
        self.protocol.borrow(&user.caller(), &accounts, units(amount)).await
    }

    pub async fn repay(&self, user: &User, amount: u64) -> Result<Receipt, lending_protocol::LendingError> {
        let accounts = self.protocol.repay_accounts(user.address(), user.loan_account);
        self.protocol.repay(&user.caller(), &accounts, units(amount)).await
    }

    pub async fn liquidate(
        &self,
        liquidator: &User,
        owner: &User,
        amount: u64,
    ) -> Result<Receipt, lending_protocol::LendingError> {
        let accounts = self.protocol.liquidate_accounts(
            owner.address(),
            liquidator.loan_account,
            liquidator.collateral_account,
        );
        self.protocol.liquidate(&liquidator.caller(), &accounts, units(amount)).await
    }

    /// Credit `amount` units straight into a token account
    pub fn mint(&self, account: &Address, amount: Amount) {
        self.custody.mint_to(account, amount).unwrap();
    }

    pub async fn balance(&self, account: &Address) -> Amount {
        self.custody.balance(account).await.unwrap()
    }

    pub fn collateral(&self, user: &User) -> Amount {
        self.protocol
            .ledger()
            .read(&user.address(), lending_core::PositionKind::Collateral)
            .unwrap()
            .balance
    }

    pub fn principal(&self, user: &User) -> Amount {
        self.protocol
            .ledger()
            .read(&user.address(), lending_core::PositionKind::Loan)
            .unwrap()
            .balance
    }

    pub fn set_collateral_price(&self, value: Decimal) {
        let asset = self.protocol.config().collateral_asset.clone();
        self.oracle.set_price(&asset, value);
    }
}

fn parity_oracle() -> MockOracle {
    MockOracle::with_prices(&[("SOL", Decimal::ONE), ("USDC", Decimal::ONE)])
}
