//! Lending protocol processor
//!
//! Each operation follows the same pipeline:
//! 1. Validate the amount and authenticate the caller
//! 2. Check every supplied account reference
//! 3. Lock the owner and read current balances
//! 4. Ask the risk engine
//! 5. Move tokens through the vaults
//! 6. Journal the event and apply it to the ledger
//!
//! A payout from a vault cannot be taken back, so borrow and liquidate
//! journal their event before paying out and apply it to the ledger only
//! once the payout succeeded. A failed payout is followed by a `Reverted`
//! record. Pulls into a vault are refunded when the journal write fails.
//!
//! The per-owner lock is held from step 3 through step 6, so two operations
//! on the same position never decide against a stale snapshot. Operations
//! on different owners run in parallel.

use lending_core::{Address, Amount, PositionKind};
use lending_custody::{Custody, Vault};
use lending_events::{apply_event, replay, Journal, PositionEvent};
use lending_ledger::PositionLedger;
use lending_oracle::PriceOracle;
use lending_risk::{Prices, RiskEngine};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::auth::{require_owner, require_position, require_token_account, require_vault, Caller, SignedInstruction};
use crate::config::ProtocolConfig;
use crate::error::LendingError;
use crate::instruction::{
    BorrowAccounts, DepositAccounts, Instruction, LiquidateAccounts, Operation, RepayAccounts,
};
use crate::receipt::{PositionSnapshot, Receipt};

/// The lending protocol state machine
pub struct LendingProtocol {
    config: ProtocolConfig,
    risk: RiskEngine,
    ledger: PositionLedger,
    custody: Arc<dyn Custody>,
    oracle: Arc<dyn PriceOracle>,
    collateral_vault: Vault,
    loan_vault: Vault,
    journal: Option<Mutex<Journal>>,
    owner_locks: Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>,
}

impl LendingProtocol {
    /// Create a protocol with an empty, unjournaled ledger
    pub fn new(
        config: ProtocolConfig,
        custody: Arc<dyn Custody>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self, LendingError> {
        config.validate()?;

        let authority = Vault::derived_authority();
        let collateral_vault = Vault::new(config.collateral_vault(), authority, &config.collateral_asset);
        let loan_vault = Vault::new(config.loan_vault(), authority, &config.loan_asset);

        Ok(Self {
            risk: RiskEngine::new(config.risk_params()),
            ledger: PositionLedger::new(),
            config,
            custody,
            oracle,
            collateral_vault,
            loan_vault,
            journal: None,
            owner_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Attach the journal in `path` and rebuild the ledger from it
    pub fn with_journal(mut self, path: impl AsRef<Path>) -> Result<Self, LendingError> {
        let (journal, records) = Journal::open(path)?;

        let ledger = PositionLedger::new();
        let applied = replay(&ledger, &records)?;
        tracing::info!(
            records = applied,
            positions = ledger.len(),
            "Ledger rebuilt from journal"
        );

        self.ledger = ledger;
        self.journal = Some(Mutex::new(journal));
        Ok(self)
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn risk(&self) -> &RiskEngine {
        &self.risk
    }

    pub fn collateral_vault(&self) -> &Vault {
        &self.collateral_vault
    }

    pub fn loan_vault(&self) -> &Vault {
        &self.loan_vault
    }

    /// Last journal sequence, if a journal is attached
    pub fn journal_sequence(&self) -> Option<u64> {
        self.journal
            .as_ref()
            .map(|j| j.lock().unwrap_or_else(PoisonError::into_inner).last_sequence())
    }

    // === Account builders ===

    pub fn deposit_accounts(&self, owner: Address, user_collateral_account: Address) -> DepositAccounts {
        DepositAccounts {
            owner,
            user_collateral_account,
            collateral_vault: self.collateral_vault.address,
            collateral_position: PositionKind::Collateral.address_for(&owner),
        }
    }

    pub fn borrow_accounts(&self, owner: Address, user_loan_account: Address) -> BorrowAccounts {
        BorrowAccounts {
            owner,
            user_loan_account,
            loan_vault: self.loan_vault.address,
            collateral_position: PositionKind::Collateral.address_for(&owner),
            loan_position: PositionKind::Loan.address_for(&owner),
        }
    }

    pub fn repay_accounts(&self, owner: Address, user_loan_account: Address) -> RepayAccounts {
        RepayAccounts {
            owner,
            user_loan_account,
            loan_vault: self.loan_vault.address,
            loan_position: PositionKind::Loan.address_for(&owner),
        }
    }

    pub fn liquidate_accounts(
        &self,
        owner: Address,
        liquidator_loan_account: Address,
        liquidator_collateral_account: Address,
    ) -> LiquidateAccounts {
        LiquidateAccounts {
            owner,
            liquidator_loan_account,
            liquidator_collateral_account,
            loan_vault: self.loan_vault.address,
            collateral_vault: self.collateral_vault.address,
            collateral_position: PositionKind::Collateral.address_for(&owner),
            loan_position: PositionKind::Loan.address_for(&owner),
        }
    }

    // === Entry points ===

    /// Verify a signed instruction and run it
    pub async fn execute(&self, signed: &SignedInstruction) -> Result<Receipt, LendingError> {
        let caller = signed.verify().map_err(|e| {
            tracing::warn!(
                signer = %signed.signer.short(),
                operation = %signed.instruction.operation(),
                error = %e,
                "Signature rejected"
            );
            e
        })?;
        self.dispatch(&caller, &signed.instruction).await
    }

    /// Run an instruction on behalf of an already authenticated caller
    pub async fn dispatch(&self, caller: &Caller, instruction: &Instruction) -> Result<Receipt, LendingError> {
        match instruction {
            Instruction::InitializeCollateralAccount { owner } => {
                self.initialize_collateral_account(caller, owner).await
            }
            Instruction::InitializeLoanAccount { owner } => self.initialize_loan_account(caller, owner).await,
            Instruction::Deposit { accounts, amount } => self.deposit(caller, accounts, *amount).await,
            Instruction::Borrow { accounts, amount } => self.borrow(caller, accounts, *amount).await,
            Instruction::Repay { accounts, amount } => self.repay(caller, accounts, *amount).await,
            Instruction::Liquidate { accounts, amount } => self.liquidate(caller, accounts, *amount).await,
        }
    }

    /// Create the owner's zero-balance collateral position
    pub async fn initialize_collateral_account(
        &self,
        caller: &Caller,
        owner: &Address,
    ) -> Result<Receipt, LendingError> {
        let result = self.initialize(caller, owner, PositionKind::Collateral).await;
        self.observe(Operation::InitializeCollateralAccount, owner, result)
    }

    /// Create the owner's zero-principal loan position
    pub async fn initialize_loan_account(&self, caller: &Caller, owner: &Address) -> Result<Receipt, LendingError> {
        let result = self.initialize(caller, owner, PositionKind::Loan).await;
        self.observe(Operation::InitializeLoanAccount, owner, result)
    }

    /// Move collateral from the owner into the collateral vault
    pub async fn deposit(
        &self,
        caller: &Caller,
        accounts: &DepositAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let result = self.process_deposit(caller, accounts, amount).await;
        self.observe(Operation::Deposit, &accounts.owner, result)
    }

    /// Lend from the loan vault against deposited collateral
    pub async fn borrow(
        &self,
        caller: &Caller,
        accounts: &BorrowAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let result = self.process_borrow(caller, accounts, amount).await;
        self.observe(Operation::Borrow, &accounts.owner, result)
    }

    /// Return borrowed tokens to the loan vault
    pub async fn repay(
        &self,
        caller: &Caller,
        accounts: &RepayAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let result = self.process_repay(caller, accounts, amount).await;
        self.observe(Operation::Repay, &accounts.owner, result)
    }

    /// Repay part of an unhealthy position's debt in exchange for collateral
    ///
    /// Any authenticated caller may liquidate. The caller pays `amount` of
    /// the loan asset into the loan vault and receives collateral worth the
    /// repaid value plus the liquidation bonus.
    pub async fn liquidate(
        &self,
        caller: &Caller,
        accounts: &LiquidateAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let result = self.process_liquidate(caller, accounts, amount).await;
        self.observe(Operation::Liquidate, &accounts.owner, result)
    }

    // === Read model ===

    /// Current derived view of one owner's position
    pub async fn position(&self, owner: &Address) -> Result<PositionSnapshot, LendingError> {
        let prices = self.prices().await?;
        Ok(self.snapshot(owner, &prices))
    }

    /// Snapshots of every owner with at least one record
    pub async fn positions(&self) -> Result<Vec<PositionSnapshot>, LendingError> {
        let prices = self.prices().await?;
        Ok(self
            .ledger
            .owners()
            .iter()
            .map(|owner| self.snapshot(owner, &prices))
            .collect())
    }

    /// Positions currently eligible for liquidation
    pub async fn liquidatable_positions(&self) -> Result<Vec<PositionSnapshot>, LendingError> {
        let mut positions = self.positions().await?;
        positions.retain(PositionSnapshot::is_liquidatable);
        Ok(positions)
    }

    // === Operation bodies ===

    async fn initialize(&self, caller: &Caller, owner: &Address, kind: PositionKind) -> Result<Receipt, LendingError> {
        require_owner(caller, owner)?;

        let _guard = self.lock_owner(owner).await;
        if self.ledger.contains(owner, kind) {
            return Err(LendingError::AlreadyInitialized { owner: *owner, kind });
        }

        let correlation_id = new_correlation_id();
        let sequence = self.commit(&correlation_id, PositionEvent::Initialized { owner: *owner, kind })?;

        let operation = match kind {
            PositionKind::Collateral => Operation::InitializeCollateralAccount,
            PositionKind::Loan => Operation::InitializeLoanAccount,
        };
        Ok(self.receipt(operation, owner, correlation_id, sequence))
    }

    async fn process_deposit(
        &self,
        caller: &Caller,
        accounts: &DepositAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let owner = &accounts.owner;
        validate_amount(amount)?;
        require_owner(caller, owner)?;
        require_vault("collateral_vault", &accounts.collateral_vault, &self.collateral_vault)?;
        require_position(
            "collateral_position",
            &accounts.collateral_position,
            owner,
            PositionKind::Collateral,
        )?;

        let _guard = self.lock_owner(owner).await;
        self.ledger.read(owner, PositionKind::Collateral)?;
        require_token_account(
            self.custody.as_ref(),
            "user_collateral_account",
            &accounts.user_collateral_account,
            owner,
            &self.config.collateral_asset,
        )
        .await?;

        self.collateral_vault
            .pull_from_user(self.custody.as_ref(), &accounts.user_collateral_account, owner, amount)
            .await?;

        let correlation_id = new_correlation_id();
        let event = PositionEvent::Deposited { owner: *owner, amount };
        let sequence = match self.commit(&correlation_id, event) {
            Ok(sequence) => sequence,
            Err(e) => {
                self.refund_on_journal_failure(&e, &self.collateral_vault, &accounts.user_collateral_account, amount)
                    .await;
                return Err(e);
            }
        };

        Ok(self.receipt(Operation::Deposit, owner, correlation_id, sequence))
    }

    async fn process_borrow(
        &self,
        caller: &Caller,
        accounts: &BorrowAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let owner = &accounts.owner;
        validate_amount(amount)?;
        require_owner(caller, owner)?;
        require_vault("loan_vault", &accounts.loan_vault, &self.loan_vault)?;
        require_position(
            "collateral_position",
            &accounts.collateral_position,
            owner,
            PositionKind::Collateral,
        )?;
        require_position("loan_position", &accounts.loan_position, owner, PositionKind::Loan)?;

        let _guard = self.lock_owner(owner).await;
        let collateral = self.ledger.read(owner, PositionKind::Collateral)?.balance;
        let principal = self.ledger.read(owner, PositionKind::Loan)?.balance;
        require_token_account(
            self.custody.as_ref(),
            "user_loan_account",
            &accounts.user_loan_account,
            owner,
            &self.config.loan_asset,
        )
        .await?;

        let prices = self.prices().await?;
        self.risk.check_borrow(collateral, principal, amount, &prices)?;
        tracing::debug!(
            owner = %owner.short(),
            collateral = %collateral,
            principal = %principal,
            amount = %amount,
            "Borrow approved"
        );

        self.loan_vault.ensure_can_pay(self.custody.as_ref(), amount).await?;

        let correlation_id = new_correlation_id();
        let event = PositionEvent::Borrowed { owner: *owner, amount };
        let sequence = self.append_to_journal(&correlation_id, &event)?;

        if let Err(e) = self
            .loan_vault
            .push_to_user(self.custody.as_ref(), &accounts.user_loan_account, amount)
            .await
        {
            self.revert(&correlation_id, owner, sequence);
            return Err(e.into());
        }

        apply_event(&self.ledger, &event)?;
        Ok(self.receipt(Operation::Borrow, owner, correlation_id, sequence))
    }

    async fn process_repay(
        &self,
        caller: &Caller,
        accounts: &RepayAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let owner = &accounts.owner;
        validate_amount(amount)?;
        require_owner(caller, owner)?;
        require_vault("loan_vault", &accounts.loan_vault, &self.loan_vault)?;
        require_position("loan_position", &accounts.loan_position, owner, PositionKind::Loan)?;

        let _guard = self.lock_owner(owner).await;
        let principal = self.ledger.read(owner, PositionKind::Loan)?.balance;
        if amount > principal {
            return Err(LendingError::OverRepayment {
                requested: amount.value(),
                outstanding: principal.value(),
            });
        }
        require_token_account(
            self.custody.as_ref(),
            "user_loan_account",
            &accounts.user_loan_account,
            owner,
            &self.config.loan_asset,
        )
        .await?;

        self.loan_vault
            .pull_from_user(self.custody.as_ref(), &accounts.user_loan_account, owner, amount)
            .await?;

        let correlation_id = new_correlation_id();
        let sequence = match self.commit(&correlation_id, PositionEvent::Repaid { owner: *owner, amount }) {
            Ok(sequence) => sequence,
            Err(e) => {
                self.refund_on_journal_failure(&e, &self.loan_vault, &accounts.user_loan_account, amount)
                    .await;
                return Err(e);
            }
        };

        Ok(self.receipt(Operation::Repay, owner, correlation_id, sequence))
    }

    async fn process_liquidate(
        &self,
        caller: &Caller,
        accounts: &LiquidateAccounts,
        amount: Amount,
    ) -> Result<Receipt, LendingError> {
        let owner = &accounts.owner;
        let liquidator = caller.identity();
        validate_amount(amount)?;
        require_vault("loan_vault", &accounts.loan_vault, &self.loan_vault)?;
        require_vault("collateral_vault", &accounts.collateral_vault, &self.collateral_vault)?;
        require_position(
            "collateral_position",
            &accounts.collateral_position,
            owner,
            PositionKind::Collateral,
        )?;
        require_position("loan_position", &accounts.loan_position, owner, PositionKind::Loan)?;

        let _guard = self.lock_owner(owner).await;
        let collateral = self.ledger.read(owner, PositionKind::Collateral)?.balance;
        let principal = self.ledger.read(owner, PositionKind::Loan)?.balance;

        let prices = self.prices().await?;
        self.risk.check_liquidatable(collateral, principal, &prices)?;
        if amount > principal {
            return Err(LendingError::OverRepayment {
                requested: amount.value(),
                outstanding: principal.value(),
            });
        }

        require_token_account(
            self.custody.as_ref(),
            "liquidator_loan_account",
            &accounts.liquidator_loan_account,
            liquidator,
            &self.config.loan_asset,
        )
        .await?;
        require_token_account(
            self.custody.as_ref(),
            "liquidator_collateral_account",
            &accounts.liquidator_collateral_account,
            liquidator,
            &self.config.collateral_asset,
        )
        .await?;

        let seizure = self.risk.quote_seizure(amount, collateral, &prices);
        if !seizure.is_covered() {
            tracing::warn!(
                owner = %owner.short(),
                shortfall = %seizure.shortfall,
                "Collateral does not cover the liquidation bonus"
            );
        }

        // Both transfers must be possible before either happens
        self.collateral_vault
            .ensure_can_pay(self.custody.as_ref(), seizure.collateral_seized)
            .await?;
        self.loan_vault
            .pull_from_user(
                self.custody.as_ref(),
                &accounts.liquidator_loan_account,
                liquidator,
                amount,
            )
            .await?;

        let correlation_id = new_correlation_id();
        let event = PositionEvent::Liquidated {
            owner: *owner,
            liquidator: *liquidator,
            repaid: amount,
            collateral_seized: seizure.collateral_seized,
        };
        let sequence = match self.append_to_journal(&correlation_id, &event) {
            Ok(sequence) => sequence,
            Err(e) => {
                self.refund(&self.loan_vault, &accounts.liquidator_loan_account, amount)
                    .await;
                return Err(e);
            }
        };

        if !seizure.collateral_seized.is_zero() {
            if let Err(e) = self
                .collateral_vault
                .push_to_user(
                    self.custody.as_ref(),
                    &accounts.liquidator_collateral_account,
                    seizure.collateral_seized,
                )
                .await
            {
                self.refund(&self.loan_vault, &accounts.liquidator_loan_account, amount)
                    .await;
                self.revert(&correlation_id, owner, sequence);
                return Err(e.into());
            }
        }

        apply_event(&self.ledger, &event)?;

        tracing::info!(
            owner = %owner.short(),
            liquidator = %liquidator.short(),
            repaid = %amount,
            seized = %seizure.collateral_seized,
            bonus = %seizure.bonus,
            "Position liquidated"
        );

        let mut receipt = self.receipt(Operation::Liquidate, owner, correlation_id, sequence);
        receipt.seizure = Some(seizure);
        Ok(receipt)
    }

    // === Helpers ===

    /// Serialize operations on one owner
    async fn lock_owner(&self, owner: &Address) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.owner_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(*owner).or_default())
        };
        lock.lock_owned().await
    }

    async fn prices(&self) -> Result<Prices, LendingError> {
        let max_age = self.config.max_price_age_secs;
        let collateral = self
            .oracle
            .get_price(&self.config.collateral_asset)
            .await?
            .validate(max_age)?;
        let loan = self
            .oracle
            .get_price(&self.config.loan_asset)
            .await?
            .validate(max_age)?;
        Ok(Prices::new(collateral, loan))
    }

    /// Journal the event, then apply it to the ledger
    fn commit(&self, correlation_id: &str, event: PositionEvent) -> Result<Option<u64>, LendingError> {
        let sequence = self.append_to_journal(correlation_id, &event)?;
        apply_event(&self.ledger, &event)?;
        Ok(sequence)
    }

    /// Append the event to the journal without touching the ledger
    fn append_to_journal(&self, correlation_id: &str, event: &PositionEvent) -> Result<Option<u64>, LendingError> {
        match &self.journal {
            Some(journal) => {
                let mut journal = journal.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(Some(journal.append(correlation_id, event.clone())?.sequence))
            }
            None => Ok(None),
        }
    }

    /// Mark a journaled event whose payout failed
    fn revert(&self, correlation_id: &str, owner: &Address, sequence: Option<u64>) {
        let Some(sequence) = sequence else {
            return;
        };
        let event = PositionEvent::Reverted { owner: *owner, sequence };
        match self.append_to_journal(correlation_id, &event) {
            Ok(_) => tracing::warn!(
                owner = %owner.short(),
                sequence,
                "Journaled payout reverted"
            ),
            Err(e) => tracing::error!(
                owner = %owner.short(),
                sequence,
                error = %e,
                "Payout failed and could not be reverted in the journal"
            ),
        }
    }

    /// Return tokens pulled into `vault` when nothing was journaled
    async fn refund_on_journal_failure(&self, error: &LendingError, vault: &Vault, account: &Address, amount: Amount) {
        if matches!(error, LendingError::Journal(_)) {
            self.refund(vault, account, amount).await;
        }
    }

    async fn refund(&self, vault: &Vault, account: &Address, amount: Amount) {
        match vault.push_to_user(self.custody.as_ref(), account, amount).await {
            Ok(()) => tracing::warn!(
                account = %account.short(),
                amount = %amount,
                "Transfer refunded"
            ),
            Err(e) => tracing::error!(
                account = %account.short(),
                amount = %amount,
                error = %e,
                "Refund failed, custody and ledger disagree"
            ),
        }
    }

    fn receipt(&self, operation: Operation, owner: &Address, correlation_id: String, sequence: Option<u64>) -> Receipt {
        Receipt {
            operation,
            owner: *owner,
            correlation_id,
            sequence,
            collateral: self.ledger.get(owner, PositionKind::Collateral).map(|r| r.balance),
            principal: self.ledger.get(owner, PositionKind::Loan).map(|r| r.balance),
            seizure: None,
        }
    }

    fn snapshot(&self, owner: &Address, prices: &Prices) -> PositionSnapshot {
        let collateral = self.ledger.get(owner, PositionKind::Collateral).map(|r| r.balance);
        let principal = self.ledger.get(owner, PositionKind::Loan).map(|r| r.balance);
        let collateral_or_zero = collateral.unwrap_or(Amount::ZERO);

        PositionSnapshot {
            owner: *owner,
            collateral,
            principal,
            max_borrowable: self.risk.max_borrowable(collateral_or_zero, prices),
            health_factor: principal.and_then(|p| self.risk.health_factor(collateral_or_zero, p, prices)),
            status: self.risk.status(collateral, principal, prices),
        }
    }

    fn observe(
        &self,
        operation: Operation,
        owner: &Address,
        result: Result<Receipt, LendingError>,
    ) -> Result<Receipt, LendingError> {
        match &result {
            Ok(receipt) => tracing::info!(
                operation = %operation,
                owner = %owner.short(),
                correlation_id = %receipt.correlation_id,
                "Operation committed"
            ),
            Err(e) if e.is_invariant_violation() => tracing::error!(
                operation = %operation,
                owner = %owner.short(),
                error = %e,
                "Invariant violation"
            ),
            Err(e) => tracing::warn!(
                operation = %operation,
                owner = %owner.short(),
                error = %e,
                "Operation rejected"
            ),
        }
        result
    }
}

/// Amounts are positive whole base units
fn validate_amount(amount: Amount) -> Result<(), LendingError> {
    if amount.is_zero() {
        return Err(LendingError::InvalidAmount("amount must be greater than zero".to_string()));
    }
    if !amount.is_whole() {
        return Err(LendingError::InvalidAmount(format!(
            "{} is not a whole number of base units",
            amount
        )));
    }
    Ok(())
}

fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
