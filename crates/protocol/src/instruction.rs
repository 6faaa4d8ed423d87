//! Protocol instructions
//!
//! An instruction names the operation, the owner whose position it touches
//! and every account the operation reads or moves funds through. Account
//! references are checked against the derived and configured addresses
//! before anything else happens.

use lending_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Operation kinds, used in receipts and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    InitializeCollateralAccount,
    InitializeLoanAccount,
    Deposit,
    Borrow,
    Repay,
    Liquidate,
}

/// Accounts referenced by a deposit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAccounts {
    pub owner: Address,
    /// Owner's collateral-asset token account
    pub user_collateral_account: Address,
    pub collateral_vault: Address,
    pub collateral_position: Address,
}

/// Accounts referenced by a borrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowAccounts {
    pub owner: Address,
    /// Owner's loan-asset token account
    pub user_loan_account: Address,
    pub loan_vault: Address,
    pub collateral_position: Address,
    pub loan_position: Address,
}

/// Accounts referenced by a repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepayAccounts {
    pub owner: Address,
    pub user_loan_account: Address,
    pub loan_vault: Address,
    pub loan_position: Address,
}

/// Accounts referenced by a liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidateAccounts {
    /// Owner of the position being liquidated
    pub owner: Address,
    /// Liquidator's loan-asset account, source of the repayment
    pub liquidator_loan_account: Address,
    /// Liquidator's collateral-asset account, receives the seized collateral
    pub liquidator_collateral_account: Address,
    pub loan_vault: Address,
    pub collateral_vault: Address,
    pub collateral_position: Address,
    pub loan_position: Address,
}

/// A single protocol instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    InitializeCollateralAccount { owner: Address },
    InitializeLoanAccount { owner: Address },
    Deposit { accounts: DepositAccounts, amount: Amount },
    Borrow { accounts: BorrowAccounts, amount: Amount },
    Repay { accounts: RepayAccounts, amount: Amount },
    Liquidate { accounts: LiquidateAccounts, amount: Amount },
}

impl Instruction {
    pub fn operation(&self) -> Operation {
        match self {
            Instruction::InitializeCollateralAccount { .. } => Operation::InitializeCollateralAccount,
            Instruction::InitializeLoanAccount { .. } => Operation::InitializeLoanAccount,
            Instruction::Deposit { .. } => Operation::Deposit,
            Instruction::Borrow { .. } => Operation::Borrow,
            Instruction::Repay { .. } => Operation::Repay,
            Instruction::Liquidate { .. } => Operation::Liquidate,
        }
    }

    /// Owner of the position the instruction touches
    pub fn owner(&self) -> &Address {
        match self {
            Instruction::InitializeCollateralAccount { owner }
            | Instruction::InitializeLoanAccount { owner } => owner,
            Instruction::Deposit { accounts, .. } => &accounts.owner,
            Instruction::Borrow { accounts, .. } => &accounts.owner,
            Instruction::Repay { accounts, .. } => &accounts.owner,
            Instruction::Liquidate { accounts, .. } => &accounts.owner,
        }
    }

    /// Canonical bytes covered by a signature
    pub fn signing_bytes(&self) -> Vec<u8> {
        // Derived Serialize over addresses, amounts and strings cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }
}
