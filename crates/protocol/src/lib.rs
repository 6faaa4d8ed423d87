//! Lending Protocol - Position operations
//!
//! The entry points of the protocol: account initialization, deposit,
//! borrow, repay and liquidate. Each operation authenticates the caller,
//! checks every supplied account reference, consults the risk engine,
//! moves tokens through the vaults and only then commits the ledger.
//!
//! ```text
//! SignedInstruction
//!        │ verify signature
//!        ▼
//! ┌─────────────────┐
//! │ Authorization   │──► AccountMismatch / Unauthorized
//! └────────┬────────┘
//!          │ lock owner
//!          ▼
//! ┌─────────────────┐
//! │ Risk Engine     │──► ExceedsBorrowLimit / PositionHealthy
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Vault transfer  │──► InsufficientFunds / VaultInsufficient
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Journal + Ledger│
//! └─────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod receipt;

pub use auth::{Caller, Keypair, SignedInstruction};
pub use config::ProtocolConfig;
pub use error::LendingError;
pub use instruction::{BorrowAccounts, DepositAccounts, Instruction, LiquidateAccounts, Operation, RepayAccounts};
pub use processor::LendingProtocol;
pub use receipt::{PositionSnapshot, Receipt};
