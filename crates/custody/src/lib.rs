//! Lending Custody
//!
//! Token movement is owned by an external custody facility. This crate
//! defines the collaborator interface the protocol consumes (`Custody`),
//! the vault handle wrapping the two protocol-mediated directions
//! (`Vault::pull_from_user`, `Vault::push_to_user`), and an in-memory
//! implementation used by tests and tooling.

mod error;
mod memory;
mod types;
mod vault;

pub use error::CustodyError;
pub use memory::InMemoryCustody;
pub use types::{Custody, TokenAccount};
pub use vault::Vault;
