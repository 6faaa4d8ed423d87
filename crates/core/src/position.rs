//! Position kinds tracked per user

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::address::Address;

/// The two independent per-user records of the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    /// Deposited collateral balance
    Collateral,

    /// Outstanding borrowed principal
    Loan,
}

impl PositionKind {
    /// Seed used to derive the record address
    pub fn seed(&self) -> &'static [u8] {
        match self {
            PositionKind::Collateral => b"collateral",
            PositionKind::Loan => b"loan",
        }
    }

    /// Address of the `kind` record belonging to `owner`
    pub fn address_for(&self, owner: &Address) -> Address {
        Address::derive(&[self.seed(), owner.as_bytes()])
    }
}
