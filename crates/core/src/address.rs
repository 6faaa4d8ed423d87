//! Address - 32-byte identifiers for users, positions and token accounts
//!
//! User identities are ed25519 public keys. Protocol-owned records use
//! addresses derived from seeds, so any party can recompute where a
//! user's position lives without a lookup table.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain separator mixed into every derived address
const DERIVATION_DOMAIN: &[u8] = b"lending-protocol/derived-address";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address hex: {0}")]
    InvalidHex(String),

    #[error("Address must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 32-byte address, displayed as lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive a deterministic address from a list of seeds.
    ///
    /// # Example
    /// ```
    /// use lending_core::Address;
    ///
    /// let owner = Address::new([7u8; 32]);
    /// let a = Address::derive(&[b"collateral", owner.as_bytes()]);
    /// let b = Address::derive(&[b"collateral", owner.as_bytes()]);
    /// assert_eq!(a, b);
    /// assert_ne!(a, Address::derive(&[b"loan", owner.as_bytes()]));
    /// ```
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DERIVATION_DOMAIN);
        for seed in seeds {
            // Length prefix keeps ["ab", "c"] and ["a", "bc"] apart
            hasher.update((seed.len() as u32).to_le_bytes());
            hasher.update(seed);
        }
        Self(hasher.finalize().into())
    }

    /// Short form for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let len = bytes.len();
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength(len))?;
        Ok(Self(array))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
