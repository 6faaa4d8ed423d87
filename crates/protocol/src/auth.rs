//! Caller authentication and account linkage checks
//!
//! A caller is identified by an ed25519 public key. The only ways to obtain
//! a [`Caller`] are verifying a [`SignedInstruction`] or holding the
//! [`Keypair`] in-process, so an operation can trust the identity it is
//! handed.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use lending_core::{Address, PositionKind};
use lending_custody::{Custody, Vault};
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::instruction::Instruction;

/// Authenticated identity of the party invoking an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    identity: Address,
}

impl Caller {
    pub fn identity(&self) -> &Address {
        &self.identity
    }
}

/// Ed25519 signing key of a user or operator
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random signing key
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed (hex-encoded)
    pub fn from_hex(hex_seed: &str) -> Result<Self, LendingError> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| LendingError::Unauthorized(format!("invalid key hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| LendingError::Unauthorized("key must be 32 bytes".to_string()))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Export the seed as hex (for storage)
    pub fn seed_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Public key, used as the identity address
    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Identity of the key holder
    pub fn caller(&self) -> Caller {
        Caller {
            identity: self.address(),
        }
    }

    /// Sign an instruction for submission
    pub fn sign(&self, instruction: Instruction) -> SignedInstruction {
        let signature = self.signing_key.sign(&instruction.signing_bytes());
        SignedInstruction {
            instruction,
            signer: self.address(),
            signature: hex::encode(signature.to_bytes()),
        }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Instruction together with the signer's public key and signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInstruction {
    pub instruction: Instruction,
    /// Signer public key
    pub signer: Address,
    /// Ed25519 signature over the canonical instruction JSON (hex-encoded)
    pub signature: String,
}

impl SignedInstruction {
    /// Verify the signature and return the authenticated caller
    pub fn verify(&self) -> Result<Caller, LendingError> {
        let sig_bytes = hex::decode(&self.signature)
            .map_err(|e| LendingError::Unauthorized(format!("invalid signature hex: {}", e)))?;
        let sig_array: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| LendingError::Unauthorized("signature must be 64 bytes".to_string()))?;

        let verifying_key = VerifyingKey::from_bytes(self.signer.as_bytes()).map_err(|e| {
            LendingError::Unauthorized(format!("invalid public key {}: {}", self.signer, e))
        })?;

        verifying_key
            .verify(&self.instruction.signing_bytes(), &Signature::from_bytes(&sig_array))
            .map_err(|e| {
                LendingError::Unauthorized(format!("signature from {} failed: {}", self.signer, e))
            })?;

        Ok(Caller {
            identity: self.signer,
        })
    }
}

/// Caller must be the position owner
pub fn require_owner(caller: &Caller, owner: &Address) -> Result<(), LendingError> {
    if caller.identity() != owner {
        return Err(LendingError::Unauthorized(format!(
            "{} cannot act on positions of {}",
            caller.identity(),
            owner
        )));
    }
    Ok(())
}

/// Supplied vault reference must be the configured vault
pub fn require_vault(field: &'static str, supplied: &Address, vault: &Vault) -> Result<(), LendingError> {
    if *supplied != vault.address {
        return Err(LendingError::mismatch(field, vault.address, supplied));
    }
    Ok(())
}

/// Supplied position reference must be the address derived for `owner`
pub fn require_position(
    field: &'static str,
    supplied: &Address,
    owner: &Address,
    kind: PositionKind,
) -> Result<(), LendingError> {
    let expected = kind.address_for(owner);
    if *supplied != expected {
        return Err(LendingError::mismatch(field, expected, supplied));
    }
    Ok(())
}

/// Supplied token account must exist, be controlled by `controller` and
/// hold `asset`
pub async fn require_token_account(
    custody: &dyn Custody,
    field: &'static str,
    account: &Address,
    controller: &Address,
    asset: &str,
) -> Result<(), LendingError> {
    let token_account = custody
        .account(account)
        .await
        .map_err(|_| LendingError::mismatch(field, "an open token account", account))?;

    if token_account.owner != *controller {
        return Err(LendingError::mismatch(field, controller, token_account.owner));
    }
    if !token_account.asset.eq_ignore_ascii_case(asset) {
        return Err(LendingError::mismatch(field, asset.to_uppercase(), token_account.asset));
    }
    Ok(())
}
