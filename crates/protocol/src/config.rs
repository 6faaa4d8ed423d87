//! Protocol configuration
//!
//! Risk ratios, asset codes and vault addresses are read from a JSON file;
//! every field has a default so a partial file is valid.

use lending_core::{Address, PositionKind};
use lending_risk::RiskParams;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LendingError;

/// Seed prefixes of the derived vault token accounts, one per role
const COLLATERAL_VAULT_SEED: &[u8] = b"collateral-vault";
const LOAN_VAULT_SEED: &[u8] = b"loan-vault";

/// Configuration of one lending market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    // === Risk ===
    /// Fraction of collateral value that may be borrowed
    #[serde(default = "default_ltv_ratio")]
    pub ltv_ratio: Decimal,

    /// Debt-to-collateral ratio above which a position is liquidatable
    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: Decimal,

    /// Extra collateral paid to liquidators, as a fraction of the repaid value
    #[serde(default = "default_liquidation_bonus")]
    pub liquidation_bonus: Decimal,

    // === Assets ===
    /// Asset deposited as collateral
    #[serde(default = "default_collateral_asset")]
    pub collateral_asset: String,

    /// Asset lent out
    #[serde(default = "default_loan_asset")]
    pub loan_asset: String,

    // === Vaults ===
    /// Collateral vault token account (derived from the asset when absent)
    #[serde(default)]
    pub collateral_vault: Option<Address>,

    /// Loan vault token account (derived from the asset when absent)
    #[serde(default)]
    pub loan_vault: Option<Address>,

    // === Oracle ===
    /// Oldest price accepted by risk checks
    #[serde(default = "default_max_price_age_secs")]
    pub max_price_age_secs: u64,
}

fn default_ltv_ratio() -> Decimal {
    RiskParams::default().ltv_ratio
}

fn default_liquidation_threshold() -> Decimal {
    RiskParams::default().liquidation_threshold
}

fn default_liquidation_bonus() -> Decimal {
    RiskParams::default().liquidation_bonus
}

fn default_collateral_asset() -> String {
    "SOL".to_string()
}

fn default_loan_asset() -> String {
    "USDC".to_string()
}

fn default_max_price_age_secs() -> u64 {
    60
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ltv_ratio: default_ltv_ratio(),
            liquidation_threshold: default_liquidation_threshold(),
            liquidation_bonus: default_liquidation_bonus(),
            collateral_asset: default_collateral_asset(),
            loan_asset: default_loan_asset(),
            collateral_vault: None,
            loan_vault: None,
            max_price_age_secs: default_max_price_age_secs(),
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LendingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LendingError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LendingError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Risk parameters for the engine
    pub fn risk_params(&self) -> RiskParams {
        RiskParams {
            ltv_ratio: self.ltv_ratio,
            liquidation_threshold: self.liquidation_threshold,
            liquidation_bonus: self.liquidation_bonus,
        }
    }

    /// Collateral vault token account
    pub fn collateral_vault(&self) -> Address {
        self.collateral_vault
            .unwrap_or_else(|| Self::derived_vault(PositionKind::Collateral, &self.collateral_asset))
    }

    /// Loan vault token account
    pub fn loan_vault(&self) -> Address {
        self.loan_vault
            .unwrap_or_else(|| Self::derived_vault(PositionKind::Loan, &self.loan_asset))
    }

    /// Vault account address derived from the vault's role and asset code
    ///
    /// The role is part of the seed, so a market lending the asset it takes
    /// as collateral still gets two vaults.
    pub fn derived_vault(role: PositionKind, asset: &str) -> Address {
        let seed = match role {
            PositionKind::Collateral => COLLATERAL_VAULT_SEED,
            PositionKind::Loan => LOAN_VAULT_SEED,
        };
        Address::derive(&[seed, asset.to_uppercase().as_bytes()])
    }

    /// Reject inconsistent parameters
    pub fn validate(&self) -> Result<(), LendingError> {
        self.risk_params()
            .validate()
            .map_err(|e| LendingError::Config(e.to_string()))?;

        if self.collateral_asset.trim().is_empty() || self.loan_asset.trim().is_empty() {
            return Err(LendingError::Config("asset codes must not be empty".to_string()));
        }
        if self.collateral_vault() == self.loan_vault() {
            return Err(LendingError::Config(
                "collateral and loan vault must differ".to_string(),
            ));
        }
        Ok(())
    }
}
