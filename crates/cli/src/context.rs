//! Application context - wires the protocol to a data directory

use lending_custody::InMemoryCustody;
use lending_oracle::ParityOracle;
use lending_protocol::{Keypair, LendingProtocol, ProtocolConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "LENDING_CONFIG";
/// Environment variable holding the operator key seed (hex)
pub const KEY_ENV: &str = "LENDING_KEY";

/// Application context - protocol state rebuilt from the journal
pub struct AppContext {
    pub protocol: LendingProtocol,
    pub keypair: Option<Keypair>,
    journal_path: PathBuf,
}

impl AppContext {
    /// Open the data directory and replay its journal
    ///
    /// Token custody is not persisted by this tool, so the context carries
    /// an empty in-memory custody and prices every asset at parity; it is
    /// meant for inspecting positions, not for moving funds.
    pub fn new(data_path: impl AsRef<Path>, config: ProtocolConfig) -> Result<Self, anyhow::Error> {
        let journal_path = Self::journal_dir(data_path);
        std::fs::create_dir_all(&journal_path)?;

        let protocol = LendingProtocol::new(
            config,
            Arc::new(InMemoryCustody::new()),
            Arc::new(ParityOracle),
        )?
        .with_journal(&journal_path)?;

        // Operator key from env var, if present
        let keypair = match std::env::var(KEY_ENV) {
            Ok(seed) => Some(Keypair::from_hex(&seed)?),
            Err(_) => None,
        };

        Ok(Self {
            protocol,
            keypair,
            journal_path,
        })
    }

    /// Journal directory inside a data directory
    pub fn journal_dir(data_path: impl AsRef<Path>) -> PathBuf {
        data_path.as_ref().join("journal")
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }
}

/// Load the configuration from `path`, then from `LENDING_CONFIG`, falling
/// back to defaults
pub fn load_config(path: Option<&Path>) -> Result<ProtocolConfig, anyhow::Error> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

    match path.map(Path::to_path_buf).or(from_env) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            Ok(ProtocolConfig::from_file(&path)?)
        }
        None => Ok(ProtocolConfig::default()),
    }
}
