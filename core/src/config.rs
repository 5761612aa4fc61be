//! Configuration types for statedb

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::LedgerError;
use crate::traits::LedgerResult;

/// Main ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding the genesis file and the ledger file
    pub data_dir: PathBuf,

    /// Genesis file name, relative to `data_dir`
    pub genesis_file: String,

    /// Ledger file name, relative to `data_dir`
    pub ledger_file: String,

    /// Durability of each appended record
    pub sync_mode: SyncMode,

    /// Logging level
    pub log_level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./database"),
            genesis_file: "genesis.json".to_string(),
            ledger_file: "tx.db".to_string(),
            sync_mode: SyncMode::default(),
            log_level: "info".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Configuration rooted at `data_dir` with default file names
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.data_dir.join(&self.genesis_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> LedgerResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LedgerError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.genesis_file.is_empty() {
            return Err(LedgerError::ConfigError("genesis_file is empty".into()));
        }
        if self.ledger_file.is_empty() {
            return Err(LedgerError::ConfigError("ledger_file is empty".into()));
        }
        if self.genesis_file == self.ledger_file {
            return Err(LedgerError::ConfigError(
                "genesis_file and ledger_file must differ".into(),
            ));
        }
        Ok(())
    }
}

/// How far an append is pushed towards the disk before it reports success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Flush user-space buffers to the OS
    Flush,
    /// Flush and `fsync` the file data
    #[default]
    Sync,
}
