//! Genesis snapshot for the ledger

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use statedb_core::{
    Account, Amount, Balances, Hash, LedgerConfig, LedgerError, LedgerResult,
};
use statedb_state::FileLedgerStore;
use std::path::Path;
use tracing::info;

/// Immutable starting point of the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Creation time, RFC 3339 when written by this crate
    pub genesis_time: String,
    /// Chain identifier
    pub chain_id: String,
    /// Initial balances
    pub balances: Balances,
}

impl Genesis {
    /// Create a genesis stamped with the current time and no balances
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            genesis_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            chain_id: chain_id.into(),
            balances: Balances::new(),
        }
    }

    /// Add an allocation
    pub fn with_allocation(mut self, account: impl Into<Account>, balance: u64) -> Self {
        self.balances.insert(account.into(), Amount::new(balance));
        self
    }

    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::GenesisUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let genesis = Self::from_json(&content)?;
        info!(
            "Loaded genesis for chain {} with {} account(s)",
            genesis.chain_id,
            genesis.balances.len()
        );
        Ok(genesis)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::InvalidGenesis(e.to_string()))
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::SerializationError(e.to_string()))
    }

    /// Write to a JSON file. Only bootstrapping writes genesis.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> LedgerResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// `genesis_time` as a UTC timestamp, if it is RFC 3339
    pub fn genesis_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.genesis_time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Sum of the initial balances
    pub fn total_supply(&self) -> LedgerResult<Amount> {
        self.balances
            .iter()
            .try_fold(Amount::ZERO, |acc, (account, balance)| {
                acc.checked_add(*balance)
                    .ok_or_else(|| LedgerError::BalanceOverflow {
                        account: account.clone(),
                    })
            })
    }

    /// Digest of the canonical (compact JSON) encoding
    pub fn hash(&self) -> LedgerResult<Hash> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Hash::from_bytes(*blake3::hash(&bytes).as_bytes()))
    }
}

/// Lay out a fresh data directory: genesis file plus an empty ledger.
///
/// An existing genesis is only replaced with `force`. An existing ledger is
/// always kept, since it is only meaningful against the genesis it was built on.
pub fn bootstrap(config: &LedgerConfig, genesis: &Genesis, force: bool) -> LedgerResult<()> {
    std::fs::create_dir_all(&config.data_dir)?;

    let genesis_path = config.genesis_path();
    if genesis_path.exists() && !force {
        return Err(LedgerError::AlreadyExists(genesis_path));
    }
    genesis.save(&genesis_path)?;
    info!("Wrote genesis to {}", genesis_path.display());

    match FileLedgerStore::create(config.ledger_path()) {
        Ok(()) | Err(LedgerError::AlreadyExists(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
