//! Ledger: genesis + replayed log + live state engine behind one lock

use parking_lot::Mutex;
use statedb_core::{
    Account, Amount, Balances, LedgerConfig, LedgerError, LedgerResult, LedgerStore, Tx,
};
use statedb_state::{compute_state_root, BalanceSnapshot, FileLedgerStore};
use tracing::{info, warn};

use crate::engine::StateEngine;
use crate::genesis::Genesis;

struct LedgerInner<S> {
    engine: StateEngine,
    store: S,
    /// Records in the durable log
    records: u64,
}

/// Account ledger rebuilt from genesis plus the durable log.
///
/// A single mutex covers balances, the commit buffer and the store, so `add`
/// and `persist` never interleave.
pub struct Ledger<S: LedgerStore = FileLedgerStore> {
    genesis: Genesis,
    inner: Mutex<LedgerInner<S>>,
}

impl Ledger<FileLedgerStore> {
    /// Load genesis and replay the ledger file named by `config`
    pub fn open_with_config(config: &LedgerConfig) -> LedgerResult<Self> {
        let genesis = Genesis::load(config.genesis_path())?;
        let store = FileLedgerStore::open(config.ledger_path(), config.sync_mode)?;
        Self::open(genesis, store)
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Seed from genesis and replay every record in `store`.
    ///
    /// Fails without a ledger if any record is corrupt or does not apply.
    pub fn open(genesis: Genesis, mut store: S) -> LedgerResult<Self> {
        info!("Replaying ledger for chain {}", genesis.chain_id);

        let mut engine = StateEngine::replaying(genesis.balances.clone());
        let records = engine.replay(store.records()?)?;
        info!(
            "Chain {} live at state root {}",
            genesis.chain_id,
            compute_state_root(engine.balances())
        );

        Ok(Self {
            genesis,
            inner: Mutex::new(LedgerInner {
                engine,
                store,
                records,
            }),
        })
    }

    pub fn genesis(&self) -> &Genesis {
        &self.genesis
    }

    /// Validate and apply `tx`, then queue it for the next persist
    pub fn add(&self, tx: Tx) -> LedgerResult<()> {
        self.inner.lock().engine.add(tx)
    }

    /// Write queued transactions to the store in submission order.
    ///
    /// Returns the number of records written. On failure the unwritten
    /// transactions stay queued for the next call.
    pub fn persist(&self) -> LedgerResult<usize> {
        let mut inner = self.inner.lock();
        let LedgerInner {
            engine,
            store,
            records,
        } = &mut *inner;

        match engine.mempool_mut().drain_into(store) {
            Ok(written) => {
                *records += written as u64;
                if written > 0 {
                    info!("Persisted {} transaction(s), {} in ledger", written, records);
                }
                Ok(written)
            }
            Err(e) => {
                if let LedgerError::PersistFailure { persisted, .. } = &e {
                    *records += *persisted as u64;
                }
                warn!("Persist failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn balance(&self, account: &Account) -> Amount {
        self.inner.lock().engine.balance(account)
    }

    pub fn balances(&self) -> Balances {
        self.inner.lock().engine.balances().clone()
    }

    /// Transactions accepted but not yet persisted, oldest first
    pub fn pending(&self) -> Vec<Tx> {
        self.inner.lock().engine.mempool().to_vec()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().engine.mempool().len()
    }

    /// Records in the durable log
    pub fn records(&self) -> u64 {
        self.inner.lock().records
    }

    /// Balances with their state root, taken under the lock
    pub fn snapshot(&self) -> BalanceSnapshot {
        let inner = self.inner.lock();
        BalanceSnapshot::new(inner.engine.balances().clone(), inner.records)
    }
}
