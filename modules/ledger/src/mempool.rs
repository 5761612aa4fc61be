//! Commit buffer for accepted, not yet persisted transactions

use statedb_core::{LedgerError, LedgerResult, LedgerStore, Tx};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// FIFO of transactions waiting to be written to the ledger store
#[derive(Debug, Clone, Default)]
pub struct CommitBuffer {
    queue: VecDeque<Tx>,
}

impl CommitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transaction at the tail
    pub fn push(&mut self, tx: Tx) {
        self.queue.push_back(tx);
    }

    pub fn front(&self) -> Option<&Tx> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tx> {
        self.queue.iter()
    }

    /// Copy of the queued transactions in order
    pub fn to_vec(&self) -> Vec<Tx> {
        self.queue.iter().cloned().collect()
    }

    /// Write queued transactions to `store` in order.
    ///
    /// The batch is the queue as it stands on entry. Each entry leaves the
    /// queue only after its append succeeded. The first failed append stops
    /// the drain; that entry and everything behind it stay queued.
    ///
    /// Returns the number of records written.
    pub fn drain_into<S: LedgerStore + ?Sized>(&mut self, store: &mut S) -> LedgerResult<usize> {
        let batch = self.queue.len();

        for persisted in 0..batch {
            let Some(tx) = self.queue.front() else {
                break;
            };

            if let Err(e) = store.append(tx) {
                warn!(
                    "Persist stopped after {} of {} record(s): {}",
                    persisted, batch, e
                );
                return Err(LedgerError::PersistFailure {
                    persisted,
                    remaining: self.queue.len(),
                    source: Box::new(e),
                });
            }

            self.queue.pop_front();
        }

        debug!("Persisted {} record(s)", batch);
        Ok(batch)
    }
}
