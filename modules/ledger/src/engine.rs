//! State engine: validated application of transactions to balances

use statedb_core::{Account, Amount, Balances, LedgerError, LedgerResult, Tx};
use tracing::{debug, info};

use crate::mempool::CommitBuffer;

/// Lifecycle of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Applying records from the log; `add` is refused
    Replaying,
    /// Accepting new transactions
    Live,
}

/// In-memory balances plus the commit buffer of accepted transactions
#[derive(Debug, Clone)]
pub struct StateEngine {
    balances: Balances,
    mempool: CommitBuffer,
    phase: EnginePhase,
}

impl StateEngine {
    /// Seed from genesis balances, ready to replay the log
    pub fn replaying(genesis_balances: Balances) -> Self {
        Self {
            balances: genesis_balances,
            mempool: CommitBuffer::new(),
            phase: EnginePhase::Replaying,
        }
    }

    /// Apply every record in order, then go live.
    ///
    /// Any failure aborts: decode errors come back as they are, apply errors
    /// are wrapped in [`LedgerError::ReplayFailed`]. Returns the number of
    /// records applied.
    pub fn replay<I>(&mut self, records: I) -> LedgerResult<u64>
    where
        I: IntoIterator<Item = LedgerResult<Tx>>,
    {
        let mut applied = 0u64;
        for record in records {
            let tx = record?;
            self.apply(&tx).map_err(|e| LedgerError::ReplayFailed {
                index: applied,
                source: Box::new(e),
            })?;
            applied += 1;
        }

        self.go_live();
        info!("Replayed {} record(s), {} account(s)", applied, self.balances.len());
        Ok(applied)
    }

    /// Leave the replaying phase. Has no effect once live.
    pub fn go_live(&mut self) {
        self.phase = EnginePhase::Live;
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Balance of `account`; absent accounts hold zero
    pub fn balance(&self, account: &Account) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn mempool(&self) -> &CommitBuffer {
        &self.mempool
    }

    pub fn mempool_mut(&mut self) -> &mut CommitBuffer {
        &mut self.mempool
    }

    /// Apply one transaction to the balances.
    ///
    /// Every check runs before the first write, so an error leaves the
    /// balances untouched.
    pub fn apply(&mut self, tx: &Tx) -> LedgerResult<()> {
        if tx.is_reward() {
            let credited = Self::credit(&tx.to, self.balance(&tx.to), tx.value)?;
            self.balances.insert(tx.to.clone(), credited);
            return Ok(());
        }

        let available = self.balance(&tx.from);
        let debited = available
            .checked_sub(tx.value)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                account: tx.from.clone(),
                required: tx.value,
                available,
            })?;

        let recipient = if tx.from == tx.to {
            debited
        } else {
            self.balance(&tx.to)
        };
        let credited = Self::credit(&tx.to, recipient, tx.value)?;

        self.balances.insert(tx.from.clone(), debited);
        self.balances.insert(tx.to.clone(), credited);
        Ok(())
    }

    /// Accept a live transaction: apply it and queue it for persistence
    pub fn add(&mut self, tx: Tx) -> LedgerResult<()> {
        if self.phase != EnginePhase::Live {
            return Err(LedgerError::NotLive);
        }

        self.apply(&tx)?;
        debug!("Accepted {}", tx);
        self.mempool.push(tx);
        Ok(())
    }

    fn credit(account: &Account, balance: Amount, value: Amount) -> LedgerResult<Amount> {
        balance
            .checked_add(value)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: account.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(entries: &[(&str, u64)]) -> StateEngine {
        let balances = entries
            .iter()
            .map(|(name, value)| (Account::from(*name), Amount::new(*value)))
            .collect();
        let mut engine = StateEngine::replaying(balances);
        engine.go_live();
        engine
    }

    fn balance(engine: &StateEngine, name: &str) -> u64 {
        engine.balance(&Account::from(name)).0
    }

    #[test]
    fn test_transfer() {
        let mut engine = live(&[("alice", 1000)]);
        engine.add(Tx::transfer("alice", "bob", 200)).unwrap();

        assert_eq!(balance(&engine, "alice"), 800);
        assert_eq!(balance(&engine, "bob"), 200);
        assert_eq!(engine.mempool().len(), 1);
    }

    #[test]
    fn test_atomic_rejection() {
        let mut engine = live(&[("alice", 100), ("bob", 7)]);
        let before = engine.balances().clone();

        let result = engine.add(Tx::transfer("alice", "bob", 150));
        match result {
            Err(LedgerError::InsufficientBalance {
                account,
                required,
                available,
            }) => {
                assert_eq!(account, Account::from("alice"));
                assert_eq!(required, Amount::new(150));
                assert_eq!(available, Amount::new(100));
            }
            other => panic!("expected insufficient balance, got {:?}", other),
        }

        assert_eq!(engine.balances(), &before);
        assert!(engine.mempool().is_empty());
    }

    #[test]
    fn test_absent_sender_has_zero() {
        let mut engine = live(&[]);
        assert!(matches!(
            engine.add(Tx::transfer("ghost", "bob", 1)),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(engine.balances().is_empty());
    }

    #[test]
    fn test_reward_exemption() {
        let mut engine = live(&[("bob", 5)]);
        engine.add(Tx::reward("nobody", "bob", 700)).unwrap();

        assert_eq!(balance(&engine, "bob"), 705);
        assert!(!engine.balances().contains_key(&Account::from("nobody")));
    }

    #[test]
    fn test_self_transfer_is_net_zero() {
        let mut engine = live(&[("alice", 10)]);
        engine.add(Tx::transfer("alice", "alice", 10)).unwrap();
        assert_eq!(balance(&engine, "alice"), 10);

        assert!(engine.add(Tx::transfer("alice", "alice", 11)).is_err());
    }

    #[test]
    fn test_overflow_rejected() {
        let mut engine = live(&[("alice", 10), ("whale", u64::MAX)]);
        let before = engine.balances().clone();

        assert!(matches!(
            engine.add(Tx::transfer("alice", "whale", 1)),
            Err(LedgerError::BalanceOverflow { .. })
        ));
        assert!(matches!(
            engine.add(Tx::reward("mint", "whale", 1)),
            Err(LedgerError::BalanceOverflow { .. })
        ));

        assert_eq!(engine.balances(), &before);
        assert!(engine.mempool().is_empty());
    }

    #[test]
    fn test_add_refused_while_replaying() {
        let mut engine = StateEngine::replaying(Balances::new());
        assert!(matches!(
            engine.add(Tx::reward("mint", "alice", 1)),
            Err(LedgerError::NotLive)
        ));
        assert_eq!(engine.phase(), EnginePhase::Replaying);
    }

    #[test]
    fn test_replay_goes_live() {
        let mut engine = StateEngine::replaying(Balances::new());
        let records = vec![
            Ok(Tx::reward("mint", "alice", 100)),
            Ok(Tx::transfer("alice", "bob", 40)),
        ];

        assert_eq!(engine.replay(records).unwrap(), 2);
        assert_eq!(engine.phase(), EnginePhase::Live);
        assert_eq!(balance(&engine, "alice"), 60);
        assert_eq!(balance(&engine, "bob"), 40);
        assert!(engine.mempool().is_empty());
    }

    #[test]
    fn test_replay_aborts_on_invalid_record() {
        let mut engine = StateEngine::replaying(Balances::new());
        let records = vec![
            Ok(Tx::reward("mint", "alice", 10)),
            Ok(Tx::transfer("alice", "bob", 40)),
        ];

        match engine.replay(records) {
            Err(LedgerError::ReplayFailed { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, LedgerError::InsufficientBalance { .. }));
            }
            other => panic!("expected replay failure, got {:?}", other),
        }
        assert_eq!(engine.phase(), EnginePhase::Replaying);
    }

    #[test]
    fn test_replay_aborts_on_corrupt_record() {
        let mut engine = StateEngine::replaying(Balances::new());
        let records = vec![
            Ok(Tx::reward("mint", "alice", 10)),
            Err(LedgerError::CorruptRecord {
                index: 1,
                reason: "bad".into(),
            }),
        ];

        assert!(matches!(
            engine.replay(records),
            Err(LedgerError::CorruptRecord { index: 1, .. })
        ));
        assert_eq!(engine.phase(), EnginePhase::Replaying);
    }

    #[test]
    fn test_replay_determinism() {
        let records = vec![
            Tx::reward("mint", "alice", 500),
            Tx::transfer("alice", "bob", 120),
            Tx::transfer("bob", "carol", 20),
            Tx::transfer("alice", "alice", 1),
        ];

        let run = || {
            let mut engine = StateEngine::replaying(Balances::new());
            engine.replay(records.iter().cloned().map(Ok)).unwrap();
            engine.balances().clone()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_non_negative_invariant() {
        let mut engine = live(&[("a", 50), ("b", 0)]);
        let attempts = [
            ("a", "b", 30),
            ("b", "a", 40),
            ("b", "c", 30),
            ("a", "c", 21),
            ("c", "a", 30),
            ("a", "b", 50),
        ];

        let mut accepted = 0;
        for (from, to, value) in attempts {
            if engine.add(Tx::transfer(from, to, value)).is_ok() {
                accepted += 1;
            }
        }

        let total: u64 = engine.balances().values().map(|b| b.0).sum();
        assert_eq!(total, 50);
        assert_eq!(engine.mempool().len(), accepted);
    }
}
