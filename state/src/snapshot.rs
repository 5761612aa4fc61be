//! Balance snapshots and state root computation

use statedb_core::{Amount, Balances, Hash, StateRoot};

/// Compute the state root of a balance table.
///
/// Each entry contributes its length-prefixed account name followed by the
/// little-endian balance, in account order. An empty table hashes to
/// [`Hash::ZERO`].
pub fn compute_state_root(balances: &Balances) -> StateRoot {
    if balances.is_empty() {
        return Hash::ZERO;
    }

    let mut hasher = blake3::Hasher::new();
    for (account, balance) in balances {
        let name = account.as_str().as_bytes();
        hasher.update(&(name.len() as u64).to_le_bytes());
        hasher.update(name);
        hasher.update(&balance.0.to_le_bytes());
    }
    Hash::from_bytes(*hasher.finalize().as_bytes())
}

/// Point-in-time copy of the balances with their state root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// Balances at the time of the snapshot
    pub balances: Balances,
    /// State root of `balances`
    pub root: StateRoot,
    /// Records in the durable log at the time of the snapshot
    pub records: u64,
}

impl BalanceSnapshot {
    pub fn new(balances: Balances, records: u64) -> Self {
        let root = compute_state_root(&balances);
        Self {
            balances,
            root,
            records,
        }
    }

    /// Verify snapshot integrity
    pub fn verify(&self) -> bool {
        compute_state_root(&self.balances) == self.root
    }

    /// Sum of all balances, `None` on overflow
    pub fn total(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(*b))
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statedb_core::Account;

    fn balances(entries: &[(&str, u64)]) -> Balances {
        entries
            .iter()
            .map(|(name, value)| (Account::from(*name), Amount::new(*value)))
            .collect()
    }

    #[test]
    fn test_state_root_deterministic() {
        let a = balances(&[("alice", 800), ("bob", 200)]);
        let b = balances(&[("bob", 200), ("alice", 800)]);
        assert_eq!(compute_state_root(&a), compute_state_root(&b));
        assert_ne!(compute_state_root(&a), Hash::ZERO);
    }

    #[test]
    fn test_state_root_sensitive() {
        let a = balances(&[("alice", 800), ("bob", 200)]);
        let b = balances(&[("alice", 799), ("bob", 201)]);
        assert_ne!(compute_state_root(&a), compute_state_root(&b));

        // names are length-prefixed, so shifting characters between them changes the root
        let c = balances(&[("ab", 1), ("c", 1)]);
        let d = balances(&[("a", 1), ("bc", 1)]);
        assert_ne!(compute_state_root(&c), compute_state_root(&d));
    }

    #[test]
    fn test_snapshot_verify() {
        let mut snapshot = BalanceSnapshot::new(balances(&[("alice", 5)]), 1);
        assert!(snapshot.verify());
        assert_eq!(snapshot.total(), Some(Amount::new(5)));

        snapshot.balances.insert(Account::from("mallory"), Amount::new(1));
        assert!(!snapshot.verify());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = BalanceSnapshot::new(Balances::new(), 0);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.root, Hash::ZERO);
    }
}
