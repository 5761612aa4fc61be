//! Core types for statedb
//!
//! Defines the data structures shared by the store, the engine and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Marker carried in `Tx::data` for reward transactions
pub const REWARD_MARKER: &str = "reward";

/// Opaque account identifier
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Account(pub String);

impl Account {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Account {
    fn from(name: &str) -> Self {
        Account(name.to_string())
    }
}

impl From<String> for Account {
    fn from(name: String) -> Self {
        Account(name)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.0)
    }
}

/// Balance or transfer amount in whole tokens
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);
    pub const MAX: Amount = Amount(u64::MAX);

    pub fn new(value: u64) -> Self {
        Amount(value)
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

/// Account balance table. Ordered so iteration (and the state root) is deterministic.
pub type Balances = BTreeMap<Account, Amount>;

/// A transfer of value between two accounts.
///
/// The serialized field order (`from`, `to`, `value`, `data`) is the on-disk
/// record shape and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub from: Account,
    pub to: Account,
    pub value: Amount,
    #[serde(default)]
    pub data: String,
}

impl Tx {
    /// Plain transfer with empty data
    pub fn transfer(from: impl Into<Account>, to: impl Into<Account>, value: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value: Amount::new(value),
            data: String::new(),
        }
    }

    /// Reward credited to `to`; `from` is recorded but never debited
    pub fn reward(from: impl Into<Account>, to: impl Into<Account>, value: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value: Amount::new(value),
            data: REWARD_MARKER.to_string(),
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn is_reward(&self) -> bool {
        self.data == REWARD_MARKER
    }
}

impl fmt::Display for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reward() {
            write!(f, "reward {} -> {}", self.value, self.to)
        } else {
            write!(f, "{} -> {} ({})", self.from, self.to, self.value)
        }
    }
}

/// 32-byte hash type
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", &self.to_hex()[..16])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", self.to_hex())
    }
}

/// Digest of a balance table
pub type StateRoot = Hash;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_marker() {
        assert!(Tx::reward("system", "alice", 10).is_reward());
        assert!(!Tx::transfer("alice", "bob", 10).is_reward());
        assert!(!Tx::transfer("alice", "bob", 10).with_data("Reward").is_reward());
    }

    #[test]
    fn test_tx_record_shape() {
        let tx = Tx::transfer("harry", "okeke", 150).with_data("laptop fee");
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(
            json,
            r#"{"from":"harry","to":"okeke","value":150,"data":"laptop fee"}"#
        );
    }

    #[test]
    fn test_tx_missing_data_defaults_empty() {
        let tx: Tx = serde_json::from_str(r#"{"from":"a","to":"b","value":3}"#).unwrap();
        assert_eq!(tx.data, "");
        assert_eq!(tx.value, Amount::new(3));
    }

    #[test]
    fn test_negative_value_rejected() {
        let result: Result<Tx, _> =
            serde_json::from_str(r#"{"from":"a","to":"b","value":-1,"data":""}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_amount_operations() {
        let a = Amount::new(10);
        let b = Amount::new(5);
        assert_eq!(a.checked_sub(b), Some(Amount::new(5)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(Amount::MAX.checked_add(Amount::new(1)), None);
    }

    #[test]
    fn test_hash_display() {
        let hash = Hash([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(hash.to_string(), "0xabababababababab");
    }
}
