//! In-memory ledger store for testing and embedding

use parking_lot::RwLock;
use statedb_core::{LedgerError, LedgerResult, LedgerStore, Records, Tx};
use std::io::Cursor;
use std::sync::Arc;

use crate::store::{encode_frame, RecordReader};

#[derive(Debug, Default)]
struct MemoryLog {
    frames: Vec<Vec<u8>>,
    /// Appends left before injected failures start; `None` never fails
    appends_left: Option<usize>,
}

/// In-memory ledger store.
///
/// Clones share the same log, so a test can keep a handle after moving the
/// store into a ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    log: Arc<RwLock<MemoryLog>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: &[Tx]) -> LedgerResult<Self> {
        let frames = records
            .iter()
            .map(encode_frame)
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(Self::with_raw_frames(frames))
    }

    /// Seed with raw bytes, one entry per frame. Frames are not validated.
    pub fn with_raw_frames(frames: Vec<Vec<u8>>) -> Self {
        let store = Self::new();
        store.log.write().frames = frames;
        store
    }

    /// Let the next `n` appends succeed and fail every one after that
    pub fn fail_after(&self, n: usize) {
        self.log.write().appends_left = Some(n);
    }

    /// Stop injecting append failures
    pub fn heal(&self) {
        self.log.write().appends_left = None;
    }

    /// Number of stored frames
    pub fn len(&self) -> usize {
        self.log.read().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.read().frames.is_empty()
    }

    /// Decode every stored frame
    pub fn transactions(&self) -> LedgerResult<Vec<Tx>> {
        RecordReader::new(Cursor::new(self.to_bytes())).collect()
    }

    /// The log as it would appear on disk
    pub fn to_bytes(&self) -> Vec<u8> {
        self.log.read().frames.concat()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn records(&mut self) -> LedgerResult<Records<'_>> {
        Ok(Box::new(RecordReader::new(Cursor::new(self.to_bytes()))))
    }

    fn append(&mut self, tx: &Tx) -> LedgerResult<()> {
        let frame = encode_frame(tx)?;
        let mut log = self.log.write();

        if let Some(left) = log.appends_left.as_mut() {
            if *left == 0 {
                return Err(LedgerError::AppendFailed(
                    "memory store rejected append".into(),
                ));
            }
            *left -= 1;
        }

        log.frames.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic() {
        let mut store = MemoryLedgerStore::new();
        let tx = Tx::transfer("alice", "bob", 5);

        store.append(&tx).unwrap();
        assert_eq!(store.len(), 1);

        let records: Vec<Tx> = store.records().unwrap().collect::<LedgerResult<_>>().unwrap();
        assert_eq!(records, vec![tx]);
    }

    #[test]
    fn test_clones_share_log() {
        let handle = MemoryLedgerStore::new();
        let mut store = handle.clone();

        store.append(&Tx::transfer("a", "b", 1)).unwrap();
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_injected_failure() {
        let mut store = MemoryLedgerStore::new();
        store.fail_after(1);

        store.append(&Tx::transfer("a", "b", 1)).unwrap();
        let result = store.append(&Tx::transfer("a", "b", 2));
        assert!(matches!(result, Err(LedgerError::AppendFailed(_))));
        assert_eq!(store.len(), 1);

        store.heal();
        store.append(&Tx::transfer("a", "b", 2)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_raw_frames_validated_on_read() {
        let store = MemoryLedgerStore::with_raw_frames(vec![b"garbage\n".to_vec()]);
        assert!(matches!(
            store.transactions(),
            Err(LedgerError::CorruptRecord { index: 0, .. })
        ));
    }
}
