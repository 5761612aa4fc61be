//! Core traits defining statedb interfaces

use crate::types::Tx;

/// Result type for statedb operations
pub type LedgerResult<T> = Result<T, crate::error::LedgerError>;

/// Lazy, ordered sequence of records read back from a store
pub type Records<'a> = Box<dyn Iterator<Item = LedgerResult<Tx>> + 'a>;

/// Durable, append-only transaction log.
///
/// Implementations own their underlying resource exclusively. Records come
/// back from [`LedgerStore::records`] in exactly the order they were appended.
pub trait LedgerStore: Send {
    /// Read every record from the start of the log.
    ///
    /// A record that fails to decode is yielded as
    /// [`LedgerError::CorruptRecord`](crate::LedgerError::CorruptRecord) and
    /// the sequence ends there.
    fn records(&mut self) -> LedgerResult<Records<'_>>;

    /// Append one record at the end of the log.
    ///
    /// On `Ok` the record is flushed. On `Err` no part of it is observable.
    fn append(&mut self, tx: &Tx) -> LedgerResult<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn records(&mut self) -> LedgerResult<Records<'_>> {
        (**self).records()
    }

    fn append(&mut self, tx: &Tx) -> LedgerResult<()> {
        (**self).append(tx)
    }
}
