//! statedb Ledger Storage
//!
//! Provides the append-only transaction log and balance snapshots.
//! Records are newline-terminated JSON frames, one transaction per frame.

pub mod store;
pub mod memory;
pub mod persistent;
pub mod snapshot;

pub use store::*;
pub use memory::*;
pub use persistent::*;
pub use snapshot::*;
