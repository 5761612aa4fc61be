//! statedb Ledger Module
//!
//! Account-balance ledger rebuilt by replaying an append-only log:
//! - Genesis loading and bootstrapping
//! - Validated state transitions (transfers and rewards)
//! - Commit buffer drained to the log in submission order

pub mod genesis;
pub mod engine;
pub mod mempool;
pub mod ledger;

pub use genesis::*;
pub use engine::*;
pub use mempool::*;
pub use ledger::*;
