//! statedb Core Library
//!
//! Core types, traits, and abstractions for the statedb transaction ledger.
//! This crate provides the foundation shared by the store, the state engine
//! and the command line front end.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
