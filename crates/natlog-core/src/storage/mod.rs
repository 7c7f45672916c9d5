//! # Storage
//!
//! The local snapshot of the external relational store, kept in redb.
//! It is a bulk-load source only; built structures are never written
//! back.

pub mod redb_store;

pub use redb_store::{FactStore, StoreCounts};
