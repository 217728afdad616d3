//! Access to the remote relational store.
//!
//! The sync core only needs a narrow surface: select by key, read a whole table,
//! insert rows and update a row by key. [`RemoteStore`] captures that surface,
//! [`postgrest::PostgrestStore`] implements it over the store's REST API and
//! [`memory::MemoryStore`] keeps everything in memory for tests.

mod base;
pub mod memory;
pub mod postgrest;

pub use base::{RemoteStore, StoreRow, from_store_row, to_store_row};
