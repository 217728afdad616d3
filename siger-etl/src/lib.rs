//! Reconciliation of a SIGER ERP export against a remote relational store.
//!
//! Each run reads the delimited export, derives customer, contract and product
//! records from its rows, compares them with the store's current contents and
//! writes the difference. Entities are synced in foreign-key order and each
//! entity pipeline fails independently of the others.

pub mod concurrency;
pub mod encoding;
pub mod entity;
pub mod error;
pub mod fetch;
mod macros;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod schedule;
pub mod source;
pub mod store;
