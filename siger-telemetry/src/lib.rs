//! Logging setup shared by the sync service and its test suites.

pub mod tracing;
