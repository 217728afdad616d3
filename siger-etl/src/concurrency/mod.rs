//! Concurrency utilities for coordinating the scheduled service.
//!
//! The [`shutdown`] module provides the watch-based shutdown signal shared by the
//! scheduler and the process signal handlers.

pub mod shutdown;
