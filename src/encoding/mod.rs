//! Promotion record types
//!
//! This module provides the record stored for every promotion and the
//! dataset that groups one complete load of them.

pub mod record;

pub use record::{Dataset, Record};
