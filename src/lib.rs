//! promostore
//!
//! An in-memory promotion store loaded from a delimited text file and served
//! over HTTP. The store swaps whole datasets atomically, so lookups never
//! see a half-loaded source.

pub mod config;
pub mod encoding;
pub mod error;
pub mod loader;
pub mod protocol;
pub mod server;
pub mod store;

pub use error::{Error, Result};
