//! Promotion source format
//!
//! Plain UTF-8 text, one `id,price,expirationDate` record per line, no
//! header row and no quoting. This module turns such a stream into a
//! [`Dataset`](crate::encoding::Dataset).

pub mod parser;

pub use parser::Parser;
