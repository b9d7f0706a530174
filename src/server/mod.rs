//! HTTP interface
//!
//! Routes promotion lookups and source uploads to the store and loader.

pub mod get;
pub mod response;
pub mod server;
pub mod upload;

pub use response::ApiError;
pub use self::server::{AppState, Server, create_router};
