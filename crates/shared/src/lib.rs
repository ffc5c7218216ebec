//! Shared types for the gestio notification contract and client.

pub mod models;
pub mod payload;
pub mod protocol;
pub mod error;

pub use models::*;
pub use payload::*;
pub use protocol::*;
pub use error::*;
