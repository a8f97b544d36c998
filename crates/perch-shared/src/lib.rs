//! # perch-shared
//!
//! Types shared between the perch server and its persistence layer:
//! the domain model (users, tweets, retweets), the request/response
//! protocol envelope, the serialized tweet record shape, and the error
//! taxonomy.

pub mod constants;
pub mod models;
pub mod protocol;
pub mod records;
pub mod types;

mod error;

pub use error::PerchError;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PerchError>;
