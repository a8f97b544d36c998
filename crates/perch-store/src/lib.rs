//! # perch-store
//!
//! Flat-file persistence for tweets: one JSON file per
//! (tweet id, author) pair under a fixed storage directory. The file
//! name doubles as the index; listing a user's visible tweets is a
//! directory scan filtered by their followings.

pub mod tweet_files;

mod error;

pub use error::StoreError;
pub use tweet_files::TweetStore;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
