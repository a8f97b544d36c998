//! In-memory domain model: users and the tweet graph.
//!
//! Tweets are owned exclusively by the registry; replies and retweets
//! are referenced by id rather than nested, so the graph stays free of
//! ownership cycles.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_TWEET_CHARS;
use crate::error::PerchError;
use crate::types::TweetId;

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Opaque password credential.
///
/// Hashing is out of scope for this system; the credential is stored
/// as received and only ever compared for equality.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn matches(&self, raw: &str) -> bool {
        self.0 == raw
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. The username is the unique, immutable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub credential: Credential,
    pub birth_date: NaiveDate,
    /// Usernames following this user, in follow order.
    pub followers: Vec<String>,
    /// Usernames this user follows, in follow order.
    pub followings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tweet
// ---------------------------------------------------------------------------

/// Distinguishes an original post from a retweet without runtime type
/// inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TweetKind {
    Original,
    Retweet { original: TweetId },
}

/// A text post. Replies and retweets live in the registry under their
/// own ids; this struct only holds the references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweet {
    pub id: TweetId,
    /// Username of the author (back-reference, never owning).
    pub author: String,
    pub text: String,
    pub send_date: DateTime<Utc>,
    /// Usernames that liked this tweet. Set semantics: no duplicates.
    pub likes: BTreeSet<String>,
    /// Replies in arrival order, each a full tweet in the registry.
    pub replies: Vec<TweetId>,
    /// Retweets of this tweet in arrival order.
    pub retweets: Vec<TweetId>,
    pub kind: TweetKind,
}

impl Tweet {
    /// Construct a tweet, enforcing the text-length invariant.
    pub fn new(
        id: TweetId,
        author: impl Into<String>,
        text: impl Into<String>,
        kind: TweetKind,
    ) -> Result<Self, PerchError> {
        let text = text.into();
        validate_text(&text)?;
        Ok(Self {
            id,
            author: author.into(),
            text,
            send_date: Utc::now(),
            likes: BTreeSet::new(),
            replies: Vec::new(),
            retweets: Vec::new(),
            kind,
        })
    }

    /// Add a liker. Returns `false` when the user had already liked.
    pub fn like(&mut self, username: &str) -> bool {
        self.likes.insert(username.to_string())
    }

    /// Remove a liker. Returns `false` when the user was not a liker.
    pub fn unlike(&mut self, username: &str) -> bool {
        self.likes.remove(username)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn retweet_count(&self) -> usize {
        self.retweets.len()
    }

    pub fn is_retweet(&self) -> bool {
        matches!(self.kind, TweetKind::Retweet { .. })
    }
}

/// Tweet text must hold between 1 and 256 characters, inclusive.
pub fn validate_text(text: &str) -> Result<(), PerchError> {
    let chars = text.chars().count();
    if chars == 0 || chars > MAX_TWEET_CHARS {
        return Err(PerchError::InvalidText);
    }
    Ok(())
}
