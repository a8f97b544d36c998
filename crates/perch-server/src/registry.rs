//! The tweet registry: the single authoritative index of all tweets.
//!
//! The registry owns every [`Tweet`] in the process, keyed by id, with
//! a derived per-author index in creation order. It is constructed
//! explicitly and passed by reference wherever it is needed; there is
//! no global instance.

use std::collections::HashMap;

use tracing::{debug, warn};

use perch_shared::models::{Tweet, TweetKind};
use perch_shared::records::{TweetRecord, UserRecord};
use perch_shared::types::TweetId;
use perch_shared::{PerchError, Result};

use crate::users::UserDirectory;

#[derive(Debug, Default)]
pub struct TweetRegistry {
    tweets: HashMap<TweetId, Tweet>,
    /// Tweet ids per author, in creation order. Includes retweets.
    by_author: HashMap<String, Vec<TweetId>>,
    next_id: u64,
}

impl TweetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> TweetId {
        self.next_id += 1;
        TweetId(self.next_id)
    }

    fn index(&mut self, tweet: Tweet) -> TweetId {
        let id = tweet.id;
        self.by_author
            .entry(tweet.author.clone())
            .or_default()
            .push(id);
        self.tweets.insert(id, tweet);
        id
    }

    fn unindex(&mut self, id: TweetId) -> Option<Tweet> {
        let tweet = self.tweets.remove(&id)?;
        if let Some(ids) = self.by_author.get_mut(&tweet.author) {
            ids.retain(|&other| other != id);
        }
        Some(tweet)
    }

    /// Create and index a fresh tweet. Fails with `InvalidText` when
    /// the text is empty or over the character limit.
    pub fn create(&mut self, author: &str, text: &str) -> Result<TweetId> {
        let id = self.allocate_id();
        let tweet = Tweet::new(id, author, text, TweetKind::Original)?;
        debug!(id = %id, author, "Created tweet");
        Ok(self.index(tweet))
    }

    /// O(1) id lookup. Absence is not an error by itself.
    pub fn find(&self, id: TweetId) -> Option<&Tweet> {
        self.tweets.get(&id)
    }

    /// All tweets (retweets included) by `author`, in creation order.
    pub fn find_by_author(&self, author: &str) -> Vec<TweetId> {
        self.by_author.get(author).cloned().unwrap_or_default()
    }

    /// Remove a tweet. Only the author may remove it.
    pub fn remove(&mut self, id: TweetId, acting_user: &str) -> Result<()> {
        let tweet = self.tweets.get(&id).ok_or(PerchError::NotFound)?;
        if tweet.author != acting_user {
            return Err(PerchError::NotAuthorized);
        }
        // A retweet removed this way must also leave the original's
        // retweet list.
        if let TweetKind::Retweet { original } = tweet.kind {
            if let Some(original) = self.tweets.get_mut(&original) {
                original.retweets.retain(|&other| other != id);
            }
        }
        self.unindex(id);
        debug!(id = %id, by = acting_user, "Removed tweet");
        Ok(())
    }

    /// Create a retweet of `original`, indexed like any tweet and
    /// appended to the original's retweet list.
    pub fn create_retweet(
        &mut self,
        original: TweetId,
        retweeter: &str,
        text: &str,
    ) -> Result<TweetId> {
        if !self.tweets.contains_key(&original) {
            return Err(PerchError::NotFound);
        }
        let id = self.allocate_id();
        let tweet = Tweet::new(id, retweeter, text, TweetKind::Retweet { original })?;
        let id = self.index(tweet);
        if let Some(original) = self.tweets.get_mut(&original) {
            original.retweets.push(id);
        }
        debug!(id = %id, original = %original, by = retweeter, "Created retweet");
        Ok(id)
    }

    /// Remove a retweet from its original and from the registry.
    ///
    /// Fails with `NotAuthorized` when the retweet is not actually
    /// attached to `original`, or when `acting_user` did not author it.
    pub fn remove_retweet(
        &mut self,
        original: TweetId,
        retweet: TweetId,
        acting_user: &str,
    ) -> Result<()> {
        let found = self.tweets.get(&retweet).ok_or(PerchError::NotFound)?;
        if found.kind != (TweetKind::Retweet { original }) {
            return Err(PerchError::NotAuthorized);
        }
        if found.author != acting_user {
            return Err(PerchError::NotAuthorized);
        }
        if let Some(original) = self.tweets.get_mut(&original) {
            original.retweets.retain(|&other| other != retweet);
        }
        self.unindex(retweet);
        debug!(id = %retweet, original = %original, "Removed retweet");
        Ok(())
    }

    /// Idempotent like: re-liking changes nothing.
    pub fn like(&mut self, id: TweetId, username: &str) -> Result<()> {
        let tweet = self.tweets.get_mut(&id).ok_or(PerchError::NotFound)?;
        if !tweet.like(username) {
            debug!(id = %id, username, "Already liked");
        }
        Ok(())
    }

    /// Idempotent unlike: removing a non-liker is a logged no-op.
    pub fn unlike(&mut self, id: TweetId, username: &str) -> Result<()> {
        let tweet = self.tweets.get_mut(&id).ok_or(PerchError::NotFound)?;
        if !tweet.unlike(username) {
            warn!(id = %id, username, "Liker not found");
        }
        Ok(())
    }

    /// Create a reply under its own id and attach it to the parent's
    /// reply list.
    pub fn reply(&mut self, parent: TweetId, author: &str, text: &str) -> Result<TweetId> {
        if !self.tweets.contains_key(&parent) {
            return Err(PerchError::NotFound);
        }
        let id = self.allocate_id();
        let tweet = Tweet::new(id, author, text, TweetKind::Original)?;
        let id = self.index(tweet);
        if let Some(parent) = self.tweets.get_mut(&parent) {
            parent.replies.push(id);
        }
        debug!(id = %id, parent = %parent, author, "Created reply");
        Ok(id)
    }

    /// Detach `reply` from `parent` and remove it from the registry.
    /// Fails with `NotFound` when the reply is not in the parent's
    /// reply list.
    pub fn remove_reply(&mut self, parent: TweetId, reply: TweetId) -> Result<()> {
        let parent_tweet = self.tweets.get_mut(&parent).ok_or(PerchError::NotFound)?;
        let position = parent_tweet
            .replies
            .iter()
            .position(|&other| other == reply)
            .ok_or(PerchError::NotFound)?;
        parent_tweet.replies.remove(position);
        self.unindex(reply);
        debug!(id = %reply, parent = %parent, "Removed reply");
        Ok(())
    }

    /// Resolve a tweet and its nested replies/retweets into the
    /// serialized record shape. `None` when the id or its author no
    /// longer resolves.
    pub fn record(&self, id: TweetId, users: &UserDirectory) -> Option<TweetRecord> {
        let tweet = self.tweets.get(&id)?;
        let author = users.find(&tweet.author)?;
        let (retweet_of, retweeted_by) = match tweet.kind {
            TweetKind::Retweet { original } => {
                (Some(original), Some(tweet.author.clone()))
            }
            TweetKind::Original => (None, None),
        };
        Some(TweetRecord {
            id,
            author: UserRecord::from(author),
            text: tweet.text.clone(),
            likes: tweet.likes.iter().cloned().collect(),
            replies: tweet
                .replies
                .iter()
                .filter_map(|&reply| self.record(reply, users))
                .collect(),
            send_date: tweet.send_date,
            retweets: tweet
                .retweets
                .iter()
                .filter_map(|&retweet| self.record(retweet, users))
                .collect(),
            retweet_of,
            retweeted_by,
        })
    }
}
