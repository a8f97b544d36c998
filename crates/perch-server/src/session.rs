//! The authenticated session: one signed-in identity and its cached
//! list of own tweets.
//!
//! A session is a plain value created on successful sign-in or sign-up
//! and owned by the dispatcher; it lives until the next sign-in
//! replaces it. All mutations delegate to the registry with the
//! session user as the acting identity.

use perch_shared::types::TweetId;
use perch_shared::Result;

use crate::registry::TweetRegistry;

#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    /// Ids of tweets authored by the session user, in creation order.
    tweets: Vec<TweetId>,
}

impl Session {
    /// Open a session for `username`, rebuilding the tweet cache from
    /// the registry's author index.
    pub fn new(username: impl Into<String>, registry: &TweetRegistry) -> Self {
        let username = username.into();
        let tweets = registry.find_by_author(&username);
        Self { username, tweets }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The session user's own tweets, retweets included.
    pub fn my_tweets(&self) -> &[TweetId] {
        &self.tweets
    }

    pub fn add_tweet(&mut self, registry: &mut TweetRegistry, text: &str) -> Result<TweetId> {
        let id = registry.create(&self.username, text)?;
        self.tweets.push(id);
        Ok(id)
    }

    pub fn remove_tweet(&mut self, registry: &mut TweetRegistry, id: TweetId) -> Result<()> {
        registry.remove(id, &self.username)?;
        self.tweets.retain(|&other| other != id);
        Ok(())
    }

    pub fn retweet(
        &mut self,
        registry: &mut TweetRegistry,
        original: TweetId,
        text: &str,
    ) -> Result<TweetId> {
        let id = registry.create_retweet(original, &self.username, text)?;
        self.tweets.push(id);
        Ok(id)
    }

    pub fn remove_retweet(
        &mut self,
        registry: &mut TweetRegistry,
        original: TweetId,
        retweet: TweetId,
    ) -> Result<()> {
        registry.remove_retweet(original, retweet, &self.username)?;
        self.tweets.retain(|&other| other != retweet);
        Ok(())
    }

    pub fn like(&self, registry: &mut TweetRegistry, id: TweetId) -> Result<()> {
        registry.like(id, &self.username)
    }

    pub fn unlike(&self, registry: &mut TweetRegistry, id: TweetId) -> Result<()> {
        registry.unlike(id, &self.username)
    }

    /// Reply to any tweet; the reply is authored by the session user.
    pub fn reply(
        &mut self,
        registry: &mut TweetRegistry,
        parent: TweetId,
        text: &str,
    ) -> Result<TweetId> {
        let id = registry.reply(parent, &self.username, text)?;
        self.tweets.push(id);
        Ok(id)
    }

    pub fn remove_reply(
        &mut self,
        registry: &mut TweetRegistry,
        parent: TweetId,
        reply: TweetId,
    ) -> Result<()> {
        registry.remove_reply(parent, reply)?;
        self.tweets.retain(|&other| other != reply);
        Ok(())
    }
}
