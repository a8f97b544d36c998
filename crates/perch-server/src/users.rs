//! The user graph: accounts and their follower/following edges.

use std::collections::HashMap;

use tracing::debug;

use perch_shared::models::User;
use perch_shared::{PerchError, Result};

/// Owns every registered [`User`], keyed by username.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Register a new account. Uniqueness is enforced by the sign-up
    /// validator before this is reached.
    pub fn insert(&mut self, user: User) {
        debug!(username = %user.username, "Registered user");
        self.users.insert(user.username.clone(), user);
    }

    /// Add a following edge from `follower` to `followee`, updating
    /// both ordered edge lists. Following yourself is rejected;
    /// following twice is a no-op.
    pub fn follow(&mut self, follower: &str, followee: &str) -> Result<()> {
        if follower == followee {
            return Err(PerchError::NotAuthorized);
        }
        if !self.users.contains_key(follower) || !self.users.contains_key(followee) {
            return Err(PerchError::NotFound);
        }

        if let Some(user) = self.users.get_mut(follower) {
            if user.followings.iter().any(|name| name == followee) {
                debug!(follower, followee, "Already following");
                return Ok(());
            }
            user.followings.push(followee.to_string());
        }

        if let Some(user) = self.users.get_mut(followee) {
            user.followers.push(follower.to_string());
        }
        Ok(())
    }

    /// Remove a following edge. Unfollowing someone not followed is a
    /// logged no-op.
    pub fn unfollow(&mut self, follower: &str, followee: &str) -> Result<()> {
        if !self.users.contains_key(follower) || !self.users.contains_key(followee) {
            return Err(PerchError::NotFound);
        }

        let mut was_following = false;
        if let Some(user) = self.users.get_mut(follower) {
            let before = user.followings.len();
            user.followings.retain(|name| name != followee);
            was_following = user.followings.len() != before;
        }
        if !was_following {
            debug!(follower, followee, "Not following, nothing to remove");
            return Ok(());
        }

        if let Some(user) = self.users.get_mut(followee) {
            user.followers.retain(|name| name != follower);
        }
        Ok(())
    }
}
