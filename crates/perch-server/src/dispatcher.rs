//! The request dispatcher: one canonical command table mapping a
//! tagged request to a session/registry operation and folding the
//! outcome into a response envelope.
//!
//! The dispatcher owns the user directory, the tweet registry, the
//! tweet store, and the current session, all injected at
//! construction. State moves along one axis, anonymous to
//! authenticated, entered by a successful SIGNIN or SIGNUP; there is
//! no sign-out.

use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{debug, warn};

use perch_shared::models::TweetKind;
use perch_shared::protocol::{Method, Request, Response};
use perch_shared::records::{TweetRecord, UserRecord};
use perch_shared::types::TweetId;
use perch_shared::{PerchError, Result};
use perch_store::{StoreError, TweetStore};

use crate::auth;
use crate::registry::TweetRegistry;
use crate::session::Session;
use crate::users::UserDirectory;

pub struct Dispatcher {
    users: UserDirectory,
    registry: TweetRegistry,
    store: TweetStore,
    session: Option<Session>,
}

impl Dispatcher {
    pub fn new(users: UserDirectory, registry: TweetRegistry, store: TweetStore) -> Self {
        Self {
            users,
            registry,
            store,
            session: None,
        }
    }

    /// Handle one request. Every failure is folded into the envelope;
    /// nothing propagates past this boundary.
    pub fn dispatch(&mut self, request: &Request) -> Response {
        let method = match request.method.parse::<Method>() {
            Ok(method) => method,
            Err(error) => {
                warn!(method = %request.method, "Rejected unknown method");
                return Response::failure(&error);
            }
        };
        debug!(%method, "Dispatching request");
        match self.route(method, &request.parameter_values) {
            Ok(response) => response,
            Err(error) => {
                warn!(%method, error = %error, "Request failed");
                Response::failure(&error)
            }
        }
    }

    fn route(&mut self, method: Method, params: &Value) -> Result<Response> {
        match method {
            Method::SignIn => {
                let username = str_param(params, "username")?;
                let password = str_param(params, "password")?;
                let user = auth::sign_in(&self.users, username, password)?;
                self.session = Some(Session::new(user.username.clone(), &self.registry));
                Ok(Response::success(
                    1,
                    Some(json!([UserRecord::from(&user)])),
                ))
            }

            Method::SignUp => {
                let birth_date = str_param(params, "birthDate")?
                    .parse::<NaiveDate>()
                    .map_err(|e| PerchError::BadRequest(format!("bad birthDate: {e}")))?;
                let user = auth::sign_up(
                    &mut self.users,
                    str_param(params, "firstName")?,
                    str_param(params, "lastName")?,
                    str_param(params, "username")?,
                    str_param(params, "password")?,
                    birth_date,
                )?;
                self.session = Some(Session::new(user.username.clone(), &self.registry));
                Ok(Response::success(
                    1,
                    Some(json!([UserRecord::from(&user)])),
                ))
            }

            // The following-based feed, served from the persisted
            // tweets of the authors the session user follows.
            Method::Timeline => {
                let session = self.session.as_ref().ok_or(PerchError::AuthError)?;
                let user = self
                    .users
                    .find(session.username())
                    .ok_or(PerchError::AuthError)?;
                let visible = self
                    .store
                    .list_visible(&user.followings)
                    .map_err(storage)?;
                let records: Vec<Value> =
                    visible.into_values().map(|r| to_value(&r)).collect();
                let count = records.len() as u64;
                Ok(Response::success(count, Some(Value::Array(records))))
            }

            Method::ShowMyTweets => {
                let session = self.session.as_ref().ok_or(PerchError::AuthError)?;
                let records: Vec<Value> = session
                    .my_tweets()
                    .iter()
                    .filter_map(|&id| self.registry.record(id, &self.users))
                    .map(|r| to_value(&r))
                    .collect();
                let count = records.len() as u64;
                Ok(Response::success(count, Some(Value::Array(records))))
            }

            Method::Tweet => {
                let text = str_param(params, "text")?;
                let session = self.session.as_mut().ok_or(PerchError::AuthError)?;
                let id = session.add_tweet(&mut self.registry, text)?;
                self.persist(id)?;
                Ok(Response::success(1, Some(json!([self.record(id)?]))))
            }

            Method::RemoveTweet => {
                let id = target_tweet_id(params)?;
                let tweet = self.registry.find(id).ok_or(PerchError::NotFound)?;
                let author = tweet.author.clone();
                let kind = tweet.kind;
                let session = self.session.as_mut().ok_or(PerchError::AuthError)?;
                // A retweet removed through REMOVETWEET is detached
                // from the original taken from its kind tag.
                match kind {
                    TweetKind::Retweet { original } => {
                        session.remove_retweet(&mut self.registry, original, id)?;
                    }
                    TweetKind::Original => {
                        session.remove_tweet(&mut self.registry, id)?;
                    }
                }
                self.store.remove(id, &author).map_err(storage)?;
                Ok(Response::success(0, None))
            }

            Method::Retweet => {
                let original = target_tweet_id(params)?;
                let text = str_param(params, "text")?;
                let session = self.session.as_mut().ok_or(PerchError::AuthError)?;
                let id = session.retweet(&mut self.registry, original, text)?;
                self.persist(id)?;
                Ok(Response::success(1, Some(json!([self.record(id)?]))))
            }

            Method::RemoveRetweet => {
                let original = target_tweet_id(params)?;
                let retweet = nested_id(params, "retweet")?;
                let author = self
                    .registry
                    .find(retweet)
                    .ok_or(PerchError::NotFound)?
                    .author
                    .clone();
                let session = self.session.as_mut().ok_or(PerchError::AuthError)?;
                session.remove_retweet(&mut self.registry, original, retweet)?;
                self.store.remove(retweet, &author).map_err(storage)?;
                Ok(Response::success(0, None))
            }

            Method::Like => {
                let id = target_tweet_id(params)?;
                let session = self.session.as_ref().ok_or(PerchError::AuthError)?;
                session.like(&mut self.registry, id)?;
                Ok(Response::success(1, Some(json!([self.record(id)?]))))
            }

            Method::Dislike => {
                let id = target_tweet_id(params)?;
                let session = self.session.as_ref().ok_or(PerchError::AuthError)?;
                session.unlike(&mut self.registry, id)?;
                Ok(Response::success(1, Some(json!([self.record(id)?]))))
            }

            Method::Reply => {
                let parent = target_tweet_id(params)?;
                let text = str_param(params, "text")?;
                let session = self.session.as_mut().ok_or(PerchError::AuthError)?;
                session.reply(&mut self.registry, parent, text)?;
                // The reply nests inside the parent's record.
                self.persist(parent)?;
                Ok(Response::success(1, Some(json!([self.record(parent)?]))))
            }

            Method::RemoveReply => {
                let parent = target_tweet_id(params)?;
                let reply = nested_id(params, "reply")?;
                let session = self.session.as_mut().ok_or(PerchError::AuthError)?;
                session.remove_reply(&mut self.registry, parent, reply)?;
                self.persist(parent)?;
                Ok(Response::success(1, Some(json!([self.record(parent)?]))))
            }
        }
    }

    fn record(&self, id: TweetId) -> Result<TweetRecord> {
        self.registry
            .record(id, &self.users)
            .ok_or(PerchError::NotFound)
    }

    /// Write-through: persist a tweet's current record to its file.
    fn persist(&self, id: TweetId) -> Result<()> {
        let record = self.record(id)?;
        self.store.write(&record).map_err(storage)
    }

    #[cfg(test)]
    fn users_mut(&mut self) -> &mut UserDirectory {
        &mut self.users
    }
}

fn storage(error: StoreError) -> PerchError {
    PerchError::Storage(error.to_string())
}

/// Serializing our own records cannot fail; fall back to null rather
/// than panic if it ever does.
fn to_value(record: &TweetRecord) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| PerchError::BadRequest(format!("missing string parameter '{key}'")))
}

fn id_of(value: &Value) -> Option<TweetId> {
    value.get("id").and_then(Value::as_u64).map(TweetId)
}

/// Resolve the id of the targeted tweet from the `tweet` parameter.
///
/// When the client passes a retweet wrapper, the true target is
/// nested: an object holding a `retweetedTweet` key carries the
/// target's id under `newTweet.id`.
fn target_tweet_id(params: &Value) -> Result<TweetId> {
    let tweet = params
        .get("tweet")
        .ok_or_else(|| PerchError::BadRequest("missing 'tweet' parameter".to_string()))?;
    let target = if tweet.get("retweetedTweet").is_some() {
        tweet.get("newTweet").unwrap_or(tweet)
    } else {
        tweet
    };
    id_of(target)
        .ok_or_else(|| PerchError::BadRequest("tweet target has no numeric 'id'".to_string()))
}

fn nested_id(params: &Value, key: &str) -> Result<TweetId> {
    params
        .get(key)
        .and_then(id_of)
        .ok_or_else(|| PerchError::BadRequest(format!("parameter '{key}' has no numeric 'id'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dispatcher() -> (Dispatcher, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = TweetStore::new(dir.path().to_path_buf()).unwrap();
        let dispatcher =
            Dispatcher::new(UserDirectory::new(), TweetRegistry::new(), store);
        (dispatcher, dir)
    }

    fn request(method: &str, params: Value) -> Request {
        Request {
            method: method.to_string(),
            parameter_values: params,
        }
    }

    fn sign_up(dispatcher: &mut Dispatcher, username: &str) -> Response {
        dispatcher.dispatch(&request(
            "SIGNUP",
            json!({
                "firstName": "Test",
                "lastName": "User",
                "username": username,
                "password": "passw0rd1",
                "birthDate": "1999-01-01"
            }),
        ))
    }

    fn tweet(dispatcher: &mut Dispatcher, text: &str) -> Response {
        dispatcher.dispatch(&request("TWEET", json!({ "text": text })))
    }

    fn first_id(response: &Response) -> u64 {
        response.result.as_ref().unwrap()[0]["id"].as_u64().unwrap()
    }

    #[test]
    fn sign_up_sign_in_tweet_show_my_tweets() {
        let (mut dispatcher, _dir) = dispatcher();

        let response = sign_up(&mut dispatcher, "alice");
        assert!(!response.has_error);
        assert_eq!(response.count, 1);

        let response = dispatcher.dispatch(&request(
            "SIGNIN",
            json!({"username": "alice", "password": "passw0rd1"}),
        ));
        assert!(!response.has_error);
        assert_eq!(
            response.result.as_ref().unwrap()[0]["username"],
            "alice"
        );

        let response = tweet(&mut dispatcher, "hello");
        assert!(!response.has_error);
        assert_eq!(response.count, 1);

        let response = dispatcher.dispatch(&request("SHOW_MY_TWEETS", json!({})));
        assert!(!response.has_error);
        assert_eq!(response.count, 1);
        assert_eq!(response.result.as_ref().unwrap()[0]["text"], "hello");
    }

    #[test]
    fn unknown_method_has_a_stable_code() {
        let (mut dispatcher, _dir) = dispatcher();
        let response = dispatcher.dispatch(&request("FOLLOW", json!({})));
        assert!(response.has_error);
        assert_eq!(response.error_code, Some(json!("UnknownMethod")));
    }

    #[test]
    fn commands_before_sign_in_are_auth_errors() {
        let (mut dispatcher, _dir) = dispatcher();
        for method in ["TWEET", "TIMELINE", "SHOW_MY_TWEETS"] {
            let response =
                dispatcher.dispatch(&request(method, json!({"text": "hi"})));
            assert!(response.has_error, "{method} should require a session");
            assert_eq!(response.error_code, Some(json!("AuthError")));
        }
    }

    #[test]
    fn sign_up_violations_come_back_as_an_array() {
        let (mut dispatcher, _dir) = dispatcher();
        let response = dispatcher.dispatch(&request(
            "SIGNUP",
            json!({
                "firstName": "Test",
                "lastName": "User",
                "username": "x",
                "password": "short",
                "birthDate": "1999-01-01"
            }),
        ));
        assert!(response.has_error);
        assert_eq!(response.count, 2);
        assert_eq!(response.error_code.as_ref().unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn invalid_text_is_reported_with_its_code() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "alice");

        let response = tweet(&mut dispatcher, "");
        assert!(response.has_error);
        assert_eq!(response.error_code, Some(json!("InvalidText")));

        let response = tweet(&mut dispatcher, &"x".repeat(257));
        assert_eq!(response.error_code, Some(json!("InvalidText")));

        assert!(!tweet(&mut dispatcher, &"x".repeat(256)).has_error);
    }

    #[test]
    fn retweet_and_remove_restore_the_original_count() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "bob");
        let original = first_id(&tweet(&mut dispatcher, "original"));

        sign_up(&mut dispatcher, "alice");
        let response = dispatcher.dispatch(&request(
            "RETWEET",
            json!({"tweet": {"id": original}, "text": "nice"}),
        ));
        assert!(!response.has_error);
        let retweet = first_id(&response);
        assert_eq!(
            dispatcher.registry.find(TweetId(original)).unwrap().retweet_count(),
            1
        );

        let response = dispatcher.dispatch(&request(
            "REMOVERETWEET",
            json!({"tweet": {"id": original}, "retweet": {"id": retweet}}),
        ));
        assert!(!response.has_error);
        assert_eq!(response.count, 0);
        assert_eq!(
            dispatcher.registry.find(TweetId(original)).unwrap().retweet_count(),
            0
        );
        assert!(dispatcher.registry.find(TweetId(retweet)).is_none());
    }

    #[test]
    fn remove_tweet_resolves_nested_retweet_targets() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "bob");
        let original = first_id(&tweet(&mut dispatcher, "original"));

        sign_up(&mut dispatcher, "alice");
        let retweet = first_id(&dispatcher.dispatch(&request(
            "RETWEET",
            json!({"tweet": {"id": original}, "text": "nice"}),
        )));

        // The client wraps the retweet: the true target id sits under
        // newTweet.
        let response = dispatcher.dispatch(&request(
            "REMOVETWEET",
            json!({"tweet": {
                "retweetedTweet": {"id": original},
                "newTweet": {"id": retweet}
            }}),
        ));
        assert!(!response.has_error);
        assert!(dispatcher.registry.find(TweetId(retweet)).is_none());
        assert_eq!(
            dispatcher.registry.find(TweetId(original)).unwrap().retweet_count(),
            0
        );
    }

    #[test]
    fn removing_someone_elses_tweet_is_not_authorized() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "bob");
        let foreign = first_id(&tweet(&mut dispatcher, "not yours"));

        sign_up(&mut dispatcher, "alice");
        let response = dispatcher.dispatch(&request(
            "REMOVETWEET",
            json!({"tweet": {"id": foreign}}),
        ));
        assert!(response.has_error);
        assert_eq!(response.error_code, Some(json!("NotAuthorized")));
    }

    #[test]
    fn like_is_idempotent_and_dislike_tolerates_non_likers() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "bob");
        let id = first_id(&tweet(&mut dispatcher, "likeable"));

        sign_up(&mut dispatcher, "alice");
        let like = request("LIKE", json!({"tweet": {"id": id}}));
        let response = dispatcher.dispatch(&like);
        assert!(!response.has_error);
        assert_eq!(
            response.result.as_ref().unwrap()[0]["likes"],
            json!(["alice"])
        );

        let response = dispatcher.dispatch(&like);
        assert_eq!(
            response.result.as_ref().unwrap()[0]["likes"],
            json!(["alice"])
        );

        let dislike = request("DISLIKE", json!({"tweet": {"id": id}}));
        let response = dispatcher.dispatch(&dislike);
        assert_eq!(response.result.as_ref().unwrap()[0]["likes"], json!([]));

        // Disliking again is a no-op, not an error.
        assert!(!dispatcher.dispatch(&dislike).has_error);
    }

    #[test]
    fn reply_nests_in_the_parent_record() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "bob");
        let parent = first_id(&tweet(&mut dispatcher, "parent"));

        sign_up(&mut dispatcher, "alice");
        let response = dispatcher.dispatch(&request(
            "REPLY",
            json!({"tweet": {"id": parent}, "text": "child"}),
        ));
        assert!(!response.has_error);
        let replies = response.result.as_ref().unwrap()[0]["replies"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["text"], "child");
        let reply = replies[0]["id"].as_u64().unwrap();

        let response = dispatcher.dispatch(&request(
            "REMOVEREPLY",
            json!({"tweet": {"id": parent}, "reply": {"id": reply}}),
        ));
        assert!(!response.has_error);
        assert!(response.result.as_ref().unwrap()[0]["replies"]
            .as_array()
            .unwrap()
            .is_empty());

        // Removing the same reply again: it is no longer attached.
        let response = dispatcher.dispatch(&request(
            "REMOVEREPLY",
            json!({"tweet": {"id": parent}, "reply": {"id": reply}}),
        ));
        assert_eq!(response.error_code, Some(json!("NotFound")));
    }

    #[test]
    fn timeline_shows_followed_authors_persisted_tweets() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "bob");
        tweet(&mut dispatcher, "from bob");
        sign_up(&mut dispatcher, "carol");
        tweet(&mut dispatcher, "from carol");

        sign_up(&mut dispatcher, "alice");
        dispatcher.users_mut().follow("alice", "bob").unwrap();

        let response = dispatcher.dispatch(&request("TIMELINE", json!({})));
        assert!(!response.has_error);
        assert_eq!(response.count, 1);
        assert_eq!(
            response.result.as_ref().unwrap()[0]["text"],
            "from bob"
        );
    }

    #[test]
    fn removed_tweets_leave_the_store() {
        let (mut dispatcher, dir) = dispatcher();
        sign_up(&mut dispatcher, "alice");
        let id = first_id(&tweet(&mut dispatcher, "transient"));
        assert!(dir.path().join(format!("{id} alice")).exists());

        dispatcher.dispatch(&request("REMOVETWEET", json!({"tweet": {"id": id}})));
        assert!(!dir.path().join(format!("{id} alice")).exists());
    }

    #[test]
    fn sign_in_replaces_the_session() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "alice");
        tweet(&mut dispatcher, "alice speaking");
        sign_up(&mut dispatcher, "bob");

        // Bob sees no tweets of his own.
        let response = dispatcher.dispatch(&request("SHOW_MY_TWEETS", json!({})));
        assert_eq!(response.count, 0);

        // Signing back in as alice rebuilds her cache from the registry.
        dispatcher.dispatch(&request(
            "SIGNIN",
            json!({"username": "alice", "password": "passw0rd1"}),
        ));
        let response = dispatcher.dispatch(&request("SHOW_MY_TWEETS", json!({})));
        assert_eq!(response.count, 1);
    }

    #[test]
    fn liking_a_missing_tweet_is_not_found() {
        let (mut dispatcher, _dir) = dispatcher();
        sign_up(&mut dispatcher, "alice");
        let response =
            dispatcher.dispatch(&request("LIKE", json!({"tweet": {"id": 999}})));
        assert_eq!(response.error_code, Some(json!("NotFound")));
    }
}
