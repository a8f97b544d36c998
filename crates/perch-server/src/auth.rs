//! Sign-up validation and sign-in credential checks.
//!
//! The validator aggregates every field violation into one rejection
//! so a client can fix them all at once. Password storage is opaque;
//! real credential hashing is out of scope.

use chrono::NaiveDate;
use tracing::{info, warn};

use perch_shared::constants::{MAX_USERNAME_CHARS, MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS};
use perch_shared::models::{Credential, User};
use perch_shared::{PerchError, Result};

use crate::users::UserDirectory;

/// Create an account after validating every sign-up field.
///
/// All violations are collected and returned together as
/// [`PerchError::SignUpRejected`].
pub fn sign_up(
    users: &mut UserDirectory,
    first_name: &str,
    last_name: &str,
    username: &str,
    password: &str,
    birth_date: NaiveDate,
) -> Result<User> {
    let violations = validate(users, username, password);
    if !violations.is_empty() {
        warn!(username, count = violations.len(), "Sign-up rejected");
        return Err(PerchError::SignUpRejected(violations));
    }

    let user = User {
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        credential: Credential::new(password),
        birth_date,
        followers: Vec::new(),
        followings: Vec::new(),
    };
    users.insert(user.clone());
    info!(username, "Signed up");
    Ok(user)
}

/// Authenticate an existing account.
///
/// Unknown username and wrong password are both [`PerchError::AuthError`]
/// so accounts cannot be enumerated.
pub fn sign_in(users: &UserDirectory, username: &str, password: &str) -> Result<User> {
    match users.find(username) {
        Some(user) if user.credential.matches(password) => {
            info!(username, "Signed in");
            Ok(user.clone())
        }
        _ => {
            warn!(username, "Sign-in failed");
            Err(PerchError::AuthError)
        }
    }
}

fn validate(users: &UserDirectory, username: &str, password: &str) -> Vec<String> {
    let mut violations = Vec::new();

    let username_chars = username.chars().count();
    if username_chars < MIN_USERNAME_CHARS || username_chars > MAX_USERNAME_CHARS {
        violations.push(format!(
            "Username must be between {MIN_USERNAME_CHARS} and {MAX_USERNAME_CHARS} characters"
        ));
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        violations.push("Username may only contain letters, digits and underscores".to_string());
    } else if users.contains(username) {
        violations.push("Username is already taken".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_CHARS {
        violations.push(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        ));
    } else if !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        violations.push("Password must contain at least one letter and one digit".to_string());
    }

    violations
}
