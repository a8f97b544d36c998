/// Maximum number of characters in a tweet body.
pub const MAX_TWEET_CHARS: usize = 256;

/// Minimum username length accepted at sign-up.
pub const MIN_USERNAME_CHARS: usize = 4;

/// Maximum username length accepted at sign-up.
pub const MAX_USERNAME_CHARS: usize = 32;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_CHARS: usize = 8;
