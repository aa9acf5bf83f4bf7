//! Value objects: session identity, validated usernames and the policy that validates them.

use std::{collections::HashSet, fmt};

use uuid::Uuid;

use super::error::UsernameError;

/// Names nobody may take, regardless of configuration
pub const BUILTIN_RESERVED_NAMES: [&str; 1] = ["You"];

/// Characters a username may not contain (ASCII punctuation)
pub const DISALLOWED_CHARS: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Default maximum username length, in characters
pub const DEFAULT_MAX_USERNAME_LEN: usize = 20;

/// Identity of one accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A display name that passed [`UsernamePolicy`] validation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable username rules, assembled once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernamePolicy {
    max_len: usize,
    reserved: HashSet<String>,
}

impl UsernamePolicy {
    /// Built-in reserved names plus the server's own identity
    pub fn new(server_name: &str, max_len: usize) -> Self {
        Self::with_reserved(max_len, [server_name])
    }

    /// Built-in reserved names plus `extra`
    pub fn with_reserved<I, S>(max_len: usize, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let reserved = BUILTIN_RESERVED_NAMES
            .iter()
            .map(|name| name.to_string())
            .chain(extra.into_iter().map(Into::into))
            .collect();
        Self { max_len, reserved }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Check `name` against every rule except liveness (which needs the registry).
    ///
    /// Rules apply in order: empty, too long, disallowed character, reserved.
    pub fn validate(&self, name: &str) -> Result<Username, UsernameError> {
        if name.is_empty() {
            return Err(UsernameError::Empty);
        }

        if name.chars().count() > self.max_len {
            return Err(UsernameError::TooLong {
                name: name.to_string(),
                max: self.max_len,
            });
        }

        if let Some(invalid) = name.chars().find(|c| DISALLOWED_CHARS.contains(*c)) {
            return Err(UsernameError::InvalidChar {
                name: name.to_string(),
                invalid,
            });
        }

        if self.is_reserved(name) {
            return Err(UsernameError::Reserved(name.to_string()));
        }

        Ok(Username(name.to_string()))
    }
}
