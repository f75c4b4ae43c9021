//! Player identity shared by the record store and the restriction API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`PlayerId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerIdValidationError {
    /// Identifier was empty.
    Empty,
    /// Identifier contained characters other than ASCII digits.
    NotNumeric,
}

impl fmt::Display for PlayerIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "user id must not be empty"),
            Self::NotNumeric => write!(f, "user id must contain only digits"),
        }
    }
}

impl std::error::Error for PlayerIdValidationError {}

/// External platform user identifier.
///
/// ## Invariants
/// - Non-empty and made only of ASCII digits, so it is safe to embed in both
///   a database key path and a restriction API URL path segment.
///
/// # Examples
/// ```
/// use moderation_bot::domain::PlayerId;
///
/// let id = PlayerId::new("123").expect("numeric id");
/// assert_eq!(id.as_ref(), "123");
/// assert!(PlayerId::new("12a").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Validate and construct a [`PlayerId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, PlayerIdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, PlayerIdValidationError> {
        if id.is_empty() {
            return Err(PlayerIdValidationError::Empty);
        }
        if !id.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(PlayerIdValidationError::NotNumeric);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for PlayerId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

impl TryFrom<String> for PlayerId {
    type Error = PlayerIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}
