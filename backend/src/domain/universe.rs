//! Universe identifiers and the configured restriction fleet.

use std::fmt;
use std::sync::Arc;

/// Validation errors returned when parsing universe identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniverseIdValidationError {
    /// Identifier was empty after trimming.
    Empty,
    /// Identifier contained characters other than ASCII digits.
    NotNumeric { value: String },
}

impl fmt::Display for UniverseIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "universe id must not be empty"),
            Self::NotNumeric { value } => {
                write!(f, "universe id must contain only digits, got '{value}'")
            }
        }
    }
}

impl std::error::Error for UniverseIdValidationError {}

/// Identifier of one remote game universe addressed by the restriction API.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniverseId(String);

impl UniverseId {
    /// Validate and construct a [`UniverseId`]; surrounding whitespace is
    /// trimmed.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UniverseIdValidationError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UniverseIdValidationError::Empty);
        }
        if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(UniverseIdValidationError::NotNumeric {
                value: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UniverseId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UniverseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Ordered set of universes a restriction must be mirrored across.
///
/// Rebuilt from configuration rather than persisted; cloning is cheap.
///
/// # Examples
/// ```
/// use moderation_bot::domain::UniverseTargets;
///
/// let targets = UniverseTargets::parse(" 111, 222 ,,333").expect("valid list");
/// let ids: Vec<&str> = targets.iter().map(AsRef::as_ref).collect();
/// assert_eq!(ids, ["111", "222", "333"]);
/// assert!(UniverseTargets::parse("").expect("empty list").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniverseTargets(Arc<[UniverseId]>);

impl UniverseTargets {
    /// Parse a comma-separated configuration value.
    ///
    /// Each element is trimmed; blank elements are skipped so trailing commas
    /// do not produce phantom targets.
    pub fn parse(raw: &str) -> Result<Self, UniverseIdValidationError> {
        let ids = raw
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(UniverseId::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(ids.into()))
    }

    /// Build targets from already validated identifiers.
    pub fn from_ids(ids: impl IntoIterator<Item = UniverseId>) -> Self {
        Self(ids.into_iter().collect::<Vec<_>>().into())
    }

    /// Iterate targets in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &UniverseId> {
        self.0.iter()
    }

    /// Number of configured targets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no targets are configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 0)]
    #[case("   ", 0)]
    #[case("1", 1)]
    #[case("1,2,3", 3)]
    #[case(" 1 ,\t2 , 3,", 3)]
    fn parses_comma_separated_lists(#[case] raw: &str, #[case] expected: usize) {
        let targets = UniverseTargets::parse(raw).expect("valid list");
        assert_eq!(targets.len(), expected);
    }

    #[rstest]
    fn preserves_configuration_order() {
        let targets = UniverseTargets::parse("30,10,20").expect("valid list");
        let ids: Vec<String> = targets.iter().map(ToString::to_string).collect();
        assert_eq!(ids, ["30", "10", "20"]);
    }

    #[rstest]
    fn rejects_non_numeric_entries() {
        let err = UniverseTargets::parse("1, two ,3").expect_err("invalid entry");
        assert_eq!(
            err,
            UniverseIdValidationError::NotNumeric {
                value: "two".to_owned()
            }
        );
    }
}
