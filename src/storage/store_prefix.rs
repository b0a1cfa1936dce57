use derive_more::{Display, From};
use thiserror::Error;

use crate::node::NodePath;

/// An abstract store prefix.
///
/// A prefix is either empty (the root) or a `/` separated path ending with `/`, such as `dataset/s0/`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct StorePrefix(String);

/// An invalid store prefix.
#[derive(Debug, Error, From)]
#[error("invalid store prefix {0}")]
pub struct StorePrefixError(String);

impl StorePrefix {
    /// Create a new store prefix from `prefix`.
    ///
    /// # Errors
    /// Returns [`StorePrefixError`] if `prefix` is not valid according to [`StorePrefix::validate`()].
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorePrefixError> {
        let prefix = prefix.into();
        if Self::validate(&prefix) {
            Ok(Self(prefix))
        } else {
            Err(StorePrefixError(prefix))
        }
    }

    /// Create a store prefix from a string known to be valid.
    pub(crate) fn new_unchecked(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        debug_assert!(Self::validate(&prefix));
        Self(prefix)
    }

    /// The root prefix.
    #[must_use]
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Extracts a string slice containing the prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a prefix.
    ///
    /// A prefix is empty, or ends with `/`, does not start with `/`, and has no empty components.
    #[must_use]
    pub fn validate(prefix: &str) -> bool {
        prefix.is_empty()
            || (prefix.ends_with('/') && !prefix.starts_with('/') && !prefix.contains("//"))
    }

    /// Returns true if this prefix is `other` or lies below it.
    #[must_use]
    pub fn starts_with(&self, other: &StorePrefix) -> bool {
        self.0.starts_with(other.as_str())
    }

    /// Returns the prefix of the parent, if it has one.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.0.strip_suffix('/')?;
        Some(match trimmed.rsplit_once('/') {
            Some((parent, _)) => Self(format!("{parent}/")),
            None => Self::root(),
        })
    }

    /// Returns a sibling prefix with `suffix` appended to the final component.
    ///
    /// Returns [`None`] for the root prefix.
    #[must_use]
    pub fn sibling_with_suffix(&self, suffix: &str) -> Option<Self> {
        let trimmed = self.0.strip_suffix('/')?;
        Some(Self(format!("{trimmed}{suffix}/")))
    }
}

impl TryFrom<&str> for StorePrefix {
    type Error = StorePrefixError;

    fn try_from(prefix: &str) -> Result<Self, StorePrefixError> {
        Self::new(prefix)
    }
}

impl From<&NodePath> for StorePrefix {
    fn from(path: &NodePath) -> Self {
        let path = path.as_str();
        if path == "/" {
            Self::root()
        } else {
            Self::new_unchecked(path.strip_prefix('/').unwrap_or(path).to_string() + "/")
        }
    }
}
