//! Domain types for the catalog timeline with strong typing.
//!
//! Newtype wrappers keep catalog keys from being mixed up with free-form
//! strings elsewhere in the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a catalog title.
///
/// Wraps the string key used by all three tabular sources. The same key space
/// is used for both child rows and their parents, so the wrapper is what keeps
/// join code honest about which side it is looking at.
///
/// # Examples
///
/// ```rust
/// use yearline::domain::TitleId;
///
/// let id = TitleId::new("tt0944947");
/// assert_eq!(id.as_str(), "tt0944947");
/// assert_eq!(id.to_string(), "tt0944947");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TitleId(String);

impl TitleId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TitleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TitleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<TitleId> for String {
    fn from(id: TitleId) -> Self {
        id.0
    }
}

impl Serialize for TitleId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TitleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = String::deserialize(deserializer)?;
        Ok(Self(id))
    }
}

/// Selects which spreader variant a filtered subset is fed to.
///
/// `Episodes` subdivides a parent's release year among siblings and filters by
/// parent attributes; `Standalone` gives every row the whole year and filters
/// by the row's own attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpreadMode {
    #[default]
    Episodes,
    Standalone,
}

impl SpreadMode {
    /// Returns true when rows are grouped and subdivided under their parent.
    #[must_use]
    pub const fn is_episodes(&self) -> bool {
        matches!(self, Self::Episodes)
    }
}

impl fmt::Display for SpreadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Episodes => f.write_str("episodes"),
            Self::Standalone => f.write_str("standalone"),
        }
    }
}
