use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a song (a provider URI such as
/// `spotify:track:0rKtyWc8bvkriBthvHKY8d`, or a dataset track id).
///
/// Ordering is lexicographic on the raw string; ranking relies on it as the
/// deterministic tie-break between equal scores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare provider id, without any `scheme:kind:` prefix.
    ///
    /// `spotify:track:abc` becomes `abc`; ids without a prefix are returned
    /// unchanged.
    #[must_use]
    pub fn bare(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SongId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SongId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SongId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
