use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 639-1 code of a content translation (`fi`, `sv`, `en`, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_lowercase())
    }

    pub fn finnish() -> Self {
        Self::new("fi")
    }

    pub fn swedish() -> Self {
        Self::new("sv")
    }

    pub fn english() -> Self {
        Self::new("en")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}
