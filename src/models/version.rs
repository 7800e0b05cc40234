use serde::{Deserialize, Serialize};
use std::fmt;

/// Major.Minor version of one entity snapshot.
///
/// Drafts live on minor versions; publishing promotes a draft to the next major
/// version with a zero minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Version of a freshly created root: `0.1`
    pub fn initial() -> Self {
        Self::new(0, 1)
    }

    /// Version of a new draft taken from this one
    pub fn next_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1)
    }

    /// Version this draft receives when it is published for the first time
    pub fn next_major(&self) -> Self {
        Self::new(self.major + 1, 0)
    }

    pub fn is_release(&self) -> bool {
        self.major > 0 && self.minor == 0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("Invalid version: {s}"))?;
        let major = major.parse().map_err(|_| format!("Invalid major version: {s}"))?;
        let minor = minor.parse().map_err(|_| format!("Invalid minor version: {s}"))?;
        Ok(Self::new(major, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_lifecycle() {
        let draft = Version::initial();
        assert_eq!(draft.to_string(), "0.1");
        assert!(!draft.is_release());

        let published = draft.next_major();
        assert_eq!(published, Version::new(1, 0));
        assert!(published.is_release());

        let edit = published.next_minor();
        assert_eq!(edit, Version::new(1, 1));
        assert_eq!(edit.next_major(), Version::new(2, 0));
    }

    #[test]
    fn test_ordering_and_parsing() {
        assert!(Version::new(1, 9) < Version::new(2, 0));
        assert_eq!("3.2".parse::<Version>().unwrap(), Version::new(3, 2));
        assert!("3".parse::<Version>().is_err());
        assert!("a.b".parse::<Version>().is_err());
    }
}
