use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const PATH_SEPARATOR: char = '.';

/// A parsed dotted path such as `model.encoder.depth`.
///
/// Always holds at least one segment and no segment is empty, so every tree
/// operation can split it into a parent prefix and a final key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// A one-segment path. Unlike parsing, the key is never split; a key that
    /// contains the separator is rejected instead.
    pub fn single(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() || key.contains(PATH_SEPARATOR) {
            return Err(Error::InvalidPath(key));
        }
        Ok(Self {
            segments: vec![key],
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn leaf(&self) -> &str {
        self.split_last().0
    }

    pub fn split_last(&self) -> (&str, &[String]) {
        match self.segments.split_last() {
            Some((leaf, parents)) => (leaf.as_str(), parents),
            None => ("", &[]),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, parents) = self.split_last();
        if parents.is_empty() {
            return None;
        }
        Some(Self {
            segments: parents.to_vec(),
        })
    }

    /// Renders the first `depth` segments, used to point error messages at the
    /// segment that failed.
    pub fn prefix(&self, depth: usize) -> String {
        self.segments[..depth.min(self.segments.len())].join(".")
    }

    #[must_use]
    pub fn join(&self, other: &ConfigPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn child(&self, key: impl Into<String>) -> Result<Self> {
        Ok(self.join(&Self::single(key)?))
    }
}

impl FromStr for ConfigPath {
    type Err = Error;

    /// Splits on the separator only; whitespace is part of the key.
    fn from_str(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::InvalidPath(value.to_owned()));
        }

        let segments: Vec<String> = value.split(PATH_SEPARATOR).map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::InvalidPath(value.to_owned()));
        }

        Ok(Self { segments })
    }
}

impl TryFrom<String> for ConfigPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ConfigPath> for String {
    fn from(path: ConfigPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigPath;
    use crate::error::Error;

    #[test]
    fn parses_and_renders_dotted_paths() {
        let path: ConfigPath = "model.encoder.depth".parse().expect("valid path");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.leaf(), "depth");
        assert_eq!(path.prefix(2), "model.encoder");
        assert_eq!(path.to_string(), "model.encoder.depth");
        assert_eq!(
            path.parent().map(|parent| parent.to_string()),
            Some("model.encoder".to_owned())
        );
    }

    #[test]
    fn rejects_empty_segments() {
        for raw in ["", "a..b", ".a", "a."] {
            let error = raw.parse::<ConfigPath>().expect_err("path should be rejected");
            assert!(matches!(error, Error::InvalidPath(_)), "{raw:?} gave {error}");
        }
    }

    #[test]
    fn whitespace_is_part_of_a_key() {
        let path: ConfigPath = " a . b".parse().expect("valid path");
        assert_eq!(path.segments(), [" a ", " b"]);
        assert_eq!(path.to_string(), " a . b");
    }

    #[test]
    fn single_never_splits() {
        assert!(ConfigPath::single("lr").is_ok());
        assert!(ConfigPath::single("a.b").is_err());
        assert!(ConfigPath::single("").is_err());
    }

    #[test]
    fn join_keeps_segment_order() {
        let scope: ConfigPath = "models.encoder".parse().expect("valid path");
        let joined = scope.child("depth").expect("valid key");
        assert_eq!(joined.to_string(), "models.encoder.depth");
        assert!(joined.parent().is_some());
        assert!(ConfigPath::single("root").expect("valid key").parent().is_none());
    }
}
