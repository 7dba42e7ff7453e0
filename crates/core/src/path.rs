//! Data paths
//!
//! A [`DataPath`] is the only externally visible way to address an object in
//! the data graph. Filters and actions hold paths across calls, never object
//! references.
//!
//! # Syntax
//!
//! | Text | Meaning |
//! |------|---------|
//! | (empty) | Root of the graph |
//! | `Image` | Top-level object `Image` |
//! | `Image/Cell Data/Phases` | Nested object |
//!
//! Segments are non-empty and may contain spaces but never `/`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between path segments in the text form
pub const PATH_SEPARATOR: char = '/';

/// Immutable ordered sequence of names from the root to an object
///
/// # Examples
///
/// ```
/// use tessera_core::DataPath;
///
/// let image: DataPath = "Image".parse().unwrap();
/// let phases = image.create_child_path("Phases").unwrap();
/// assert_eq!(phases.to_string(), "Image/Phases");
/// assert_eq!(phases.get_parent(), image);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// The root path (no segments)
    pub fn root() -> Self {
        DataPath {
            segments: Vec::new(),
        }
    }

    /// Build a path from segments, validating each one
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(DataPath { segments })
    }

    /// Path segments from the root
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True for the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the addressed object (last segment), `None` for the root
    pub fn target_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Derive the path of a child of this path
    pub fn create_child_path(&self, name: impl Into<String>) -> Result<DataPath> {
        let name = name.into();
        validate_segment(&name)?;
        let mut segments = self.segments.clone();
        segments.push(name);
        Ok(DataPath { segments })
    }

    /// Path of the containing object; the root is its own parent
    pub fn get_parent(&self) -> DataPath {
        let mut parent = self.clone();
        parent.segments.pop();
        parent
    }

    /// Sibling path with the last segment replaced
    pub fn replace_name(&self, name: impl Into<String>) -> Result<DataPath> {
        if self.is_root() {
            return Err(Error::invalid_path("", "the root path has no name to replace"));
        }
        let name = name.into();
        validate_segment(&name)?;
        let mut segments = self.segments.clone();
        let last = segments.len() - 1;
        segments[last] = name;
        Ok(DataPath { segments })
    }

    /// Re-root this path: replace the `old_prefix` part with `new_prefix`
    ///
    /// Returns `None` if `old_prefix` is not a prefix of this path.
    pub fn replace_prefix(&self, old_prefix: &DataPath, new_prefix: &DataPath) -> Option<DataPath> {
        if !old_prefix.is_ancestor_of(self) {
            return None;
        }
        let mut segments = new_prefix.segments.clone();
        segments.extend_from_slice(&self.segments[old_prefix.len()..]);
        Some(DataPath { segments })
    }

    /// True if `self` is a prefix of `other` (a path is its own ancestor)
    pub fn is_ancestor_of(&self, other: &DataPath) -> bool {
        self.segments.len() <= other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// Text form joined by `/`
    pub fn to_path_string(&self) -> String {
        self.segments.join("/")
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::invalid_path(segment, "empty segment"));
    }
    if segment.contains(PATH_SEPARATOR) {
        return Err(Error::invalid_path(
            segment,
            format!("segment contains '{}'", PATH_SEPARATOR),
        ));
    }
    Ok(())
}

impl FromStr for DataPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(DataPath::root());
        }
        let segments: Vec<String> = s.split(PATH_SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::invalid_path(s, "empty segment"));
        }
        Ok(DataPath { segments })
    }
}

impl TryFrom<String> for DataPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DataPath> for String {
    fn from(path: DataPath) -> Self {
        path.to_path_string()
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DataPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let p = path("Image/Cell Data/Phases");
        assert_eq!(p.len(), 3);
        assert_eq!(p.segments()[1], "Cell Data");
        assert_eq!(p.to_string(), "Image/Cell Data/Phases");
        assert_eq!(p.target_name(), Some("Phases"));
    }

    #[test]
    fn test_parse_empty_is_root() {
        let p = path("");
        assert!(p.is_root());
        assert_eq!(p.target_name(), None);
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        assert!("a//b".parse::<DataPath>().is_err());
        assert!("/a".parse::<DataPath>().is_err());
        assert!("a/".parse::<DataPath>().is_err());
    }

    #[test]
    fn test_child_and_parent() {
        let p = path("Image");
        let child = p.create_child_path("Cell Data").unwrap();
        assert_eq!(child, path("Image/Cell Data"));
        assert_eq!(child.get_parent(), p);
        assert_eq!(DataPath::root().get_parent(), DataPath::root());
    }

    #[test]
    fn test_child_rejects_separator() {
        let p = path("Image");
        assert!(matches!(
            p.create_child_path("a/b"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(p.create_child_path("").is_err());
    }

    #[test]
    fn test_replace_name() {
        let p = path("Image/Cell Data");
        let renamed = p.replace_name("Grain Data").unwrap();
        assert_eq!(renamed, path("Image/Grain Data"));
        assert!(DataPath::root().replace_name("x").is_err());
    }

    #[test]
    fn test_replace_prefix() {
        let p = path("A/B/C");
        let moved = p.replace_prefix(&path("A"), &path("X/Y")).unwrap();
        assert_eq!(moved, path("X/Y/B/C"));
        assert!(p.replace_prefix(&path("B"), &path("X")).is_none());
    }

    #[test]
    fn test_ancestry() {
        assert!(path("A").is_ancestor_of(&path("A/B")));
        assert!(path("A/B").is_ancestor_of(&path("A/B")));
        assert!(DataPath::root().is_ancestor_of(&path("A")));
        assert!(!path("A/B").is_ancestor_of(&path("A")));
        assert!(!path("A/C").is_ancestor_of(&path("A/B")));
    }

    #[test]
    fn test_serde_as_string() {
        let p = path("Image/Cell Data");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"Image/Cell Data\"");
        let back: DataPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
