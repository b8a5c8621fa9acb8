use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::Key;

/// The sequence of mapping keys and sequence indices leading from a root
/// tree to one of its nodes.
///
/// Paths render with `/` between segments. The root path is empty and
/// renders as the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Key>);

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[Key] {
        &self.0
    }

    /// A new path with `segment` appended. `self` is left untouched.
    pub fn child(&self, segment: impl Into<Key>) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(segment.into());
        Self(segments)
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<Key>) {
        self.0.push(segment.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<Key> {
        self.0.pop()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl<K: Into<Key>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_empty() {
        assert_eq!(Path::root().to_string(), "");
        assert!(Path::root().is_root());
    }

    #[test]
    fn segments_join_with_slash() {
        let path = Path::root().child("b").child("c").child(1usize);
        assert_eq!(path.to_string(), "b/c/1");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn child_does_not_modify_parent() {
        let parent: Path = ["a"].into_iter().collect();
        let child = parent.child("b");
        assert_eq!(parent.to_string(), "a");
        assert_eq!(child.to_string(), "a/b");
    }

    #[test]
    fn push_and_pop() {
        let mut path = Path::root();
        path.push("x");
        path.push(3usize);
        assert_eq!(path.pop(), Some(Key::from("3")));
        assert_eq!(path.to_string(), "x");
    }
}
