//! Compiling registrations into a nested lookup structure.
//!
//! Each registered path is split on `/`. Every segment but the last becomes
//! a nested [`PathTree`]; the last holds the handler. Segments are matched
//! literally, except that a trailing `{}` or `[]` on the final segment is
//! stripped and recorded as the leaf's [`Iteration`] mode.

use canopy_types::Key;
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::transforms::{Handler, Transforms};

const MEMBERS_SUFFIX: &str = "{}";
const ELEMENTS_SUFFIX: &str = "[]";

/// How a leaf handler is applied to the value at its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Iteration {
    /// Once, to the value itself.
    Field,
    /// Once per member of the mapping at the key (`name{}`).
    Members,
    /// Once per element of the sequence at the key (`name[]`).
    Elements,
}

/// A handler registered at the end of a path.
#[derive(Clone)]
pub struct Leaf {
    pub(crate) key: Key,
    pub(crate) mode: Iteration,
    pub(crate) handler: Handler,
}

impl std::fmt::Debug for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Leaf")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Leaf {
    fn parse(segment: &str, handler: Handler, path: &str) -> MapResult<Self> {
        let (name, mode) = if let Some(name) = segment.strip_suffix(MEMBERS_SUFFIX) {
            (name, Iteration::Members)
        } else if let Some(name) = segment.strip_suffix(ELEMENTS_SUFFIX) {
            (name, Iteration::Elements)
        } else {
            (segment, Iteration::Field)
        };
        if name.is_empty() {
            return Err(MapError::EmptySegment {
                path: path.to_owned(),
            });
        }
        Ok(Self {
            key: Key::from(name),
            mode,
            handler,
        })
    }

    /// The mapping key this leaf addresses, without its suffix.
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn mode(&self) -> Iteration {
        self.mode
    }
}

#[derive(Clone, Debug)]
pub(crate) enum PathNode {
    Branch(PathTree),
    Leaf(Leaf),
}

/// Registered paths as a tree keyed by segment, in registration order.
#[derive(Clone, Debug, Default)]
pub struct PathTree {
    children: Vec<(String, PathNode)>,
}

impl PathTree {
    /// Compile all registrations.
    ///
    /// Fails when nothing was registered, when a path has an empty segment,
    /// or when one path is registered both as a leaf and as a prefix.
    pub fn build(transforms: &Transforms) -> MapResult<Self> {
        if transforms.is_empty() {
            return Err(MapError::NoTransforms);
        }
        let mut root = Self::default();
        for (path, handler) in transforms.iter() {
            root.insert(path, handler.clone())?;
        }
        debug!(registrations = transforms.len(), "compiled path tree");
        Ok(root)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// The nested tree under a literal segment, if one exists.
    pub fn branch(&self, segment: &str) -> Option<&PathTree> {
        self.children.iter().find_map(|(s, node)| match node {
            PathNode::Branch(tree) if s == segment => Some(tree),
            _ => None,
        })
    }

    /// The leaf registered under a raw segment (suffix included).
    pub fn leaf(&self, segment: &str) -> Option<&Leaf> {
        self.children.iter().find_map(|(s, node)| match node {
            PathNode::Leaf(leaf) if s == segment => Some(leaf),
            _ => None,
        })
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = (&str, &PathNode)> {
        self.children.iter().map(|(s, node)| (s.as_str(), node))
    }

    fn insert(&mut self, path: &str, handler: Handler) -> MapResult<()> {
        let segments: Vec<&str> = path.split('/').collect();
        let empty = || MapError::EmptySegment {
            path: path.to_owned(),
        };
        if segments.iter().any(|s| s.is_empty()) {
            return Err(empty());
        }
        let Some((last, parents)) = segments.split_last() else {
            return Err(empty());
        };

        let mut node = self;
        for segment in parents {
            node = node.branch_mut(segment, path)?;
        }
        let leaf = Leaf::parse(last, handler, path)?;
        node.set_leaf(last, leaf, path)
    }

    fn branch_mut(&mut self, segment: &str, path: &str) -> MapResult<&mut PathTree> {
        let pos = match self.children.iter().position(|(s, _)| s == segment) {
            Some(pos) => pos,
            None => {
                self.children
                    .push((segment.to_owned(), PathNode::Branch(PathTree::default())));
                self.children.len() - 1
            }
        };
        match &mut self.children[pos].1 {
            PathNode::Branch(tree) => Ok(tree),
            PathNode::Leaf(_) => Err(MapError::PathConflict {
                path: path.to_owned(),
            }),
        }
    }

    fn set_leaf(&mut self, segment: &str, leaf: Leaf, path: &str) -> MapResult<()> {
        match self.children.iter_mut().find(|(s, _)| s == segment) {
            Some((_, PathNode::Branch(_))) => Err(MapError::PathConflict {
                path: path.to_owned(),
            }),
            Some((_, slot)) => {
                *slot = PathNode::Leaf(leaf);
                Ok(())
            }
            None => {
                self.children.push((segment.to_owned(), PathNode::Leaf(leaf)));
                Ok(())
            }
        }
    }
}
