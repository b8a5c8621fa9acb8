//! Transform registrations.
//!
//! [`Transforms`] collects `(path, handler)` pairs before any tree is
//! processed. Paths are `/`-separated key names; the last segment may end
//! in `{}` (apply to every member of the mapping at that key) or `[]`
//! (apply to every element of the sequence at that key).

use std::fmt;
use std::sync::Arc;

use canopy_types::{Key, Tree};

/// Where a handler is being applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position<'a> {
    /// A single mapping member addressed by a plain path.
    Field,
    /// A member of a mapping addressed by a `{}` path, with its key.
    Member(&'a Key),
    /// An element of a sequence addressed by a `[]` path, with its index.
    Element(usize),
}

/// What a handler wants done with the value it was given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Store this value in place of the original.
    Replace(Tree),
    /// Remove the member or element.
    Delete,
}

impl Outcome {
    pub fn is_delete(&self) -> bool {
        matches!(self, Outcome::Delete)
    }
}

impl From<Tree> for Outcome {
    fn from(tree: Tree) -> Self {
        Outcome::Replace(tree)
    }
}

pub(crate) type Handler = Arc<dyn Fn(Tree, Position<'_>) -> Outcome + Send + Sync>;

/// The registration surface handed to a setup closure.
#[derive(Clone, Default)]
pub struct Transforms {
    registrations: Vec<(String, Handler)>,
}

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path`. Registering the same path again
    /// replaces the earlier handler.
    ///
    /// The handler owns the value it receives. Mutating it (through
    /// [`Tree::map_mut`] or [`Tree::seq_mut`]) never affects the input tree.
    pub fn when<F, R>(&mut self, path: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Tree, Position<'_>) -> R + Send + Sync + 'static,
        R: Into<Outcome>,
    {
        let path = path.into();
        let handler: Handler =
            Arc::new(move |value: Tree, position: Position<'_>| handler(value, position).into());
        match self.registrations.iter_mut().find(|(p, _)| *p == path) {
            Some(existing) => existing.1 = handler,
            None => self.registrations.push((path, handler)),
        }
        self
    }

    /// The deletion sentinel. A handler returning it removes the value.
    pub fn delete(&self) -> Outcome {
        Outcome::Delete
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registered paths, in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|(p, _)| p.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Handler)> {
        self.registrations.iter().map(|(p, h)| (p.as_str(), h))
    }
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transforms")
            .field("paths", &self.paths().collect::<Vec<_>>())
            .finish()
    }
}
