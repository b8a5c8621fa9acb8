//! Built-in custom comparators.

use canopy_types::{Path, Tree};

use crate::compare::compare_at;
use crate::mask::{Comparator, Mask};
use crate::record::{Actual, DiffRecord, Expected};

/// Matches anything, including a missing value.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyValue;

impl Comparator for AnyValue {
    fn compare(&self, _tree: Option<&Tree>, _path: &Path, _index: Option<usize>) -> Vec<DiffRecord> {
        Vec::new()
    }

    fn describe(&self) -> Tree {
        Tree::from("__any__")
    }
}

/// Matches when at least one alternative matches.
///
/// When none do, a single record is reported at the node itself with the
/// alternatives listed on the mask side; the alternatives' own records are
/// discarded.
#[derive(Clone, Debug)]
pub struct OneOf {
    alternatives: Vec<Mask>,
}

impl OneOf {
    pub fn new(alternatives: impl IntoIterator<Item = Mask>) -> Self {
        Self {
            alternatives: alternatives.into_iter().collect(),
        }
    }

    pub fn alternatives(&self) -> &[Mask] {
        &self.alternatives
    }
}

impl Comparator for OneOf {
    fn compare(&self, tree: Option<&Tree>, path: &Path, index: Option<usize>) -> Vec<DiffRecord> {
        let matched = self
            .alternatives
            .iter()
            .any(|alt| compare_at(tree, alt, path, index).is_empty());
        if matched {
            return Vec::new();
        }
        vec![DiffRecord::new(path, Actual::from_node(tree), Expected::Value(self.describe()))
            .with_error("no alternative matched")]
    }

    fn describe(&self) -> Tree {
        Tree::map([("one_of", Tree::seq(self.alternatives.iter().map(Mask::render)))])
    }
}
