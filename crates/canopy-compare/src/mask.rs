//! Masks: declarative expectations about the shape and content of a tree.
//!
//! A [`Mask`] is a closed set of variants dispatched by a single match in
//! [`compare_at`](crate::compare_at). Literal trees convert into masks with
//! [`From`]; containers become structural masks, so a mapping mask only
//! constrains the keys it names.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use canopy_types::{Key, Path, Tree};

use crate::error::{MaskError, MaskResult};
use crate::record::{DiffRecord, Expected, PREDICATE_MARKER};
use crate::set_mask::SetMask;

/// Marker strings used when a mask is rendered back into a tree.
pub const PRESENT_TOKEN: &str = "+";
pub const ABSENT_TOKEN: &str = "-";
pub const TAIL_TOKEN: &str = "*";

/// A comparison strategy that fully replaces the built-in dispatch.
///
/// Implementors receive the tree node (or `None` when it is missing), the
/// path to it, and the running sequence index when called from inside a
/// sequence comparison.
pub trait Comparator: fmt::Debug + Send + Sync {
    fn compare(&self, tree: Option<&Tree>, path: &Path, index: Option<usize>) -> Vec<DiffRecord>;

    /// A tree describing this comparator in diff output.
    fn describe(&self) -> Tree;
}

type TestFn = dyn Fn(Option<&Tree>) -> bool + Send + Sync;

/// A single-argument test over a tree node.
///
/// The optional label stands in for the predicate in diff output; without
/// one the predicate renders as `__predicate__`.
#[derive(Clone)]
pub struct Predicate {
    label: Option<String>,
    test: Arc<TestFn>,
}

impl Predicate {
    /// A predicate over present values. A missing value never satisfies it.
    pub fn new(test: impl Fn(&Tree) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: None,
            test: Arc::new(move |tree: Option<&Tree>| tree.is_some_and(|t| test(t))),
        }
    }

    /// A predicate that also sees missing values (as `None`).
    pub fn with_missing(test: impl Fn(Option<&Tree>) -> bool + Send + Sync + 'static) -> Self {
        Self {
            label: None,
            test: Arc::new(test),
        }
    }

    /// Attach a label used in diff output.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn test(&self, tree: Option<&Tree>) -> bool {
        (self.test)(tree)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// One element of a sequence or set mask declaration.
#[derive(Clone, Debug)]
pub enum MaskItem {
    Mask(Mask),
    /// Matches zero or more trailing elements.
    Tail,
}

impl<T: Into<Mask>> From<T> for MaskItem {
    fn from(mask: T) -> Self {
        MaskItem::Mask(mask.into())
    }
}

/// An ordered sequence mask, optionally open-ended.
///
/// An open mask accepts any number of extra trailing tree elements. The
/// tail wildcard can only be declared last, so an interior wildcard cannot
/// be represented.
#[derive(Clone, Debug, Default)]
pub struct SeqMask {
    items: Vec<Mask>,
    open: bool,
}

impl SeqMask {
    /// Build from declared items. A [`MaskItem::Tail`] is only accepted as
    /// the final item.
    pub fn new(items: impl IntoIterator<Item = MaskItem>) -> MaskResult<Self> {
        let declared: Vec<MaskItem> = items.into_iter().collect();
        let count = declared.len();
        let mut out = Self::default();
        for (index, item) in declared.into_iter().enumerate() {
            match item {
                MaskItem::Mask(mask) => out.items.push(mask),
                MaskItem::Tail if index + 1 == count => out.open = true,
                MaskItem::Tail => return Err(MaskError::InteriorTail { index }),
            }
        }
        Ok(out)
    }

    /// A closed mask over exactly these items.
    pub fn closed(items: impl IntoIterator<Item = Mask>) -> Self {
        Self {
            items: items.into_iter().collect(),
            open: false,
        }
    }

    pub fn items(&self) -> &[Mask] {
        &self.items
    }

    /// Returns `true` when trailing tree elements are accepted.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Render `items[from..]` plus the tail marker if open.
    pub(crate) fn render_from(&self, from: usize) -> Tree {
        render_items(&self.items[from..], self.open)
    }
}

pub(crate) fn render_items(items: &[Mask], open: bool) -> Tree {
    let mut out: Vec<Tree> = items.iter().map(Mask::render).collect();
    if open {
        out.push(Tree::from(TAIL_TOKEN));
    }
    Tree::from(out)
}

/// An expectation about a tree node.
#[derive(Clone, Debug)]
pub enum Mask {
    /// Scalar equality, or deep equality for a container built with
    /// [`Mask::exact`].
    Literal(Tree),
    /// Any value that is not missing.
    Present,
    /// Only a missing value.
    Absent,
    /// Any sequence, regardless of contents.
    AnySeq,
    /// Element-wise sequence comparison.
    Seq(SeqMask),
    /// Key-wise comparison; tree keys not named by the mask are ignored.
    Map(BTreeMap<Key, Mask>),
    Predicate(Predicate),
    /// Order-independent, keyed sequence comparison.
    Set(SetMask),
    Custom(Arc<dyn Comparator>),
}

impl Mask {
    /// A container compared by deep equality instead of as a subset.
    pub fn exact(tree: impl Into<Tree>) -> Self {
        Mask::Literal(tree.into())
    }

    /// A sequence mask from declared items.
    pub fn seq(items: impl IntoIterator<Item = MaskItem>) -> MaskResult<Self> {
        SeqMask::new(items).map(Mask::Seq)
    }

    /// A mapping mask from key/mask pairs.
    pub fn map<K: Into<Key>, M: Into<Mask>>(entries: impl IntoIterator<Item = (K, M)>) -> Self {
        Mask::Map(
            entries
                .into_iter()
                .map(|(k, m)| (k.into(), m.into()))
                .collect(),
        )
    }

    /// A predicate over present values.
    pub fn predicate(test: impl Fn(&Tree) -> bool + Send + Sync + 'static) -> Self {
        Mask::Predicate(Predicate::new(test))
    }

    /// A labelled predicate over present values.
    pub fn labeled(
        label: impl Into<String>,
        test: impl Fn(&Tree) -> bool + Send + Sync + 'static,
    ) -> Self {
        Mask::Predicate(Predicate::new(test).labeled(label))
    }

    pub fn custom(comparator: impl Comparator + 'static) -> Self {
        Mask::Custom(Arc::new(comparator))
    }

    /// The mask as a tree, for diagnostics.
    pub fn render(&self) -> Tree {
        match self {
            Mask::Literal(tree) => tree.clone(),
            Mask::Present => Tree::from(PRESENT_TOKEN),
            Mask::Absent => Tree::from(ABSENT_TOKEN),
            Mask::AnySeq => Tree::seq([TAIL_TOKEN]),
            Mask::Seq(seq) => seq.render_from(0),
            Mask::Map(entries) => Tree::map(entries.iter().map(|(k, m)| (k.clone(), m.render()))),
            Mask::Predicate(p) => Tree::from(p.label().unwrap_or(PREDICATE_MARKER)),
            Mask::Set(set) => set.describe_items(),
            Mask::Custom(c) => c.describe(),
        }
    }

    /// How this mask appears on the mask side of a whole-value mismatch.
    pub(crate) fn expected(&self) -> Expected {
        match self {
            Mask::Predicate(p) => Expected::Predicate(p.label().map(str::to_owned)),
            other => Expected::Value(other.render()),
        }
    }
}

impl From<Tree> for Mask {
    fn from(tree: Tree) -> Self {
        match tree {
            Tree::Seq(items) => Mask::Seq(SeqMask::closed(items.iter().cloned().map(Mask::from))),
            Tree::Map(entries) => Mask::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Mask::from(v.clone())))
                    .collect(),
            ),
            scalar => Mask::Literal(scalar),
        }
    }
}

impl From<&Tree> for Mask {
    fn from(tree: &Tree) -> Self {
        Mask::from(tree.clone())
    }
}

impl From<&str> for Mask {
    fn from(s: &str) -> Self {
        Mask::Literal(Tree::from(s))
    }
}

impl From<i64> for Mask {
    fn from(n: i64) -> Self {
        Mask::Literal(Tree::from(n))
    }
}

impl From<i32> for Mask {
    fn from(n: i32) -> Self {
        Mask::Literal(Tree::from(n))
    }
}

impl From<bool> for Mask {
    fn from(b: bool) -> Self {
        Mask::Literal(Tree::from(b))
    }
}

impl From<SeqMask> for Mask {
    fn from(seq: SeqMask) -> Self {
        Mask::Seq(seq)
    }
}

impl From<SetMask> for Mask {
    fn from(set: SetMask) -> Self {
        Mask::Set(set)
    }
}

impl From<Predicate> for Mask {
    fn from(p: Predicate) -> Self {
        Mask::Predicate(p)
    }
}
