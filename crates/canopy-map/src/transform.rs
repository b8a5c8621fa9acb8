//! Applying a compiled path tree to a tree.
//!
//! The input is never modified. A container is rebuilt only when a handler
//! was applied somewhere inside it; every other subtree is carried over by
//! reference, so [`Tree::ptr_eq`] holds between untouched parts of the input
//! and the output.

use std::sync::Arc;

use canopy_types::{Path, Tree, TreeMap};
use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::path_tree::{Iteration, Leaf, PathNode, PathTree};
use crate::transforms::{Outcome, Position, Transforms};

/// A compiled set of path transforms.
///
/// Build once with [`TreeMapper::new`], then [`apply`](Self::apply) to any
/// number of trees, from any number of threads.
#[derive(Clone)]
pub struct TreeMapper {
    paths: PathTree,
}

impl TreeMapper {
    /// Register transforms through `setup` and compile them.
    pub fn new(setup: impl FnOnce(&mut Transforms)) -> MapResult<Self> {
        let mut transforms = Transforms::new();
        setup(&mut transforms);
        Self::from_transforms(&transforms)
    }

    pub fn from_transforms(transforms: &Transforms) -> MapResult<Self> {
        Ok(Self {
            paths: PathTree::build(transforms)?,
        })
    }

    pub fn paths(&self) -> &PathTree {
        &self.paths
    }

    /// Produce the transformed tree.
    ///
    /// Fails when a `{}` or `[]` path lands on a value of the wrong kind; no
    /// partial result is returned in that case.
    pub fn apply(&self, tree: &Tree) -> MapResult<Tree> {
        let mut at = Path::root();
        let result = transform_node(tree, &self.paths, &mut at)?;
        debug!(changed = result.is_some(), "applied tree transforms");
        Ok(result.unwrap_or_else(|| tree.clone()))
    }
}

impl std::fmt::Debug for TreeMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeMapper")
            .field("paths", &self.paths.len())
            .finish()
    }
}

/// One-shot transform: register, compile and apply.
///
/// ```
/// use canopy_map::tree_map;
/// use canopy_types::{tree, Tree};
///
/// let out = tree_map(&tree!({"a": [1, 2, 3]}), |t| {
///     let delete = t.delete();
///     t.when("a[]", move |v: Tree, _| {
///         if v.as_i64() == Some(2) { delete.clone() } else { v.into() }
///     });
/// })
/// .unwrap();
/// assert_eq!(out, tree!({"a": [1, 3]}));
/// ```
pub fn tree_map(tree: &Tree, setup: impl FnOnce(&mut Transforms)) -> MapResult<Tree> {
    TreeMapper::new(setup)?.apply(tree)
}

/// Returns `None` when nothing below `node` changed.
fn transform_node(node: &Tree, paths: &PathTree, at: &mut Path) -> MapResult<Option<Tree>> {
    if paths.is_empty() {
        return Ok(None);
    }
    match node {
        Tree::Seq(items) => transform_seq(items, paths, at),
        Tree::Map(map) => transform_map(map, paths, at),
        _ => Ok(None),
    }
}

fn transform_seq(items: &Arc<Vec<Tree>>, paths: &PathTree, at: &mut Path) -> MapResult<Option<Tree>> {
    let mut out: Option<Vec<Tree>> = None;
    for (i, item) in items.iter().enumerate() {
        at.push(i);
        let result = transform_node(item, paths, at);
        at.pop();
        if let Some(replacement) = result? {
            out.get_or_insert_with(|| items.to_vec())[i] = replacement;
        }
    }
    Ok(out.map(|items| Tree::Seq(Arc::new(items))))
}

fn transform_map(map: &Arc<TreeMap>, paths: &PathTree, at: &mut Path) -> MapResult<Option<Tree>> {
    let mut out: Option<TreeMap> = None;
    for (segment, sub) in paths.children() {
        match sub {
            PathNode::Branch(branch) => {
                // Earlier leaves may already have rewritten this mapping.
                let current = out.as_ref().unwrap_or(&**map);
                let Some(value) = current.get(segment).cloned() else {
                    continue;
                };
                at.push(segment);
                let result = transform_node(&value, branch, at);
                at.pop();
                if let Some(replacement) = result? {
                    out.get_or_insert_with(|| (**map).clone())
                        .insert(segment.into(), replacement);
                }
            }
            PathNode::Leaf(leaf) => {
                // Earlier leaves may already have rewritten this mapping.
                let current = out.as_ref().unwrap_or(&**map);
                apply_leaf(leaf, current, at)?.commit(leaf, map, &mut out);
            }
        }
    }
    Ok(out.map(|map| Tree::Map(Arc::new(map))))
}

/// The effect of one leaf on its parent mapping.
enum LeafEffect {
    Unchanged,
    Set(Tree),
    Remove,
}

impl LeafEffect {
    fn commit(self, leaf: &Leaf, original: &Arc<TreeMap>, out: &mut Option<TreeMap>) {
        match self {
            LeafEffect::Unchanged => {}
            LeafEffect::Set(value) => {
                out.get_or_insert_with(|| (**original).clone())
                    .insert(leaf.key.clone(), value);
            }
            LeafEffect::Remove => {
                out.get_or_insert_with(|| (**original).clone())
                    .remove(&leaf.key);
            }
        }
    }
}

fn apply_leaf(leaf: &Leaf, map: &TreeMap, at: &Path) -> MapResult<LeafEffect> {
    let Some(value) = map.get(&leaf.key) else {
        return Ok(LeafEffect::Unchanged);
    };
    match leaf.mode {
        Iteration::Field => Ok(match (leaf.handler)(value.clone(), Position::Field) {
            Outcome::Replace(replacement) => LeafEffect::Set(replacement),
            Outcome::Delete => LeafEffect::Remove,
        }),
        _ if value.is_null() => Ok(LeafEffect::Unchanged),
        Iteration::Members => {
            let Some(members) = value.as_map() else {
                return Err(MapError::ExpectedMap {
                    path: at.child(leaf.key.clone()).to_string(),
                    actual: value.kind(),
                });
            };
            let rebuilt: TreeMap = members
                .iter()
                .filter_map(|(k, v)| match (leaf.handler)(v.clone(), Position::Member(k)) {
                    Outcome::Replace(replacement) => Some((k.clone(), replacement)),
                    Outcome::Delete => None,
                })
                .collect();
            Ok(LeafEffect::Set(Tree::from(rebuilt)))
        }
        Iteration::Elements => {
            let Some(elements) = value.as_seq() else {
                return Err(MapError::ExpectedSeq {
                    path: at.child(leaf.key.clone()).to_string(),
                    actual: value.kind(),
                });
            };
            let rebuilt: Vec<Tree> = elements
                .iter()
                .enumerate()
                .filter_map(|(i, v)| match (leaf.handler)(v.clone(), Position::Element(i)) {
                    Outcome::Replace(replacement) => Some(replacement),
                    Outcome::Delete => None,
                })
                .collect();
            Ok(LeafEffect::Set(Tree::from(rebuilt)))
        }
    }
}
