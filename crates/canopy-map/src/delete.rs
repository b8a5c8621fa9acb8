//! In-place key removal.

use std::sync::Arc;

use canopy_types::{Tree, TreeMap};
use tracing::trace;

/// Remove every mapping member named in `keys`, at every depth.
///
/// Subtrees shared with other trees are copied before being edited, so those
/// trees are unaffected. Subtrees containing no matching key are left
/// shared. Returns the number of members removed.
pub fn recursive_delete(tree: &mut Tree, keys: &[&str]) -> usize {
    let mut removed = 0;
    if let Some(pruned) = prune(tree, keys, &mut removed) {
        *tree = pruned;
    }
    trace!(removed, "recursive delete");
    removed
}

/// Returns `None` when nothing below `tree` matched.
fn prune(tree: &Tree, keys: &[&str], removed: &mut usize) -> Option<Tree> {
    match tree {
        Tree::Map(map) => {
            let mut out: Option<TreeMap> = None;
            for key in keys {
                let current = out.as_ref().unwrap_or(&**map);
                if current.contains_key(*key) {
                    out.get_or_insert_with(|| (**map).clone()).remove(*key);
                    *removed += 1;
                }
            }
            for (key, child) in map.iter() {
                if keys.contains(&key.as_str()) {
                    continue;
                }
                if let Some(pruned) = prune(child, keys, removed) {
                    out.get_or_insert_with(|| (**map).clone())
                        .insert(key.clone(), pruned);
                }
            }
            out.map(|map| Tree::Map(Arc::new(map)))
        }
        Tree::Seq(items) => {
            let mut out: Option<Vec<Tree>> = None;
            for (i, item) in items.iter().enumerate() {
                if let Some(pruned) = prune(item, keys, removed) {
                    out.get_or_insert_with(|| items.to_vec())[i] = pruned;
                }
            }
            out.map(|items| Tree::Seq(Arc::new(items)))
        }
        _ => None,
    }
}
