//! The tree comparator: walk a tree and a mask in lock-step and report
//! every mismatch as a [`DiffRecord`].
//!
//! Comparison never fails. Shape mismatches, missing values and unexpected
//! extras all become records; a panicking predicate propagates to the
//! caller untouched.
//!
//! Dispatch order (first match wins):
//!
//! 1. [`Mask::AnySeq`] against a sequence matches.
//! 2. [`Mask::Present`] against a present value matches.
//! 3. [`Mask::Absent`] against a present value is reported as `__absent__`.
//! 4. Custom comparators and set masks take over completely.
//! 5. Predicates match when they return `true`.
//! 6. Mapping masks compare the keys they name, in key order.
//! 7. Sequence masks compare element-wise, in index order.
//! 8. Everything else is compared by deep equality, with numbers compared
//!    by value (`1` equals `1.0`).

use std::collections::BTreeMap;

use canopy_types::{Key, Path, Tree, TreeMap};
use tracing::debug;

use crate::mask::{Comparator, Mask, SeqMask};
use crate::record::{Actual, DiffRecord, Expected};

/// Compare `tree` against `mask` from the root.
///
/// Returns every mismatch reachable under the mask, in a stable order. An
/// empty list means the tree satisfies the mask.
pub fn tree_compare(tree: &Tree, mask: &Mask) -> Vec<DiffRecord> {
    let diffs = compare_at(Some(tree), mask, &Path::root(), None);
    debug!(records = diffs.len(), "tree compared against mask");
    diffs
}

/// Compare a node (or a missing node, as `None`) at `path`.
///
/// `index` is the running position when called from inside a sequence
/// comparison. Custom comparators use this to recurse.
pub fn compare_at(
    tree: Option<&Tree>,
    mask: &Mask,
    path: &Path,
    index: Option<usize>,
) -> Vec<DiffRecord> {
    match (mask, tree) {
        (Mask::AnySeq, Some(Tree::Seq(_))) => Vec::new(),
        (Mask::Present, Some(_)) => Vec::new(),
        (Mask::Absent, Some(value)) => vec![DiffRecord::new(
            path,
            Actual::Value(value.clone()),
            Expected::Absent,
        )],
        (Mask::Absent, None) => Vec::new(),
        (Mask::Custom(comparator), _) => comparator.compare(tree, path, index),
        (Mask::Set(set), _) => set.compare(tree, path, index),
        (Mask::Predicate(p), _) => {
            if p.test(tree) {
                Vec::new()
            } else {
                vec![mismatch(path, tree, mask)]
            }
        }
        (Mask::Map(entries), Some(Tree::Map(map))) => compare_map(map, entries, path),
        (Mask::Seq(seq), Some(Tree::Seq(items))) => {
            compare_seq(items, seq, path, index.unwrap_or(0))
        }
        (Mask::Literal(expected), Some(actual)) if actual.equivalent(expected) => Vec::new(),
        _ => vec![mismatch(path, tree, mask)],
    }
}

/// Compare a mapping against a mapping mask.
///
/// Only keys named by the mask are visited; extra tree keys are ignored. A
/// key the tree lacks is compared as missing.
pub fn compare_map(tree: &TreeMap, mask: &BTreeMap<Key, Mask>, path: &Path) -> Vec<DiffRecord> {
    mask.iter()
        .flat_map(|(key, sub)| compare_at(tree.get(key), sub, &path.child(key), None))
        .collect()
}

/// Element-wise comparison. `start` is the index of `items[0]` within the
/// enclosing sequence and only affects reported paths.
fn compare_seq(items: &[Tree], mask: &SeqMask, path: &Path, start: usize) -> Vec<DiffRecord> {
    let expected = mask.items();
    let mut diffs = Vec::new();
    let mut offset = 0;
    loop {
        let tree_done = offset >= items.len();
        let mask_done = offset >= expected.len();
        if mask_done && (tree_done || mask.is_open()) {
            return diffs;
        }
        let here = path.child(start + offset);
        if tree_done {
            diffs.push(DiffRecord::new(
                &here,
                Actual::Missing,
                Expected::Value(mask.render_from(offset)),
            ));
            return diffs;
        }
        if mask_done {
            diffs.push(DiffRecord::new(
                &here,
                Actual::Value(Tree::seq(items[offset..].iter().cloned())),
                Expected::Absent,
            ));
            return diffs;
        }
        diffs.extend(compare_at(Some(&items[offset]), &expected[offset], &here, None));
        offset += 1;
    }
}

fn mismatch(path: &Path, tree: Option<&Tree>, mask: &Mask) -> DiffRecord {
    DiffRecord::new(path, Actual::from_node(tree), mask.expected())
}
