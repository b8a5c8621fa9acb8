//! Order-independent sequence comparison.
//!
//! A [`SetMask`] turns both the tree sequence and its own items into
//! mappings keyed by a caller-supplied key extractor, then compares the
//! mappings. Physical order stops mattering and mismatches are reported at
//! `path/<key>` instead of `path/<index>`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use canopy_types::{Key, Path, Tree, TreeMap};
use tracing::trace;

use crate::compare::compare_map;
use crate::mask::{render_items, Comparator, Mask, MaskItem};
use crate::record::{Actual, DiffRecord, Expected};

type KeyFn = dyn Fn(&Tree) -> Key + Send + Sync;

/// A mask comparing a sequence as a keyed set.
///
/// Without a [`MaskItem::Tail`] among its items the mask is strict: tree
/// elements whose key the mask does not name are reported as extras. With
/// a tail anywhere in the items, extras are allowed.
#[derive(Clone)]
pub struct SetMask {
    items: Vec<Mask>,
    open: bool,
    key_of: Arc<KeyFn>,
}

impl SetMask {
    /// Build a set mask. Mask items are keyed through their rendered form,
    /// so `key_of` sees sentinels as their marker strings.
    pub fn new(
        items: impl IntoIterator<Item = MaskItem>,
        key_of: impl Fn(&Tree) -> Key + Send + Sync + 'static,
    ) -> Self {
        let mut masks = Vec::new();
        let mut open = false;
        for item in items {
            match item {
                MaskItem::Mask(mask) => masks.push(mask),
                MaskItem::Tail => open = true,
            }
        }
        Self {
            items: masks,
            open,
            key_of: Arc::new(key_of),
        }
    }

    /// Build a set mask keyed by the value of a mapping field.
    pub fn by_field(field: impl Into<String>, items: impl IntoIterator<Item = MaskItem>) -> Self {
        let field = field.into();
        Self::new(items, move |tree| field_key(tree, &field))
    }

    pub fn items(&self) -> &[Mask] {
        &self.items
    }

    /// Returns `true` when extra tree elements are allowed.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The key this mask assigns to a tree element.
    pub fn key_of(&self, tree: &Tree) -> Key {
        (self.key_of)(tree)
    }

    /// The declared items as a tree, tail marker included.
    pub fn describe_items(&self) -> Tree {
        render_items(&self.items, self.open)
    }
}

/// Key of a mapping element by field: strings as-is, other values as JSON
/// text, a missing field (or a non-mapping element) as `null`.
fn field_key(tree: &Tree, field: &str) -> Key {
    match tree.get(field) {
        Some(Tree::String(s)) => Key::from(s.as_str()),
        Some(other) => Key::from(other.to_json_string()),
        None => Key::from("null"),
    }
}

/// Keys that occur more than once, in order of first occurrence.
fn duplicates(keys: &[Key]) -> Vec<Key> {
    let mut counts: HashMap<&Key, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut out: Vec<Key> = Vec::new();
    for key in keys {
        if counts[key] > 1 && !out.contains(key) {
            out.push(key.clone());
        }
    }
    out
}

impl Comparator for SetMask {
    fn compare(&self, tree: Option<&Tree>, path: &Path, _index: Option<usize>) -> Vec<DiffRecord> {
        let Some(Tree::Seq(elements)) = tree else {
            return vec![DiffRecord::new(
                path,
                Actual::from_node(tree),
                Expected::Value(self.describe_items()),
            )];
        };

        let tree_keys: Vec<Key> = elements.iter().map(|e| self.key_of(e)).collect();
        let by_key: TreeMap = tree_keys
            .iter()
            .cloned()
            .zip(elements.iter().cloned())
            .collect();

        let mask_keys: Vec<Key> = self.items.iter().map(|m| self.key_of(&m.render())).collect();
        let mask_by_key: BTreeMap<Key, Mask> = mask_keys
            .iter()
            .cloned()
            .zip(self.items.iter().cloned())
            .collect();

        if by_key.len() < elements.len() {
            let dups = duplicates(&tree_keys);
            trace!(%path, count = dups.len(), "duplicate keys in tree set");
            return vec![DiffRecord::new(path, Actual::DuplicateKeys(dups), Expected::Nil)
                .with_error("duplicate keys in tree")];
        }
        if mask_by_key.len() < self.items.len() {
            let dups = duplicates(&mask_keys);
            trace!(%path, count = dups.len(), "duplicate keys in set mask");
            return vec![DiffRecord::new(path, Actual::Nil, Expected::DuplicateKeys(dups))
                .with_error("duplicate keys in mask")];
        }

        if !self.open {
            let extras: Vec<DiffRecord> = tree_keys
                .iter()
                .zip(elements.iter())
                .filter(|(key, _)| !mask_by_key.contains_key(*key))
                .map(|(key, element)| {
                    DiffRecord::new(&path.child(key), Actual::Value(element.clone()), Expected::Absent)
                })
                .collect();
            if !extras.is_empty() {
                trace!(%path, count = extras.len(), "extra elements in strict set");
                return extras;
            }
        }

        compare_map(&by_key, &mask_by_key, path)
    }

    fn describe(&self) -> Tree {
        self.describe_items()
    }
}

impl fmt::Debug for SetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetMask")
            .field("items", &self.items)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::tree_compare;
    use canopy_types::tree;

    fn by_name(items: Vec<MaskItem>) -> Mask {
        Mask::Set(SetMask::new(items, |t| {
            Key::from(t.get("name").and_then(Tree::as_str).unwrap_or_default())
        }))
    }

    fn item(t: Tree) -> MaskItem {
        MaskItem::from(t)
    }

    fn rec(path: &str, tree: Actual, mask: Expected) -> DiffRecord {
        DiffRecord {
            path: path.to_string(),
            tree,
            mask,
            error: None,
        }
    }

    #[test]
    fn order_is_irrelevant() {
        let t = tree!({"set": [{"id": 2, "name": "b"}, {"id": 1, "name": "a"}]});
        let m = Mask::map([(
            "set",
            by_name(vec![
                item(tree!({"id": 1, "name": "a"})),
                item(tree!({"id": 2, "name": "b"})),
            ]),
        )]);
        assert!(tree_compare(&t, &m).is_empty());
    }

    #[test]
    fn missing_set_attribute() {
        let m = Mask::map([("set", by_name(vec![item(tree!({"id": 1, "name": "a"}))]))]);
        assert_eq!(
            tree_compare(&tree!({}), &m),
            vec![rec(
                "set",
                Actual::Missing,
                Expected::Value(tree!([{"id": 1, "name": "a"}]))
            )]
        );
    }

    #[test]
    fn missing_items_reported_by_key() {
        let m = Mask::map([("set", by_name(vec![item(tree!({"id": 1, "name": "a"}))]))]);
        assert_eq!(
            tree_compare(&tree!({"set": []}), &m),
            vec![rec(
                "set/a",
                Actual::Missing,
                Expected::Value(tree!({"id": 1, "name": "a"}))
            )]
        );
    }

    #[test]
    fn extra_items_reported_when_strict() {
        let m = Mask::map([("set", by_name(vec![]))]);
        assert_eq!(
            tree_compare(&tree!({"set": [{"id": 1, "name": "a"}]}), &m),
            vec![rec(
                "set/a",
                Actual::Value(tree!({"id": 1, "name": "a"})),
                Expected::Absent
            )]
        );
    }

    #[test]
    fn duplicate_tree_keys() {
        let t = tree!({"set": [{"id": 1, "name": "a"}, {"id": 2, "name": "a"}]});
        let m = Mask::map([("set", by_name(vec![MaskItem::Tail]))]);
        let diffs = tree_compare(&t, &m);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "set");
        assert_eq!(diffs[0].tree, Actual::DuplicateKeys(vec![Key::from("a")]));
        assert_eq!(diffs[0].mask, Expected::Nil);
        assert_eq!(
            diffs[0].to_json(),
            serde_json::json!({
                "path": "set",
                "tree": ["__duplicate_keys__", ["a"]],
                "mask": null,
                "error": "duplicate keys in tree"
            })
        );
    }

    #[test]
    fn duplicate_mask_keys() {
        let t = tree!({"set": [{"id": 1, "name": "a"}]});
        let m = Mask::map([(
            "set",
            by_name(vec![
                item(tree!({"id": 1, "name": "a"})),
                item(tree!({"id": 2, "name": "a"})),
            ]),
        )]);
        let diffs = tree_compare(&t, &m);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].tree, Actual::Nil);
        assert_eq!(diffs[0].mask, Expected::DuplicateKeys(vec![Key::from("a")]));
    }

    #[test]
    fn tree_duplicates_take_priority() {
        let t = tree!([{"name": "x"}, {"name": "x"}]);
        let m = by_name(vec![item(tree!({"name": "y"})), item(tree!({"name": "y"}))]);
        let diffs = tree_compare(&t, &m);
        assert_eq!(diffs.len(), 1);
        assert!(matches!(diffs[0].tree, Actual::DuplicateKeys(_)));
    }

    #[test]
    fn tail_allows_subset() {
        let t = tree!({"set": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]});
        let m = Mask::map([(
            "set",
            by_name(vec![item(tree!({"id": 2, "name": "b"})), MaskItem::Tail]),
        )]);
        assert!(tree_compare(&t, &m).is_empty());
    }

    #[test]
    fn mismatched_members_reported_under_key() {
        let t = tree!([{"id": 1, "name": "a"}, {"id": 9, "name": "b"}]);
        let m = by_name(vec![
            item(tree!({"id": 1, "name": "a"})),
            item(tree!({"id": 2, "name": "b"})),
        ]);
        assert_eq!(
            tree_compare(&t, &m),
            vec![rec("b/id", Actual::Value(tree!(9)), Expected::Value(tree!(2)))]
        );
    }

    #[test]
    fn scalar_where_set_expected() {
        let m = Mask::map([(
            "set",
            Mask::Set(SetMask::by_field("x", vec![item(tree!({"x": 1}))])),
        )]);
        assert_eq!(
            tree_compare(&tree!({"set": 1}), &m),
            vec![rec("set", Actual::Value(tree!(1)), Expected::Value(tree!([{"x": 1}])))]
        );
    }

    #[test]
    fn items_with_sentinels_are_keyed_by_rendered_form() {
        let t = tree!([{"name": "a", "id": 7}]);
        let m = Mask::Set(SetMask::by_field(
            "name",
            vec![MaskItem::from(Mask::map([
                ("name", Mask::from("a")),
                ("id", Mask::Present),
            ]))],
        ));
        assert!(tree_compare(&t, &m).is_empty());
    }

    #[test]
    fn field_keys_render_non_strings_as_json() {
        assert_eq!(field_key(&tree!({"id": 3}), "id"), Key::from("3"));
        assert_eq!(field_key(&tree!({"id": "x"}), "id"), Key::from("x"));
        assert_eq!(field_key(&tree!({}), "id"), Key::from("null"));
        assert_eq!(field_key(&tree!(5), "id"), Key::from("null"));
    }

    #[test]
    fn duplicates_in_first_occurrence_order() {
        let keys: Vec<Key> = ["b", "a", "b", "c", "a"].into_iter().map(Key::from).collect();
        assert_eq!(duplicates(&keys), vec![Key::from("b"), Key::from("a")]);
    }
}
