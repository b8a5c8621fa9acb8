//! Persistent JSON-like trees.
//!
//! A [`Tree`] is a scalar, an ordered sequence, or a key-addressed mapping.
//! Containers sit behind an [`Arc`], so cloning any subtree is O(1) and two
//! trees can share unmodified branches. Mutation goes through the
//! copy-on-write accessors [`Tree::seq_mut`] and [`Tree::map_mut`]: a node
//! that is shared is detached before it is written, so no other holder ever
//! observes the change.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};

use crate::error::TypeError;
use crate::key::Key;

/// The mapping type used by [`Tree::Map`].
pub type TreeMap = BTreeMap<Key, Tree>;

/// A JSON-like value with shared, immutable containers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Tree {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Arc<Vec<Tree>>),
    Map(Arc<TreeMap>),
}

/// The shape of a [`Tree`] node, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Seq,
    Map,
}

impl Kind {
    /// Human-readable name with an article, e.g. "a mapping".
    pub fn describe(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "a boolean",
            Kind::Number => "a number",
            Kind::String => "a string",
            Kind::Seq => "a sequence",
            Kind::Map => "a mapping",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Seq => "sequence",
            Kind::Map => "mapping",
        };
        f.write_str(name)
    }
}

impl Tree {
    /// Build a sequence from anything convertible to trees.
    pub fn seq<T: Into<Tree>>(items: impl IntoIterator<Item = T>) -> Self {
        Tree::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a mapping from key/value pairs. Later duplicates win.
    pub fn map<K: Into<Key>, V: Into<Tree>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Tree::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// An empty sequence.
    pub fn empty_seq() -> Self {
        Tree::Seq(Arc::new(Vec::new()))
    }

    /// An empty mapping.
    pub fn empty_map() -> Self {
        Tree::Map(Arc::new(BTreeMap::new()))
    }

    /// Parse a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, TypeError> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Tree::from(value))
    }

    /// Convert into a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        Value::from(self)
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// Indented JSON text.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| self.to_json_string())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Tree::Null => Kind::Null,
            Tree::Bool(_) => Kind::Bool,
            Tree::Number(_) => Kind::Number,
            Tree::String(_) => Kind::String,
            Tree::Seq(_) => Kind::Seq,
            Tree::Map(_) => Kind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tree::Null)
    }

    /// Returns `true` for sequences and mappings.
    pub fn is_container(&self) -> bool {
        matches!(self, Tree::Seq(_) | Tree::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Tree::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tree::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tree::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tree::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Tree]> {
        match self {
            Tree::Seq(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&TreeMap> {
        match self {
            Tree::Map(map) => Some(&**map),
            _ => None,
        }
    }

    /// Mutable access to a sequence, detaching it first if it is shared.
    pub fn seq_mut(&mut self) -> Option<&mut Vec<Tree>> {
        match self {
            Tree::Seq(items) => Some(Arc::make_mut(items)),
            _ => None,
        }
    }

    /// Mutable access to a mapping, detaching it first if it is shared.
    pub fn map_mut(&mut self) -> Option<&mut TreeMap> {
        match self {
            Tree::Map(map) => Some(Arc::make_mut(map)),
            _ => None,
        }
    }

    /// Look up a mapping member.
    pub fn get(&self, key: &str) -> Option<&Tree> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Look up a sequence element.
    pub fn at(&self, index: usize) -> Option<&Tree> {
        self.as_seq().and_then(|items| items.get(index))
    }

    /// Follow a `/`-separated path of keys and indices.
    pub fn pointer(&self, path: &str) -> Option<&Tree> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('/').try_fold(self, |node, segment| match node {
            Tree::Map(map) => map.get(segment),
            Tree::Seq(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Deep equality that compares numbers by value, so `1` equals `1.0`.
    ///
    /// Integers are compared exactly; a float on either side compares as
    /// `f64`. Everything else behaves like `==`.
    pub fn equivalent(&self, other: &Tree) -> bool {
        match (self, other) {
            (Tree::Number(a), Tree::Number(b)) => numbers_equivalent(a, b),
            (Tree::Seq(a), Tree::Seq(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equivalent(y)))
            }
            (Tree::Map(a), Tree::Map(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.len() == b.len()
                        && a.iter()
                            .zip(b.iter())
                            .all(|((ka, va), (kb, vb))| ka == kb && va.equivalent(vb)))
            }
            (a, b) => a == b,
        }
    }

    /// Returns `true` if both trees are the same node.
    ///
    /// Containers are identical only when they share the same allocation.
    /// Scalars carry no identity and are identical when they are equal.
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        match (self, other) {
            (Tree::Seq(a), Tree::Seq(b)) => Arc::ptr_eq(a, b),
            (Tree::Map(a), Tree::Map(b)) => Arc::ptr_eq(a, b),
            (Tree::Seq(_) | Tree::Map(_), _) | (_, Tree::Seq(_) | Tree::Map(_)) => false,
            (a, b) => a == b,
        }
    }
}

fn numbers_equivalent(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_u64() == b.as_u64(),
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Value> for Tree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Tree::Null,
            Value::Bool(b) => Tree::Bool(b),
            Value::Number(n) => Tree::Number(n),
            Value::String(s) => Tree::String(s),
            Value::Array(items) => Tree::seq(items),
            Value::Object(map) => Tree::map(map),
        }
    }
}

impl From<&Tree> for Value {
    fn from(tree: &Tree) -> Self {
        match tree {
            Tree::Null => Value::Null,
            Tree::Bool(b) => Value::Bool(*b),
            Tree::Number(n) => Value::Number(n.clone()),
            Tree::String(s) => Value::String(s.clone()),
            Tree::Seq(items) => Value::Array(items.iter().map(Value::from).collect()),
            Tree::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.as_str().to_owned(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Value::from(&tree)
    }
}

impl From<bool> for Tree {
    fn from(b: bool) -> Self {
        Tree::Bool(b)
    }
}

impl From<i64> for Tree {
    fn from(n: i64) -> Self {
        Tree::Number(n.into())
    }
}

impl From<i32> for Tree {
    fn from(n: i32) -> Self {
        Tree::Number(n.into())
    }
}

impl From<u64> for Tree {
    fn from(n: u64) -> Self {
        Tree::Number(n.into())
    }
}

impl From<usize> for Tree {
    fn from(n: usize) -> Self {
        Tree::Number((n as u64).into())
    }
}

/// Non-finite floats have no JSON form and become `null`.
impl From<f64> for Tree {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Tree::Null, Tree::Number)
    }
}

impl From<&str> for Tree {
    fn from(s: &str) -> Self {
        Tree::String(s.to_owned())
    }
}

impl From<String> for Tree {
    fn from(s: String) -> Self {
        Tree::String(s)
    }
}

impl From<Key> for Tree {
    fn from(key: Key) -> Self {
        Tree::String(key.into_string())
    }
}

impl From<Vec<Tree>> for Tree {
    fn from(items: Vec<Tree>) -> Self {
        Tree::Seq(Arc::new(items))
    }
}

impl From<TreeMap> for Tree {
    fn from(map: TreeMap) -> Self {
        Tree::Map(Arc::new(map))
    }
}

impl<T: Into<Tree>> From<Option<T>> for Tree {
    fn from(value: Option<T>) -> Self {
        value.map_or(Tree::Null, Into::into)
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tree::Null => serializer.serialize_unit(),
            Tree::Bool(b) => serializer.serialize_bool(*b),
            Tree::Number(n) => n.serialize(serializer),
            Tree::String(s) => serializer.serialize_str(s),
            Tree::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Tree::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Tree::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_keeps_structure() {
        let value = json!({"a": [1, 2, {"b": null}], "c": "x", "d": true});
        let tree = Tree::from(value.clone());
        assert_eq!(tree.kind(), Kind::Map);
        assert_eq!(tree.to_json(), value);
    }

    #[test]
    fn clone_shares_containers() {
        let tree = Tree::from(json!({"a": {"b": 1}}));
        let copy = tree.clone();
        assert!(tree.ptr_eq(&copy));
        assert!(tree.get("a").unwrap().ptr_eq(copy.get("a").unwrap()));
    }

    #[test]
    fn map_mut_detaches_shared_node() {
        let original = Tree::from(json!({"x": 1, "y": 2}));
        let mut copy = original.clone();
        copy.map_mut().unwrap().insert(Key::from("z"), Tree::from(3));

        assert_eq!(original, Tree::from(json!({"x": 1, "y": 2})));
        assert_eq!(copy, Tree::from(json!({"x": 1, "y": 2, "z": 3})));
        assert!(!original.ptr_eq(&copy));
    }

    #[test]
    fn seq_mut_on_scalar_is_none() {
        let mut tree = Tree::from(1);
        assert!(tree.seq_mut().is_none());
        assert!(tree.map_mut().is_none());
    }

    #[test]
    fn equal_but_separate_containers_are_not_identical() {
        let a = Tree::from(json!([1, 2]));
        let b = Tree::from(json!([1, 2]));
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn scalars_are_identical_when_equal() {
        assert!(Tree::from("a").ptr_eq(&Tree::from("a")));
        assert!(!Tree::from(1).ptr_eq(&Tree::from(2)));
        assert!(!Tree::Null.ptr_eq(&Tree::empty_seq()));
    }

    #[test]
    fn pointer_walks_maps_and_seqs() {
        let tree = Tree::from(json!({"a": [{"b": 7}]}));
        assert_eq!(tree.pointer("a/0/b"), Some(&Tree::from(7)));
        assert_eq!(tree.pointer(""), Some(&tree));
        assert_eq!(tree.pointer("a/9"), None);
        assert_eq!(tree.pointer("a/x"), None);
    }

    #[test]
    fn parse_error_is_reported() {
        let err = Tree::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, TypeError::Parse(_)));
    }

    #[test]
    fn serde_matches_json() {
        let tree = Tree::from(json!({"k": [1, "two", null]}));
        let text = serde_json::to_string(&tree).unwrap();
        assert_eq!(text, r#"{"k":[1,"two",null]}"#);
        let back: Tree = serde_json::from_str(&text).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(Tree::from(f64::NAN), Tree::Null);
        assert_eq!(Tree::from(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn equivalent_compares_numbers_by_value() {
        let int = Tree::from(json!({"a": [1, 2]}));
        let float = Tree::from(json!({"a": [1.0, 2.0]}));
        assert_ne!(int, float);
        assert!(int.equivalent(&float));
        assert!(!int.equivalent(&Tree::from(json!({"a": [1.0, 2.5]}))));
        assert!(!Tree::from(json!(1)).equivalent(&Tree::from(json!("1"))));
        assert!(Tree::from(u64::MAX).equivalent(&Tree::from(u64::MAX)));
        assert!(!Tree::from(json!(-1)).equivalent(&Tree::from(u64::MAX)));
    }

    #[test]
    fn kind_descriptions() {
        assert_eq!(Kind::Map.describe(), "a mapping");
        assert_eq!(Kind::Seq.to_string(), "sequence");
        assert_eq!(Tree::from(json!(1)).kind(), Kind::Number);
    }

    fn arb_tree() -> impl Strategy<Value = Tree> {
        let leaf = prop_oneof![
            Just(Tree::Null),
            any::<bool>().prop_map(Tree::from),
            any::<i64>().prop_map(Tree::from),
            any::<u64>().prop_map(Tree::from),
            ".{0,8}".prop_map(Tree::from),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Tree::from),
                prop::collection::btree_map(".{0,4}", inner, 0..4).prop_map(|m| Tree::map(m)),
            ]
        })
    }

    proptest! {
        #[test]
        fn value_round_trip(t in arb_tree()) {
            prop_assert_eq!(Tree::from(t.to_json()), t);
        }

        #[test]
        fn text_round_trip(t in arb_tree()) {
            prop_assert_eq!(Tree::from_json_str(&t.to_json_string()).unwrap(), t.clone());
            prop_assert_eq!(Tree::from_json_str(&t.to_json_pretty()).unwrap(), t);
        }

        #[test]
        fn equivalent_agrees_with_eq_on_same_tree(t in arb_tree()) {
            prop_assert!(t.equivalent(&t.clone()));
        }
    }
}
