//! Diff records: one reported mismatch between a tree and a mask.
//!
//! Records serialize to the stable shape external callers build messages
//! from:
//!
//! ```json
//! { "path": "a/1", "tree": 8, "mask": 9, "error": "optional" }
//! ```
//!
//! Special values use reserved markers: `"__missing__"` for an absent tree
//! value, `"__absent__"` for a mask that requires absence,
//! `"__predicate__"` for an unlabelled predicate, and
//! `["__duplicate_keys__", [...]]` for set-mask key collisions.

use std::fmt;

use canopy_types::{Key, Path, Tree};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{json, Value};

pub const MISSING_MARKER: &str = "__missing__";
pub const ABSENT_MARKER: &str = "__absent__";
pub const PREDICATE_MARKER: &str = "__predicate__";
pub const DUPLICATE_KEYS_MARKER: &str = "__duplicate_keys__";

/// The tree side of a diff record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Actual {
    /// No value exists at the path.
    Missing,
    /// The value found at the path.
    Value(Tree),
    /// The tree side of a set comparison had colliding keys.
    DuplicateKeys(Vec<Key>),
    /// Nothing to report on this side.
    Nil,
}

/// The mask side of a diff record, rendered for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    /// The mask required the value to be absent.
    Absent,
    /// A predicate rejected the value; carries the predicate's label.
    Predicate(Option<String>),
    /// The rendered mask.
    Value(Tree),
    /// The mask side of a set comparison had colliding keys.
    DuplicateKeys(Vec<Key>),
    /// Nothing to report on this side.
    Nil,
}

impl Actual {
    /// Wrap an optional tree node; `None` is missing.
    pub fn from_node(tree: Option<&Tree>) -> Self {
        tree.map_or(Actual::Missing, |t| Actual::Value(t.clone()))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Actual::Missing)
    }

    /// The found value, if any.
    pub fn value(&self) -> Option<&Tree> {
        match self {
            Actual::Value(t) => Some(t),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Actual::Missing => Value::from(MISSING_MARKER),
            Actual::Value(t) => t.to_json(),
            Actual::DuplicateKeys(keys) => duplicate_keys_json(keys),
            Actual::Nil => Value::Null,
        }
    }
}

impl Expected {
    pub fn is_absent(&self) -> bool {
        matches!(self, Expected::Absent)
    }

    /// The rendered mask value, if any.
    pub fn value(&self) -> Option<&Tree> {
        match self {
            Expected::Value(t) => Some(t),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expected::Absent => Value::from(ABSENT_MARKER),
            Expected::Predicate(Some(label)) => Value::from(label.as_str()),
            Expected::Predicate(None) => Value::from(PREDICATE_MARKER),
            Expected::Value(t) => t.to_json(),
            Expected::DuplicateKeys(keys) => duplicate_keys_json(keys),
            Expected::Nil => Value::Null,
        }
    }
}

fn duplicate_keys_json(keys: &[Key]) -> Value {
    let keys: Vec<&str> = keys.iter().map(Key::as_str).collect();
    json!([DUPLICATE_KEYS_MARKER, keys])
}

impl fmt::Display for Actual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actual::Missing => f.write_str("nothing"),
            Actual::Value(t) => write!(f, "{t}"),
            Actual::DuplicateKeys(keys) => write!(f, "duplicate keys {}", join_keys(keys)),
            Actual::Nil => f.write_str("null"),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Absent => f.write_str("nothing"),
            Expected::Predicate(Some(label)) => write!(f, "a value satisfying {label}"),
            Expected::Predicate(None) => f.write_str("a value satisfying the predicate"),
            Expected::Value(t) => write!(f, "{t}"),
            Expected::DuplicateKeys(keys) => write!(f, "duplicate keys {}", join_keys(keys)),
            Expected::Nil => f.write_str("null"),
        }
    }
}

fn join_keys(keys: &[Key]) -> String {
    let names: Vec<&str> = keys.iter().map(Key::as_str).collect();
    format!("[{}]", names.join(", "))
}

/// One mismatch between a tree and a mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffRecord {
    /// `/`-joined keys and indices from the root; empty for the root.
    pub path: String,
    pub tree: Actual,
    pub mask: Expected,
    pub error: Option<String>,
}

impl DiffRecord {
    pub fn new(path: &Path, tree: Actual, mask: Expected) -> Self {
        Self {
            path: path.to_string(),
            tree,
            mask,
            error: None,
        }
    }

    /// Attach an error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn to_json(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("path".into(), Value::from(self.path.as_str()));
        out.insert("tree".into(), self.tree.to_json());
        out.insert("mask".into(), self.mask.to_json());
        if let Some(error) = &self.error {
            out.insert("error".into(), Value::from(error.as_str()));
        }
        Value::Object(out)
    }
}

impl Serialize for DiffRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.error.is_some() { 4 } else { 3 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("path", &self.path)?;
        map.serialize_entry("tree", &self.tree.to_json())?;
        map.serialize_entry("mask", &self.mask.to_json())?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        map.end()
    }
}

impl fmt::Display for DiffRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str("at root")?;
        } else {
            write!(f, "at '{}'", self.path)?;
        }
        write!(f, ": expected {}, got {}", self.mask, self.tree)?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

/// Render a list of records as one message, one record per line.
pub fn render_report(records: &[DiffRecord]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_types::tree;

    fn path(s: &str) -> Path {
        s.split('/').filter(|p| !p.is_empty()).collect()
    }

    #[test]
    fn serializes_with_markers() {
        let record = DiffRecord::new(&path("a"), Actual::Missing, Expected::Absent);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"path": "a", "tree": "__missing__", "mask": "__absent__"})
        );
    }

    #[test]
    fn error_field_only_when_present() {
        let record = DiffRecord::new(&path("s"), Actual::Nil, Expected::Nil);
        assert!(record.to_json().get("error").is_none());

        let record = record.with_error("boom");
        assert_eq!(record.to_json()["error"], json!("boom"));
        assert_eq!(serde_json::to_value(&record).unwrap(), record.to_json());
    }

    #[test]
    fn duplicate_keys_payload() {
        let record = DiffRecord::new(
            &path("set"),
            Actual::DuplicateKeys(vec![Key::from("a")]),
            Expected::Nil,
        );
        assert_eq!(
            record.to_json(),
            json!({"path": "set", "tree": ["__duplicate_keys__", ["a"]], "mask": null})
        );
    }

    #[test]
    fn predicate_renders_label_or_marker() {
        assert_eq!(Expected::Predicate(None).to_json(), json!("__predicate__"));
        assert_eq!(
            Expected::Predicate(Some("even".into())).to_json(),
            json!("even")
        );
    }

    #[test]
    fn display_messages() {
        let record = DiffRecord::new(
            &path("b/c/1"),
            Actual::Value(tree!(8)),
            Expected::Value(tree!(9)),
        );
        assert_eq!(record.to_string(), "at 'b/c/1': expected 9, got 8");

        let root = DiffRecord::new(&Path::root(), Actual::Missing, Expected::Value(tree!([1])))
            .with_error("no value");
        assert_eq!(root.to_string(), "at root: expected [1], got nothing (no value)");
    }

    #[test]
    fn report_joins_lines() {
        let records = vec![
            DiffRecord::new(&path("a"), Actual::Value(tree!(1)), Expected::Value(tree!(2))),
            DiffRecord::new(&path("b"), Actual::Value(tree!(1)), Expected::Absent),
        ];
        assert_eq!(
            render_report(&records),
            "at 'a': expected 2, got 1\nat 'b': expected nothing, got 1"
        );
    }
}
