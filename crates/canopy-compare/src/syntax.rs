//! Masks written as plain data.
//!
//! [`MaskSyntax`] reads a JSON-like document as a mask, so masks can live in
//! files next to the trees they check. Marker strings stand for sentinels
//! and a few single-key mappings act as directives:
//!
//! | document                                | mask                          |
//! |-----------------------------------------|-------------------------------|
//! | `"+"`                                   | [`Mask::Present`]             |
//! | `"-"`                                   | [`Mask::Absent`]              |
//! | `["*"]`                                 | [`Mask::AnySeq`]              |
//! | `[1, 2, "*"]`                           | open sequence mask            |
//! | `{"$set": [...], "$key": "id"}`         | [`SetMask`] keyed by `id`     |
//! | `{"$exact": value}`                     | deep-equality literal         |
//! | `{"$one_of": [...]}`                    | [`OneOf`]                     |
//! | `{"$any": true}`                        | [`AnyValue`]                  |

use serde::{Deserialize, Serialize};

use canopy_types::{Tree, TreeMap};

use crate::builtins::{AnyValue, OneOf};
use crate::error::{MaskError, MaskResult};
use crate::mask::{Mask, MaskItem, SeqMask, ABSENT_TOKEN, PRESENT_TOKEN, TAIL_TOKEN};
use crate::set_mask::SetMask;

/// Marker strings and directive keys recognised when parsing a mask.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskSyntax {
    pub present: String,
    pub absent: String,
    pub tail: String,
    pub set: String,
    pub set_key: String,
    pub exact: String,
    pub one_of: String,
    pub any: String,
}

impl Default for MaskSyntax {
    fn default() -> Self {
        Self {
            present: PRESENT_TOKEN.into(),
            absent: ABSENT_TOKEN.into(),
            tail: TAIL_TOKEN.into(),
            set: "$set".into(),
            set_key: "$key".into(),
            exact: "$exact".into(),
            one_of: "$one_of".into(),
            any: "$any".into(),
        }
    }
}

impl MaskSyntax {
    /// Parse a document into a mask.
    pub fn parse(&self, doc: &Tree) -> MaskResult<Mask> {
        match doc {
            Tree::String(s) if *s == self.present => Ok(Mask::Present),
            Tree::String(s) if *s == self.absent => Ok(Mask::Absent),
            Tree::String(s) if *s == self.tail => Err(MaskError::MisplacedTail),
            Tree::Seq(items) if items.len() == 1 && self.is_tail(&items[0]) => Ok(Mask::AnySeq),
            Tree::Seq(items) => {
                let declared = items
                    .iter()
                    .map(|item| self.parse_item(item))
                    .collect::<MaskResult<Vec<_>>>()?;
                SeqMask::new(declared).map(Mask::Seq)
            }
            Tree::Map(entries) => self.parse_map(entries),
            scalar => Ok(Mask::Literal(scalar.clone())),
        }
    }

    fn is_tail(&self, item: &Tree) -> bool {
        item.as_str() == Some(self.tail.as_str())
    }

    fn parse_item(&self, item: &Tree) -> MaskResult<MaskItem> {
        if self.is_tail(item) {
            Ok(MaskItem::Tail)
        } else {
            self.parse(item).map(MaskItem::Mask)
        }
    }

    fn parse_map(&self, entries: &TreeMap) -> MaskResult<Mask> {
        if let Some(items) = entries.get(self.set.as_str()) {
            return self.parse_set(entries, items);
        }
        if entries.len() == 1 {
            if let Some(value) = entries.get(self.exact.as_str()) {
                return Ok(Mask::exact(value.clone()));
            }
            if let Some(alternatives) = entries.get(self.one_of.as_str()) {
                let Some(alternatives) = alternatives.as_seq() else {
                    return Err(MaskError::InvalidDirective(format!(
                        "{} expects a sequence, got {}",
                        self.one_of,
                        alternatives.kind()
                    )));
                };
                let masks = alternatives
                    .iter()
                    .map(|alt| self.parse(alt))
                    .collect::<MaskResult<Vec<_>>>()?;
                return Ok(Mask::custom(OneOf::new(masks)));
            }
            if entries.contains_key(self.any.as_str()) {
                return Ok(Mask::custom(AnyValue));
            }
        }
        let masks = entries
            .iter()
            .map(|(k, v)| self.parse(v).map(|m| (k.clone(), m)))
            .collect::<MaskResult<Vec<_>>>()?;
        Ok(Mask::map(masks))
    }

    fn parse_set(&self, entries: &TreeMap, items: &Tree) -> MaskResult<Mask> {
        let Some(field) = entries.get(self.set_key.as_str()).and_then(Tree::as_str) else {
            return Err(MaskError::InvalidSetMask(format!(
                "{} requires a string {} field",
                self.set, self.set_key
            )));
        };
        if entries.len() != 2 {
            return Err(MaskError::InvalidSetMask(format!(
                "only {} and {} are allowed in a set mask",
                self.set, self.set_key
            )));
        }
        let Some(items) = items.as_seq() else {
            return Err(MaskError::InvalidSetMask(format!(
                "{} expects a sequence, got {}",
                self.set,
                items.kind()
            )));
        };
        let declared = items
            .iter()
            .map(|item| self.parse_item(item))
            .collect::<MaskResult<Vec<_>>>()?;
        Ok(Mask::Set(SetMask::by_field(field, declared)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::tree_compare;
    use crate::record::{Actual, Expected};
    use canopy_types::tree;

    fn parse(doc: Tree) -> Mask {
        MaskSyntax::default().parse(&doc).unwrap()
    }

    #[test]
    fn sentinels_from_markers() {
        assert!(matches!(parse(tree!("+")), Mask::Present));
        assert!(matches!(parse(tree!("-")), Mask::Absent));
        assert!(matches!(parse(tree!(["*"])), Mask::AnySeq));
        assert!(matches!(parse(tree!("plain")), Mask::Literal(_)));
    }

    #[test]
    fn trailing_tail_opens_sequence() {
        let mask = parse(tree!([1, "*"]));
        assert!(matches!(&mask, Mask::Seq(s) if s.is_open() && s.items().len() == 1));
        assert!(tree_compare(&tree!([1, 2, 3]), &mask).is_empty());
    }

    #[test]
    fn interior_tail_is_an_error() {
        let err = MaskSyntax::default().parse(&tree!([1, "*", 2])).unwrap_err();
        assert_eq!(err, MaskError::InteriorTail { index: 1 });
    }

    #[test]
    fn bare_tail_is_an_error() {
        let err = MaskSyntax::default().parse(&tree!({"a": "*"})).unwrap_err();
        assert_eq!(err, MaskError::MisplacedTail);
    }

    #[test]
    fn set_directive() {
        let mask = parse(tree!({"set": {"$set": [{"name": "a"}, {"name": "b"}], "$key": "name"}}));
        let t = tree!({"set": [{"name": "b"}, {"name": "a"}]});
        assert!(tree_compare(&t, &mask).is_empty());

        let t = tree!({"set": [{"name": "b"}, {"name": "c"}, {"name": "a"}]});
        let diffs = tree_compare(&t, &mask);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "set/c");
        assert_eq!(diffs[0].mask, Expected::Absent);
    }

    #[test]
    fn set_directive_with_tail_is_open() {
        let mask = parse(tree!({"$set": [{"name": "a"}, "*"], "$key": "name"}));
        assert!(tree_compare(&tree!([{"name": "z"}, {"name": "a"}]), &mask).is_empty());
    }

    #[test]
    fn set_directive_requires_key() {
        let err = MaskSyntax::default()
            .parse(&tree!({"$set": []}))
            .unwrap_err();
        assert!(matches!(err, MaskError::InvalidSetMask(_)));

        let err = MaskSyntax::default()
            .parse(&tree!({"$set": 3, "$key": "id"}))
            .unwrap_err();
        assert!(matches!(err, MaskError::InvalidSetMask(_)));
    }

    #[test]
    fn exact_directive() {
        let mask = parse(tree!({"a": {"$exact": {"x": 1}}}));
        let diffs = tree_compare(&tree!({"a": {"x": 1, "y": 2}}), &mask);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].tree, Actual::Value(tree!({"x": 1, "y": 2})));
    }

    #[test]
    fn one_of_and_any_directives() {
        let mask = parse(tree!({"a": {"$one_of": [1, "+"]}, "b": {"$any": true}}));
        assert!(tree_compare(&tree!({"a": "anything"}), &mask).is_empty());

        let err = MaskSyntax::default()
            .parse(&tree!({"$one_of": 1}))
            .unwrap_err();
        assert!(matches!(err, MaskError::InvalidDirective(_)));
    }

    #[test]
    fn custom_markers_from_toml() {
        let syntax: MaskSyntax = toml::from_str(
            r#"
            present = "<present>"
            absent = "<absent>"
            "#,
        )
        .unwrap();
        assert_eq!(syntax.tail, "*");
        assert!(matches!(syntax.parse(&tree!("<present>")).unwrap(), Mask::Present));
        assert!(matches!(syntax.parse(&tree!("+")).unwrap(), Mask::Literal(_)));
    }
}
