//! Flat-key to nested-structure unpacking
//!
//! Turns a [`FlatFields`] multimap into a [`ValueTree`]. It handles:
//!
//! - multiple values without brackets, i.e. `field=a&field=b`
//! - multiple values PHP style, i.e. `field[]=a&field[]=b`
//! - objects, i.e. `obj[field1]=a&obj[field2]=b`
//! - rows of several fields, i.e. `row[0][field1]`, `row[1][field1]`
//! - nested multiples, i.e. `row[0][entry_id]`, `row[0][entry_options][]`
//!
//! A level whose indices are all numeric becomes a sequence ordered by the
//! numeric value of the index. Gaps are not filled: `row[0]`, `row[2]`
//! yields a two-element sequence. Levels mixing numeric and named indices
//! stay mappings.

use super::field_name::{FieldPath, is_numeric_index};
use super::fields::FlatFields;
use crate::core::error::DomainError;
use crate::value::ValueTree;
use std::cmp::Ordering;
use std::collections::BTreeMap;

enum Node {
    Leaf(ValueTree),
    Branch(BTreeMap<String, Node>),
}

impl Node {
    fn into_tree(self) -> ValueTree {
        match self {
            Node::Leaf(tree) => tree,
            Node::Branch(children) => {
                if !children.is_empty() && children.keys().all(|k| is_numeric_index(k)) {
                    let mut rows: Vec<(String, Node)> = children.into_iter().collect();
                    rows.sort_by(|(a, _), (b, _)| numeric_order(a, b));
                    ValueTree::Sequence(rows.into_iter().map(|(_, n)| n.into_tree()).collect())
                } else {
                    ValueTree::Mapping(
                        children
                            .into_iter()
                            .map(|(k, n)| (k, n.into_tree()))
                            .collect(),
                    )
                }
            }
        }
    }
}

/// Unpack submitted form fields into a nested value tree
///
/// The root is always a mapping keyed by field name. Fails with
/// [`DomainError::MalformedFieldName`] for keys outside the bracket grammar
/// and [`DomainError::ConflictingField`] when two keys claim the same path
/// (e.g. `a` together with `a[b]`).
///
/// # Example
///
/// ```
/// use tally_domain::submission::{FlatFields, unpack};
/// use tally_domain::value::ValueTree;
/// use serde_json::json;
///
/// let fields = FlatFields::from_pairs([
///     ("row[1][fld]", "b"),
///     ("row[0][fld]", "a"),
///     ("tags[]", "x"),
/// ]);
/// let tree = unpack(&fields).unwrap();
/// assert_eq!(tree, ValueTree::from(json!({
///     "row": [{"fld": "a"}, {"fld": "b"}],
///     "tags": ["x"],
/// })));
/// ```
pub fn unpack(fields: &FlatFields) -> Result<ValueTree, DomainError> {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();

    for (key, values) in fields.iter() {
        let path = FieldPath::parse(key)?;

        // single element stays single unless the key asked for a list
        let leaf = if values.len() == 1 && !path.force_sequence {
            ValueTree::string(values[0].clone())
        } else {
            ValueTree::strings(values.iter().cloned())
        };

        insert(&mut root, &path.segments, leaf, key)?;
    }

    Ok(ValueTree::Mapping(
        root.into_iter().map(|(k, n)| (k, n.into_tree())).collect(),
    ))
}

fn insert(
    level: &mut BTreeMap<String, Node>,
    segments: &[String],
    leaf: ValueTree,
    key: &str,
) -> Result<(), DomainError> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(DomainError::MalformedFieldName(key.to_string()));
    };

    if rest.is_empty() {
        if level.contains_key(head) {
            return Err(DomainError::ConflictingField(key.to_string()));
        }
        level.insert(head.clone(), Node::Leaf(leaf));
        return Ok(());
    }

    match level
        .entry(head.clone())
        .or_insert_with(|| Node::Branch(BTreeMap::new()))
    {
        Node::Branch(children) => insert(children, rest, leaf, key),
        Node::Leaf(_) => Err(DomainError::ConflictingField(key.to_string())),
    }
}

/// Order numeric index strings by value without parsing into a fixed-width int
fn numeric_order(a: &str, b: &str) -> Ordering {
    let ta = a.trim_start_matches('0');
    let tb = b.trim_start_matches('0');
    ta.len()
        .cmp(&tb.len())
        .then_with(|| ta.cmp(tb))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn unpack_pairs(pairs: &[(&str, &str)]) -> Result<Value, DomainError> {
        let fields = FlatFields::from_pairs(pairs.iter().copied());
        unpack(&fields).map(|t| t.to_json())
    }

    #[test]
    fn test_multiple_wo_brackets() {
        let tree = unpack_pairs(&[("field", "val1"), ("field", "val2")]).unwrap();
        assert_eq!(tree, json!({"field": ["val1", "val2"]}));
    }

    #[test]
    fn test_multiple_with_brackets() {
        let tree = unpack_pairs(&[("field[]", "val1"), ("field[]", "val2")]).unwrap();
        assert_eq!(tree, json!({"field": ["val1", "val2"]}));
    }

    #[test]
    fn test_single_wo_brackets() {
        let tree = unpack_pairs(&[("field", "val1")]).unwrap();
        assert_eq!(tree, json!({"field": "val1"}));
    }

    #[test]
    fn test_single_with_brackets() {
        let tree = unpack_pairs(&[("field[]", "val1")]).unwrap();
        assert_eq!(tree, json!({"field": ["val1"]}));
    }

    #[test]
    fn test_object() {
        let tree = unpack_pairs(&[("obj[field1]", "val1"), ("obj[field2]", "val2")]).unwrap();
        assert_eq!(tree, json!({"obj": {"field1": "val1", "field2": "val2"}}));
    }

    #[test]
    fn test_rows() {
        let tree = unpack_pairs(&[
            ("row[0][field1]", "val1"),
            ("row[0][field2]", "val2"),
            ("row[1][field1]", "val3"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            json!({"row": [{"field1": "val1", "field2": "val2"}, {"field1": "val3"}]})
        );
    }

    #[test]
    fn test_rows_inverse_order() {
        let tree = unpack_pairs(&[
            ("row[1][field1]", "val3"),
            ("row[0][field1]", "val1"),
            ("row[0][field2]", "val2"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            json!({"row": [{"field1": "val1", "field2": "val2"}, {"field1": "val3"}]})
        );
    }

    #[test]
    fn test_rows_numeric_not_lexicographic_order() {
        let keys: Vec<(String, String)> = (0..=11)
            .rev()
            .map(|i| (format!("row[{i}][fld]"), i.to_string()))
            .collect();
        let fields = FlatFields::from_pairs(keys);
        let tree = unpack(&fields).unwrap().to_json();

        let expected: Vec<Value> = (0..=11).map(|i| json!({"fld": i.to_string()})).collect();
        assert_eq!(tree, json!({"row": expected}));
    }

    #[test]
    fn test_scalar_rows_ordered_by_value() {
        let tree = unpack_pairs(&[("row[11]", "c"), ("row[2]", "b"), ("row[0]", "a")]).unwrap();
        assert_eq!(tree, json!({"row": ["a", "b", "c"]}));
    }

    #[test]
    fn test_rows_missing_index_collapses() {
        let tree = unpack_pairs(&[("row[0][fld]", "0"), ("row[2][fld]", "2")]).unwrap();
        assert_eq!(tree, json!({"row": [{"fld": "0"}, {"fld": "2"}]}));
    }

    #[test]
    fn test_rows_mixed_index_stays_mapping() {
        let tree = unpack_pairs(&[("row[0][fld]", "a"), ("row[bla][fld]", "b")]).unwrap();
        assert_eq!(tree, json!({"row": {"0": {"fld": "a"}, "bla": {"fld": "b"}}}));
    }

    #[test]
    fn test_nested_rows_not_numbered() {
        let tree = unpack_pairs(&[
            ("row[0][entry_id]", "val1"),
            ("row[0][entry_options][]", "val2"),
            ("row[0][entry_options][]", "val3"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            json!({"row": [{"entry_id": "val1", "entry_options": ["val2", "val3"]}]})
        );
    }

    #[test]
    fn test_nested_rows_numbered() {
        let tree = unpack_pairs(&[
            ("row[0][entry_id]", "val1"),
            ("row[0][entry_options][0]", "val2"),
            ("row[0][entry_options][1]", "val3"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            json!({"row": [{"entry_id": "val1", "entry_options": ["val2", "val3"]}]})
        );
    }

    #[test]
    fn test_leading_zero_indices() {
        let tree = unpack_pairs(&[("row[10]", "c"), ("row[02]", "b"), ("row[1]", "a")]).unwrap();
        assert_eq!(tree, json!({"row": ["a", "b", "c"]}));
    }

    #[test]
    fn test_deterministic_across_key_order() {
        let forward = unpack_pairs(&[
            ("obj[b]", "2"),
            ("obj[a]", "1"),
            ("row[1]", "y"),
            ("row[0]", "x"),
            ("name", "n"),
        ])
        .unwrap();
        let backward = unpack_pairs(&[
            ("name", "n"),
            ("row[0]", "x"),
            ("row[1]", "y"),
            ("obj[a]", "1"),
            ("obj[b]", "2"),
        ])
        .unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_root_numeric_names_stay_mapping() {
        let tree = unpack_pairs(&[("0", "a"), ("1", "b")]).unwrap();
        assert_eq!(tree, json!({"0": "a", "1": "b"}));
    }

    #[test]
    fn test_malformed_key_fails() {
        let err = unpack_pairs(&[("name", "ok"), ("row[0", "x")]).unwrap_err();
        assert_eq!(err, DomainError::MalformedFieldName("row[0".to_string()));
    }

    #[test]
    fn test_scalar_and_nested_conflict() {
        let err = unpack_pairs(&[("a", "1"), ("a[b]", "2")]).unwrap_err();
        assert_eq!(err, DomainError::ConflictingField("a[b]".to_string()));

        let err = unpack_pairs(&[("a[b]", "2"), ("a", "1")]).unwrap_err();
        assert_eq!(err, DomainError::ConflictingField("a".to_string()));
    }

    #[test]
    fn test_same_path_twice_conflicts() {
        let err = unpack_pairs(&[("field", "1"), ("field[]", "2")]).unwrap_err();
        assert!(err.is_submission_error());
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(unpack_pairs(&[]).unwrap(), json!({}));
    }
}
