//! Bracket-notation field name parsing
//!
//! Grammar: `name` | `name[]` | `name[i]` | `name[i][j]...` | `name[i]...[]`
//! where `name` and every index are made of letters, digits, `_` and `-`.
//! An index made only of ASCII digits marks a sequence level; any other
//! index marks a mapping level. A trailing `[]` forces the leaf to be a
//! sequence even when a single value was submitted.

use crate::core::error::DomainError;

/// Parsed field name: path segments plus the force-sequence flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Object name followed by bracket indices
    pub segments: Vec<String>,
    /// Whether the key ended with `[]`
    pub force_sequence: bool,
}

impl FieldPath {
    /// Parse a raw form key
    ///
    /// ```
    /// use tally_domain::submission::FieldPath;
    ///
    /// let path = FieldPath::parse("row[0][entry_options][]").unwrap();
    /// assert_eq!(path.segments, vec!["row", "0", "entry_options"]);
    /// assert!(path.force_sequence);
    ///
    /// assert!(FieldPath::parse("row[").is_err());
    /// ```
    pub fn parse(key: &str) -> Result<Self, DomainError> {
        let malformed = || DomainError::MalformedFieldName(key.to_string());

        let name_end = key.find('[').unwrap_or(key.len());
        let name = &key[..name_end];
        if !is_identifier(name) {
            return Err(malformed());
        }

        let mut segments = vec![name.to_string()];
        let mut force_sequence = false;
        let mut rest = &key[name_end..];

        while !rest.is_empty() {
            let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
            let close = inner.find(']').ok_or_else(malformed)?;
            let index = &inner[..close];
            rest = &inner[close + 1..];

            if index.is_empty() {
                // `[]` is only allowed as the very last selector
                if !rest.is_empty() {
                    return Err(malformed());
                }
                force_sequence = true;
            } else if is_identifier(index) {
                segments.push(index.to_string());
            } else {
                return Err(malformed());
            }
        }

        Ok(Self {
            segments,
            force_sequence,
        })
    }
}

/// Whether a path segment is a numeric (sequence) index
pub fn is_numeric_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(key: &str) -> Vec<String> {
        FieldPath::parse(key).unwrap().segments
    }

    #[test]
    fn test_plain_name() {
        let path = FieldPath::parse("field").unwrap();
        assert_eq!(path.segments, vec!["field"]);
        assert!(!path.force_sequence);
    }

    #[test]
    fn test_trailing_brackets() {
        let path = FieldPath::parse("field[]").unwrap();
        assert_eq!(path.segments, vec!["field"]);
        assert!(path.force_sequence);
    }

    #[test]
    fn test_nested_selectors() {
        assert_eq!(segments("obj[field1]"), vec!["obj", "field1"]);
        assert_eq!(segments("row[0][field-1]"), vec!["row", "0", "field-1"]);
        assert_eq!(segments("a_b[x][1][y]"), vec!["a_b", "x", "1", "y"]);
    }

    #[test]
    fn test_malformed_names() {
        for key in [
            "",
            "[0]",
            "row[",
            "row]",
            "row[0",
            "row[0]x",
            "row[][0]",
            "row[a b]",
            "field name",
            "row[[0]]",
        ] {
            assert_eq!(
                FieldPath::parse(key),
                Err(DomainError::MalformedFieldName(key.to_string())),
                "expected {key:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_numeric_index() {
        assert!(is_numeric_index("0"));
        assert!(is_numeric_index("011"));
        assert!(!is_numeric_index("1a"));
        assert!(!is_numeric_index("-1"));
        assert!(!is_numeric_index(""));
    }
}
