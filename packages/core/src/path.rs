//! Path expressions and their canonical `(record name, sub-path)` form.
//!
//! A record is addressed by a dot-joined name. Callers may spell that name in
//! several ways:
//!
//! - `"users/alice"` - a delimited string, split by the configured [`SplitPolicy`]
//! - `"users/alice@profile/email"` - everything after the first unescaped `@`
//!   addresses a key inside the record
//! - `["users", "alice"]` - raw segments, never implying a sub-path
//! - `{"path": ["users", "alice"], "subkey": ["profile"]}` - the pre-split form,
//!   taken as given
//!
//! All of them resolve through [`PathParser::parse`] into a [`CanonicalPath`].

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// How a delimited record path string is cut into segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Split on `/` only.
    #[default]
    Slash,
    /// Split on `.` only.
    Dot,
    /// Split on both `/` and `.`.
    SlashOrDot,
    /// Keep the whole string as a single segment.
    Whole,
}

impl SplitPolicy {
    /// Split `text` into non-empty segments.
    ///
    /// Empty pieces from leading, trailing or doubled separators are dropped,
    /// so `"/a//b/"` splits the same as `"a/b"`.
    pub fn split(self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = match self {
            SplitPolicy::Slash => text.split('/').collect(),
            SplitPolicy::Dot => text.split('.').collect(),
            SplitPolicy::SlashOrDot => text.split(|c: char| c == '/' || c == '.').collect(),
            SplitPolicy::Whole => vec![text],
        };

        pieces
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .map(|piece| piece.replace("\\@", "@"))
            .collect()
    }
}

/// A path expression as supplied by a caller.
///
/// Deserializing accepts the same shapes a dynamic caller would hand over: a
/// string, an array of strings, or an object with `path`/`segments` and an
/// optional `subkey`/`subkeySegments` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathExpr {
    /// A delimited string, optionally carrying an `@` sub-path.
    Text(String),
    /// Ordered raw segments of the record name.
    Segments(Vec<String>),
    /// Pre-split record and sub-path segments. Not re-validated.
    Structured {
        #[serde(alias = "path")]
        segments: Vec<String>,
        #[serde(default, alias = "subkeySegments")]
        subkey: Vec<String>,
    },
}

impl PathExpr {
    /// A delimited path string, optionally with an `@` sub-path.
    pub fn text(text: impl Into<String>) -> Self {
        PathExpr::Text(text.into())
    }

    /// Raw record name segments.
    pub fn segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PathExpr::Segments(segments.into_iter().map(Into::into).collect())
    }

    /// Pre-split record and sub-path segments.
    pub fn structured<I, J, S, T>(segments: I, subkey: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        PathExpr::Structured {
            segments: segments.into_iter().map(Into::into).collect(),
            subkey: subkey.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a dynamically typed value into a path expression.
    ///
    /// Numbers, booleans, `null` and objects without a segment array fail with
    /// [`Error::InvalidPathFormat`].
    pub fn from_json(value: &Value) -> Result<Self> {
        PathExpr::deserialize(value).map_err(|_| {
            Error::invalid_path(format!(
                "expected a string, an array of strings or a {{path, subkey}} object, got {}",
                value
            ))
        })
    }
}

impl From<&str> for PathExpr {
    fn from(text: &str) -> Self {
        PathExpr::Text(text.to_string())
    }
}

impl From<String> for PathExpr {
    fn from(text: String) -> Self {
        PathExpr::Text(text)
    }
}

impl From<&String> for PathExpr {
    fn from(text: &String) -> Self {
        PathExpr::Text(text.clone())
    }
}

impl From<Vec<String>> for PathExpr {
    fn from(segments: Vec<String>) -> Self {
        PathExpr::Segments(segments)
    }
}

impl From<Vec<&str>> for PathExpr {
    fn from(segments: Vec<&str>) -> Self {
        PathExpr::segments(segments)
    }
}

impl From<&[&str]> for PathExpr {
    fn from(segments: &[&str]) -> Self {
        PathExpr::segments(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for PathExpr {
    fn from(segments: [&str; N]) -> Self {
        PathExpr::segments(segments)
    }
}

impl From<&PathExpr> for PathExpr {
    fn from(expr: &PathExpr) -> Self {
        expr.clone()
    }
}

/// The normalized address of a value: which record, and where inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalPath {
    pub record_name: String,
    pub sub_path: Option<String>,
}

impl CanonicalPath {
    /// A path to `sub_path` inside `record_name`.
    pub fn new(record_name: impl Into<String>, sub_path: Option<String>) -> Self {
        Self {
            record_name: record_name.into(),
            sub_path,
        }
    }

    /// A path addressing a whole record.
    pub fn record(record_name: impl Into<String>) -> Self {
        Self::new(record_name, None)
    }

    /// The dot-joined key inside the record, if any.
    pub fn sub_path(&self) -> Option<&str> {
        self.sub_path.as_deref()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_path {
            Some(sub_path) => write!(f, "{}@{}", self.record_name, sub_path),
            None => write!(f, "{}", self.record_name),
        }
    }
}

/// Turns [`PathExpr`]s into [`CanonicalPath`]s under a fixed split policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathParser {
    policy: SplitPolicy,
}

impl PathParser {
    /// Create a parser splitting text paths with `policy`.
    pub fn new(policy: SplitPolicy) -> Self {
        Self { policy }
    }

    /// The split policy in use.
    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    /// Parse a path expression.
    ///
    /// With `name_only` set the result never carries a sub-path, even when the
    /// expression names one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recordfs_core::{CanonicalPath, PathParser};
    ///
    /// let parser = PathParser::default();
    /// assert_eq!(
    ///     parser.parse(&"a/b@c".into(), false).unwrap(),
    ///     CanonicalPath::new("a.b", Some("c".to_string()))
    /// );
    /// assert_eq!(
    ///     parser.parse(&"a/b@c".into(), true).unwrap(),
    ///     CanonicalPath::record("a.b")
    /// );
    /// ```
    pub fn parse(&self, expr: &PathExpr, name_only: bool) -> Result<CanonicalPath> {
        let (segments, subkey): (Cow<'_, [String]>, Cow<'_, [String]>) = match expr {
            PathExpr::Segments(segments) => {
                (Cow::Borrowed(segments.as_slice()), Cow::Owned(Vec::new()))
            }
            PathExpr::Structured { segments, subkey } => {
                (Cow::Borrowed(segments.as_slice()), Cow::Borrowed(subkey.as_slice()))
            }
            PathExpr::Text(text) => match split_subkey(text) {
                Some((record, subkey)) => (
                    Cow::Owned(self.policy.split(record)),
                    Cow::Owned(SplitPolicy::SlashOrDot.split(subkey)),
                ),
                None => (Cow::Owned(self.policy.split(text)), Cow::Owned(Vec::new())),
            },
        };

        if segments.is_empty() {
            return Err(Error::invalid_path(format!(
                "expression {:?} names no record",
                expr
            )));
        }

        let record_name = join_escaped(&segments);
        let sub_path = if name_only || subkey.is_empty() {
            None
        } else {
            Some(join_escaped(&subkey))
        };

        Ok(CanonicalPath {
            record_name,
            sub_path,
        })
    }
}

/// Split on the first `@` that is not preceded by a backslash.
fn split_subkey(text: &str) -> Option<(&str, &str)> {
    text.char_indices()
        .find(|&(i, c)| c == '@' && !text[..i].ends_with('\\'))
        .map(|(i, _)| (&text[..i], &text[i + 1..]))
}

fn join_escaped(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| escape_segment(segment))
        .collect::<Vec<_>>()
        .join(".")
}

/// Collapse every run of `.` or `/` inside a segment into a single `_`.
///
/// A segment value can then never forge an extra level in the joined name.
pub fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(|c: char| c == '.' || c == '/') {
        return Cow::Borrowed(segment);
    }

    let mut escaped = String::with_capacity(segment.len());
    let mut in_run = false;
    for c in segment.chars() {
        if c == '.' || c == '/' {
            if !in_run {
                escaped.push('_');
            }
            in_run = true;
        } else {
            escaped.push(c);
            in_run = false;
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(expr: impl Into<PathExpr>) -> CanonicalPath {
        PathParser::default().parse(&expr.into(), false).unwrap()
    }

    #[test]
    fn slash_string_is_record_name() {
        assert_eq!(parse("a/b/c"), CanonicalPath::record("a.b.c"));
    }

    #[test]
    fn at_sign_splits_sub_path() {
        assert_eq!(
            parse("a/b@c"),
            CanonicalPath::new("a.b", Some("c".to_string()))
        );
    }

    #[test]
    fn sub_path_splits_on_both_delimiters() {
        assert_eq!(
            parse("users/alice@profile/email"),
            CanonicalPath::new("users.alice", Some("profile.email".to_string()))
        );
        assert_eq!(
            parse("users/alice@profile.email"),
            CanonicalPath::new("users.alice", Some("profile.email".to_string()))
        );
    }

    #[test]
    fn only_first_at_sign_splits() {
        assert_eq!(
            parse("a@b@c"),
            CanonicalPath::new("a", Some("b@c".to_string()))
        );
    }

    #[test]
    fn escaped_at_sign_stays_in_record_name() {
        assert_eq!(parse("mail/bob\\@example"), CanonicalPath::record("mail.bob@example"));
    }

    #[test]
    fn segment_array_never_implies_sub_path() {
        assert_eq!(parse(["a", "b"]), CanonicalPath::record("a.b"));
        assert_eq!(parse(["a", "b@c"]), CanonicalPath::record("a.b@c"));
    }

    #[test]
    fn structured_form_is_used_as_given() {
        let expr = PathExpr::structured(["a", "b"], ["c"]);
        assert_eq!(parse(expr), CanonicalPath::new("a.b", Some("c".to_string())));
    }

    #[test]
    fn structured_segments_are_escaped() {
        let expr = PathExpr::structured(["x/y", "z"], ["k.v"]);
        assert_eq!(
            parse(expr),
            CanonicalPath::new("x_y.z", Some("k_v".to_string()))
        );
    }

    #[test]
    fn escaping_collapses_runs() {
        assert_eq!(escape_segment("a./.b"), "a_b");
        assert_eq!(escape_segment("plain"), "plain");
        assert!(matches!(escape_segment("plain"), Cow::Borrowed(_)));
        assert_eq!(escape_segment("//"), "_");
    }

    #[test]
    fn name_only_drops_sub_path() {
        let parser = PathParser::default();
        let canonical = parser.parse(&"a/b@c".into(), true).unwrap();
        assert_eq!(canonical, CanonicalPath::record("a.b"));
    }

    #[test]
    fn empty_subkey_means_no_sub_path() {
        assert_eq!(parse("a/b@"), CanonicalPath::record("a.b"));
        assert_eq!(parse(PathExpr::structured(["a"], Vec::<String>::new())), CanonicalPath::record("a"));
    }

    #[test]
    fn redundant_slashes_are_ignored() {
        assert_eq!(parse("/a//b/"), CanonicalPath::record("a.b"));
    }

    #[test]
    fn split_policies() {
        assert_eq!(SplitPolicy::Slash.split("a/b.c"), vec!["a", "b.c"]);
        assert_eq!(SplitPolicy::Dot.split("a/b.c"), vec!["a/b", "c"]);
        assert_eq!(SplitPolicy::SlashOrDot.split("a/b.c"), vec!["a", "b", "c"]);
        assert_eq!(SplitPolicy::Whole.split("a/b.c"), vec!["a/b.c"]);
    }

    #[test]
    fn whole_policy_still_escapes() {
        let parser = PathParser::new(SplitPolicy::Whole);
        let canonical = parser.parse(&"a/b.c".into(), false).unwrap();
        assert_eq!(canonical, CanonicalPath::record("a_b_c"));
    }

    #[test]
    fn dot_policy_keeps_slashes_escaped() {
        let parser = PathParser::new(SplitPolicy::Dot);
        let canonical = parser.parse(&"a/b.c".into(), false).unwrap();
        assert_eq!(canonical, CanonicalPath::record("a_b.c"));
    }

    #[test]
    fn empty_expressions_are_rejected() {
        let parser = PathParser::default();
        for expr in [PathExpr::text(""), PathExpr::text("@c"), PathExpr::Segments(vec![])] {
            let err = parser.parse(&expr, false).unwrap_err();
            assert!(matches!(err, Error::InvalidPathFormat { .. }));
        }
    }

    #[test]
    fn parse_is_deterministic() {
        let parser = PathParser::default();
        let expr = PathExpr::text("a/b@c/d");
        assert_eq!(
            parser.parse(&expr, false).unwrap(),
            parser.parse(&expr, false).unwrap()
        );
    }

    #[test]
    fn json_expressions() {
        assert_eq!(PathExpr::from_json(&json!("a/b")).unwrap(), PathExpr::text("a/b"));
        assert_eq!(
            PathExpr::from_json(&json!(["a", "b"])).unwrap(),
            PathExpr::segments(["a", "b"])
        );
        assert_eq!(
            PathExpr::from_json(&json!({"path": ["a", "b"], "subkey": ["c"]})).unwrap(),
            PathExpr::structured(["a", "b"], ["c"])
        );
        assert_eq!(
            PathExpr::from_json(&json!({"segments": ["a"]})).unwrap(),
            PathExpr::structured(["a"], Vec::<String>::new())
        );
    }

    #[test]
    fn json_number_is_invalid_path_format() {
        let err = PathExpr::from_json(&json!(42)).unwrap_err();
        assert!(matches!(err, Error::InvalidPathFormat { .. }));
    }

    #[test]
    fn json_object_without_segments_is_invalid() {
        let err = PathExpr::from_json(&json!({"subkey": ["c"]})).unwrap_err();
        assert!(matches!(err, Error::InvalidPathFormat { .. }));
    }

    #[test]
    fn canonical_display() {
        assert_eq!(parse("a/b@c").to_string(), "a.b@c");
        assert_eq!(parse("a/b").to_string(), "a.b");
    }
}
