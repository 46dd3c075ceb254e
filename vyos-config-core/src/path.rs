//! Dual literal/schema configuration paths.
//!
//! A [`ConfigPath`] carries the path as configured (`firewall/name/LAN-IN`)
//! next to the path used for grammar lookups (`firewall/name/node.tag`).
//! Both sequences always have the same length.

use std::fmt::{self, Display, Formatter};

use serde::{Serialize, Serializer};

use crate::tree::{SchemaNode, TAG_PLACEHOLDER};

/// One path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed grammar word; schema segment equals the literal.
    Static(String),
    /// Caller-supplied value at a tag level; schema segment is the placeholder.
    Dynamic(String),
}

impl Segment {
    pub fn fixed(name: impl Into<String>) -> Self {
        Segment::Static(name.into())
    }

    pub fn value(value: impl Into<String>) -> Self {
        Segment::Dynamic(value.into())
    }

    /// Segment for `name` below `parent`: dynamic when `parent` is a tag node.
    pub fn under(parent: Option<&SchemaNode>, name: impl Into<String>) -> Self {
        if parent.is_some_and(|p| p.is_tag) {
            Segment::Dynamic(name.into())
        } else {
            Segment::Static(name.into())
        }
    }

    /// Literal text of the segment.
    pub fn literal(&self) -> &str {
        match self {
            Segment::Static(name) | Segment::Dynamic(name) => name,
        }
    }

    /// Schema text of the segment.
    pub fn schema(&self) -> &str {
        match self {
            Segment::Static(name) => name,
            Segment::Dynamic(_) => TAG_PLACEHOLDER,
        }
    }
}

/// Literal and schema path kept in lockstep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPath {
    literal: Vec<String>,
    schema: Vec<String>,
}

impl ConfigPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path from segments.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut path = Self::new();
        path.append(segments);
        path
    }

    /// Push segments onto this path.
    pub fn append(&mut self, segments: impl IntoIterator<Item = Segment>) {
        for segment in segments {
            self.schema.push(segment.schema().to_string());
            self.literal.push(match segment {
                Segment::Static(name) | Segment::Dynamic(name) => name,
            });
        }
    }

    /// New path with `segments` appended; `self` is left untouched.
    pub fn extend(&self, segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut path = self.clone();
        path.append(segments);
        path
    }

    /// New path made of all but the last `n` segments of `self`, followed by
    /// `segments`.
    pub fn diverge_from(&self, n: usize, segments: impl IntoIterator<Item = Segment>) -> Self {
        let keep = self.len().saturating_sub(n);
        let mut path = Self {
            literal: self.literal[..keep].to_vec(),
            schema: self.schema[..keep].to_vec(),
        };
        path.append(segments);
        path
    }

    /// Path without its last segment, or `None` for the empty path.
    pub fn parent(&self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self.diverge_from(1, Vec::<Segment>::new()))
        }
    }

    pub fn literal(&self) -> &[String] {
        &self.literal
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Last literal segment.
    pub fn last(&self) -> Option<&str> {
        self.literal.last().map(String::as_str)
    }

    /// Whether segment `idx` is a tag value.
    pub fn is_dynamic(&self, idx: usize) -> bool {
        matches!(
            (self.literal.get(idx), self.schema.get(idx)),
            (Some(lit), Some(schema)) if schema == TAG_PLACEHOLDER && lit != TAG_PLACEHOLDER
        )
    }

    /// Segment at `idx` rebuilt with its static/dynamic tag.
    pub fn segment(&self, idx: usize) -> Option<Segment> {
        let literal = self.literal.get(idx)?.clone();
        Some(if self.is_dynamic(idx) {
            Segment::Dynamic(literal)
        } else {
            Segment::Static(literal)
        })
    }

    pub fn len(&self) -> usize {
        self.literal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literal.is_empty()
    }

    /// `/`-joined literal path; the key used for indexing and conflicts.
    pub fn literal_string(&self) -> String {
        self.literal.join("/")
    }

    /// `/`-joined schema path.
    pub fn schema_string(&self) -> String {
        self.schema.join("/")
    }
}

impl Serialize for ConfigPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.literal_string())
    }
}

impl Display for ConfigPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigPath, Segment};

    fn rule_path() -> ConfigPath {
        ConfigPath::from_segments([
            Segment::fixed("firewall"),
            Segment::fixed("name"),
            Segment::value("LAN-IN"),
            Segment::fixed("rule"),
            Segment::value("1000"),
        ])
    }

    #[test]
    fn dynamic_segments_use_placeholder_in_schema_path() {
        let path = rule_path();
        assert_eq!(path.literal_string(), "firewall/name/LAN-IN/rule/1000");
        assert_eq!(path.schema_string(), "firewall/name/node.tag/rule/node.tag");
        assert_eq!(path.literal().len(), path.schema().len());
    }

    #[test]
    fn extend_leaves_receiver_untouched() {
        let base = rule_path();
        let action = base.extend([Segment::fixed("action")]);
        assert_eq!(base.len(), 5);
        assert_eq!(action.len(), 6);
        assert_eq!(action.last(), Some("action"));
    }

    #[test]
    fn diverge_from_drops_trailing_segments() {
        let base = rule_path();
        let other = base.diverge_from(2, [Segment::fixed("default-action")]);
        assert_eq!(other.literal_string(), "firewall/name/LAN-IN/default-action");
        assert_eq!(other.schema_string(), "firewall/name/node.tag/default-action");

        let past_root = base.diverge_from(99, [Segment::fixed("nat")]);
        assert_eq!(past_root.literal_string(), "nat");
    }

    #[test]
    fn segments_round_trip_their_kind() {
        let path = rule_path();
        assert_eq!(path.segment(2), Some(Segment::value("LAN-IN")));
        assert_eq!(path.segment(3), Some(Segment::fixed("rule")));
        assert_eq!(path.parent().map(|p| p.len()), Some(4));
        assert!(ConfigPath::new().parent().is_none());
    }
}
