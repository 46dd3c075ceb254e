use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::constraint::Constraint;

/// Directory name used by the grammar for the children of a tag node.
pub const TAG_PLACEHOLDER: &str = "node.tag";

/// Value type declared by a `type:` scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// No `type:` scope; the node is a presence flag or a container.
    #[default]
    Unset,
    Bool,
    U32,
    Txt,
    MacAddr,
    Ipv4,
    Ipv6,
    Ipv4Net,
    Ipv6Net,
}

impl NodeType {
    /// Grammar token for this type.
    pub fn token(self) -> &'static str {
        match self {
            NodeType::Unset => "unset",
            NodeType::Bool => "bool",
            NodeType::U32 => "u32",
            NodeType::Txt => "txt",
            NodeType::MacAddr => "macaddr",
            NodeType::Ipv4 => "ipv4",
            NodeType::Ipv6 => "ipv6",
            NodeType::Ipv4Net => "ipv4net",
            NodeType::Ipv6Net => "ipv6net",
        }
    }

    /// Parse a `type:` value. Compound declarations such as `ipv4, ipv6`
    /// resolve to their first recognized token.
    pub fn from_declaration(raw: &str) -> Option<NodeType> {
        raw.split(',')
            .map(str::trim)
            .find_map(|token| token.parse().ok())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "bool" => Ok(NodeType::Bool),
            "u32" => Ok(NodeType::U32),
            "txt" => Ok(NodeType::Txt),
            "macaddr" => Ok(NodeType::MacAddr),
            "ipv4" => Ok(NodeType::Ipv4),
            "ipv6" => Ok(NodeType::Ipv6),
            "ipv4net" => Ok(NodeType::Ipv4Net),
            "ipv6net" => Ok(NodeType::Ipv6Net),
            other => Err(format!("unknown node type '{other}'")),
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One vocabulary element of the configuration grammar.
///
/// Built once by [`crate::parser::parse_dir`] and shared read-only
/// afterwards; children are reference counted so definitions can hold
/// on to the node they are bound to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaNode {
    /// Directory name of this node (`node.tag` for tag value levels).
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// `help:` text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// `val_help:` hints in encounter order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value_help: Vec<String>,
    /// This level names a caller-supplied value.
    pub is_tag: bool,
    /// This level accepts more than one value.
    pub multi: bool,
    /// Schema path from the root, `/`-joined. Empty for the root.
    pub path: String,
    /// Raw `allowed:` command text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<String>,
    /// Raw `syntax:expression:` texts in encounter order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<String>,
    /// Validation constraints derived from `allowed:` and `syntax:`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Child nodes keyed by name.
    pub children: BTreeMap<String, Arc<SchemaNode>>,
}

impl SchemaNode {
    /// Create a node with the provided name and path and no attributes.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Return the direct child with the provided name.
    pub fn child(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.children.get(name)
    }

    /// Return the child holding the values of this tag node.
    pub fn tag_child(&self) -> Option<&Arc<SchemaNode>> {
        self.child(TAG_PLACEHOLDER)
    }

    /// Walk a schema path (placeholders already substituted) from this node.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&Arc<SchemaNode>> {
        let (first, rest) = path.split_first()?;
        let mut current = self.child(first.as_ref())?;
        for segment in rest {
            current = current.child(segment.as_ref())?;
        }
        Some(current)
    }

    /// Whether the node carries no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .values()
            .map(|child| child.node_count())
            .sum::<usize>()
    }
}

impl Display for SchemaNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.node_type != NodeType::Unset {
            write!(f, " <{}>", self.node_type)?;
        }
        if self.is_tag {
            write!(f, " [tag]")?;
        }
        if self.multi {
            write!(f, " [multi]")?;
        }
        if let Some(help) = &self.help {
            write!(f, " - {help}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{NodeType, SchemaNode};

    fn sample() -> SchemaNode {
        let mut action = SchemaNode::new("action", "firewall/name/node.tag/action");
        action.node_type = NodeType::Txt;
        let mut tag = SchemaNode::new("node.tag", "firewall/name/node.tag");
        tag.children.insert("action".into(), Arc::new(action));
        let mut name = SchemaNode::new("name", "firewall/name");
        name.is_tag = true;
        name.children.insert("node.tag".into(), Arc::new(tag));
        let mut firewall = SchemaNode::new("firewall", "firewall");
        firewall.children.insert("name".into(), Arc::new(name));
        let mut root = SchemaNode::new("templates", "");
        root.children.insert("firewall".into(), Arc::new(firewall));
        root
    }

    #[test]
    fn find_walks_schema_path() {
        let root = sample();
        let node = root
            .find(&["firewall", "name", "node.tag", "action"])
            .expect("action node");
        assert_eq!(node.node_type, NodeType::Txt);
        assert!(root.find(&["firewall", "missing"]).is_none());
        assert!(root.find::<&str>(&[]).is_none());
    }

    #[test]
    fn counts_every_node() {
        assert_eq!(sample().node_count(), 5);
    }

    #[test]
    fn compound_type_declaration_takes_first_known_token() {
        assert_eq!(
            NodeType::from_declaration("ipv4net, ipv6net"),
            Some(NodeType::Ipv4Net)
        );
        assert_eq!(NodeType::from_declaration("bogus"), None);
    }

    #[test]
    fn display_renders_header() {
        let root = sample();
        let name = root.find(&["firewall", "name"]).expect("name node");
        assert_eq!(name.to_string(), "name [tag]");
    }
}
