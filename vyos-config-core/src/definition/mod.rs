//! Configured values bound to schema nodes.
//!
//! A [`Definition`] is one configured element; [`Definitions`] owns a whole
//! tree of them together with two indexes keyed by full literal path
//! (`firewall/name/LAN-IN/rule/1000/action`): one to the bound schema node
//! and one to the definition's position in the tree. Callers address the
//! tree by path only and never hold mutable references into siblings.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::constraint::validate_value;
use crate::path::{ConfigPath, Segment};
use crate::tree::SchemaNode;

pub mod builder;
pub mod template;

pub use builder::{generate_populated_definition_tree, generate_sparse_definition_tree};
pub use template::{Scalar, Template, TemplateValue};

/// Errors raised while assembling a definition tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// Two definitions claimed the same full path under [`DuplicatePolicy::Reject`].
    #[error("duplicate definition at {path}")]
    DuplicatePath { path: String },
    /// A path tried to descend below a definition that already holds a value.
    #[error("definition at {path} holds a value and cannot have children")]
    NotAContainer { path: String },
    /// A value was assigned to a definition that already has children.
    #[error("definition at {path} has children and cannot hold a value")]
    ValueOnContainer { path: String },
    /// The parent a subtree should be attached to does not exist.
    #[error("parent definition not found: {path}")]
    ParentNotFound { path: String },
    #[error("definition path is empty")]
    EmptyPath,
}

/// What happens when a value is registered twice at the same full path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Log a warning and keep the last value.
    #[default]
    Warn,
    /// Fail with [`DefinitionError::DuplicatePath`].
    Reject,
}

/// Value carried by a definition. A definition with children is `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefinitionValue {
    #[default]
    Empty,
    Single(String),
    Multi(Vec<String>),
}

impl DefinitionValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, DefinitionValue::Empty)
    }

    /// All scalar values, in order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            DefinitionValue::Empty => &[],
            DefinitionValue::Single(value) => std::slice::from_ref(value),
            DefinitionValue::Multi(values) => values,
        }
    }
}

impl Display for DefinitionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionValue::Empty => Ok(()),
            DefinitionValue::Single(value) => write!(f, "{value}"),
            DefinitionValue::Multi(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

/// One configured value or value group bound to a schema node.
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    pub name: String,
    /// Path of the parent, excluding this element.
    pub path: ConfigPath,
    /// Whether `name` is a caller-supplied tag value.
    #[serde(skip)]
    pub dynamic: bool,
    #[serde(skip)]
    pub schema_node: Option<Arc<SchemaNode>>,
    #[serde(skip)]
    pub parent_schema_node: Option<Arc<SchemaNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "DefinitionValue::is_empty")]
    pub value: DefinitionValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Definition>,
}

impl Definition {
    /// Create an unbound, empty definition for `segment` below `parent`.
    pub fn new(segment: Segment, parent: ConfigPath) -> Self {
        let dynamic = matches!(segment, Segment::Dynamic(_));
        Self {
            name: segment.literal().to_string(),
            path: parent,
            dynamic,
            schema_node: None,
            parent_schema_node: None,
            comment: None,
            value: DefinitionValue::Empty,
            children: Vec::new(),
        }
    }

    pub fn segment(&self) -> Segment {
        if self.dynamic {
            Segment::Dynamic(self.name.clone())
        } else {
            Segment::Static(self.name.clone())
        }
    }

    /// Parent path plus this element.
    pub fn full_path(&self) -> ConfigPath {
        self.path.extend([self.segment()])
    }

    /// `/`-joined full literal path; the key used for indexing and conflicts.
    pub fn full_path_string(&self) -> String {
        self.full_path().literal_string()
    }

    /// Holds a value (and therefore no children).
    pub fn is_leaf(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&Definition> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Walk literal names below this definition.
    pub fn find<S: AsRef<str>>(&self, names: &[S]) -> Option<&Definition> {
        let mut current = self;
        for name in names {
            current = current.child(name.as_ref())?;
        }
        Some(current)
    }

    /// This definition and all descendants, pre-order.
    pub fn walk(&self) -> Vec<&Definition> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// A failed value check found by [`Definitions::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// A definition tree plus its path indexes.
#[derive(Debug, Clone)]
pub struct Definitions {
    schema: Arc<SchemaNode>,
    policy: DuplicatePolicy,
    roots: Vec<Definition>,
    schema_nodes: BTreeMap<String, Arc<SchemaNode>>,
    index: BTreeMap<String, Vec<usize>>,
}

impl Definitions {
    /// Empty tree bound to `schema`.
    pub fn new(schema: Arc<SchemaNode>) -> Self {
        Self {
            schema,
            policy: DuplicatePolicy::default(),
            roots: Vec::new(),
            schema_nodes: BTreeMap::new(),
            index: BTreeMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Definitions with an empty parent path.
    pub fn roots(&self) -> &[Definition] {
        &self.roots
    }

    /// Number of indexed definitions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Every indexed full path, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn contains(&self, full_path: &str) -> bool {
        self.index.contains_key(full_path)
    }

    pub fn get(&self, full_path: &str) -> Option<&Definition> {
        self.node_at(self.index.get(full_path)?)
    }

    /// Schema node recorded for `full_path`.
    pub fn schema_node(&self, full_path: &str) -> Option<&Arc<SchemaNode>> {
        self.schema_nodes.get(full_path)
    }

    /// Definitions from the root down to `full_path`, inclusive.
    pub fn chain(&self, full_path: &str) -> Vec<&Definition> {
        let Some(location) = self.index.get(full_path) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(location.len());
        let mut siblings = self.roots.as_slice();
        for idx in location {
            let Some(def) = siblings.get(*idx) else {
                break;
            };
            out.push(def);
            siblings = &def.children;
        }
        out
    }

    /// Every definition, pre-order.
    pub fn walk(&self) -> Vec<&Definition> {
        self.roots.iter().flat_map(Definition::walk).collect()
    }

    /// Return the definition at `path`, creating empty containers for every
    /// missing segment. Existing containers are reused.
    pub fn ensure(&mut self, path: &ConfigPath) -> Result<&mut Definition, DefinitionError> {
        if path.is_empty() {
            return Err(DefinitionError::EmptyPath);
        }

        let mut location: Vec<usize> = Vec::with_capacity(path.len());
        let mut prefix = ConfigPath::new();
        for idx in 0..path.len() {
            let Some(segment) = path.segment(idx) else {
                break;
            };
            let parent = prefix.clone();
            prefix.append([segment.clone()]);
            let key = prefix.literal_string();

            if let Some(existing) = self.index.get(&key) {
                location = existing.clone();
                let descends = idx + 1 < path.len();
                if descends && self.node_at(&location).is_some_and(Definition::is_leaf) {
                    return Err(DefinitionError::NotAContainer { path: key });
                }
                continue;
            }

            let mut def = Definition::new(segment, parent.clone());
            def.schema_node = lookup_schema(&self.schema, &prefix);
            def.parent_schema_node = find_schema(&self.schema, &parent);
            let schema_node = def.schema_node.clone();

            let siblings = self
                .siblings_mut(&location)
                .ok_or_else(|| DefinitionError::ParentNotFound {
                    path: parent.literal_string(),
                })?;
            siblings.push(def);
            location.push(siblings.len() - 1);
            self.register(key, location.clone(), schema_node);
        }

        let full = path.literal_string();
        self.node_at_mut(&location)
            .ok_or(DefinitionError::ParentNotFound { path: full })
    }

    /// Assign `value` to the definition at `path`, creating it if needed.
    pub fn set_value(
        &mut self,
        path: &ConfigPath,
        value: DefinitionValue,
    ) -> Result<(), DefinitionError> {
        let key = path.literal_string();
        if let Some(existing) = self.get(&key) {
            if !existing.children.is_empty() {
                return Err(DefinitionError::ValueOnContainer { path: key });
            }
            if existing.is_leaf() {
                match self.policy {
                    DuplicatePolicy::Reject => {
                        return Err(DefinitionError::DuplicatePath { path: key })
                    }
                    DuplicatePolicy::Warn => warn!(
                        path = %key,
                        previous = %existing.value,
                        next = %value,
                        "duplicate definition; keeping last value"
                    ),
                }
            }
        }

        let def = self.ensure(path)?;
        if let (DefinitionValue::Multi(_), Some(node)) = (&value, &def.schema_node) {
            if !node.multi {
                warn!(path = %key, "multiple values assigned to single-valued node");
            }
        }
        def.value = value;
        Ok(())
    }

    pub fn insert_value(
        &mut self,
        path: &ConfigPath,
        value: impl Into<String>,
    ) -> Result<(), DefinitionError> {
        self.set_value(path, DefinitionValue::Single(value.into()))
    }

    pub fn insert_values<I, S>(&mut self, path: &ConfigPath, values: I) -> Result<(), DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.set_value(path, DefinitionValue::Multi(values))
    }

    pub fn set_comment(
        &mut self,
        path: &ConfigPath,
        comment: impl Into<String>,
    ) -> Result<(), DefinitionError> {
        self.ensure(path)?.comment = Some(comment.into());
        Ok(())
    }

    /// Add every entry of `template` below `at`. An empty `at` attaches at
    /// the tree root.
    pub fn insert_template(
        &mut self,
        at: &ConfigPath,
        template: &Template,
    ) -> Result<(), DefinitionError> {
        let parent_node = find_schema(&self.schema, at);
        for (key, entry) in template {
            let segment = Segment::under(parent_node.as_deref(), key.clone());
            let path = at.extend([segment]);
            match entry {
                TemplateValue::Scalar(scalar) => self.insert_value(&path, scalar.to_string())?,
                TemplateValue::List(items) => {
                    self.insert_values(&path, items.iter().map(ToString::to_string))?
                }
                TemplateValue::Node(nested) => {
                    self.ensure(&path)?;
                    self.insert_template(&path, nested)?;
                }
                TemplateValue::Presence => {
                    self.ensure(&path)?;
                }
            }
        }
        Ok(())
    }

    /// Adopt `definition` and its whole subtree as a new child of the
    /// definition at `parent` (the tree root when `parent` is empty).
    pub fn attach(
        &mut self,
        parent: &ConfigPath,
        definition: Definition,
    ) -> Result<(), DefinitionError> {
        let key = definition.full_path_string();
        if self.index.contains_key(&key) {
            return Err(DefinitionError::DuplicatePath { path: key });
        }

        let mut location = if parent.is_empty() {
            Vec::new()
        } else {
            let parent_key = parent.literal_string();
            let location = self
                .index
                .get(&parent_key)
                .cloned()
                .ok_or(DefinitionError::ParentNotFound {
                    path: parent_key.clone(),
                })?;
            if self.node_at(&location).is_some_and(Definition::is_leaf) {
                return Err(DefinitionError::NotAContainer { path: parent_key });
            }
            location
        };

        let mut registrations = Vec::new();
        collect_registrations(&definition, &mut Vec::new(), &mut registrations);

        let siblings = self
            .siblings_mut(&location)
            .ok_or(DefinitionError::ParentNotFound {
                path: parent.literal_string(),
            })?;
        siblings.push(definition);
        location.push(siblings.len() - 1);

        for (relative, path, schema_node) in registrations {
            let mut absolute = location.clone();
            absolute.extend(relative);
            self.register(path, absolute, schema_node);
        }
        Ok(())
    }

    /// Check every value against its schema node's type and constraints.
    ///
    /// Tag values (`LAN-IN` in `firewall/name/LAN-IN`) are checked against
    /// the tag node they instantiate.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for def in self.walk() {
            let path = def.full_path_string();
            if let (true, Some(tag)) = (def.dynamic, &def.parent_schema_node) {
                for message in validate_value(tag, &def.name) {
                    issues.push(ValidationIssue {
                        path: path.clone(),
                        message,
                    });
                }
            }
            // Presence nodes (no value, no children) are leaves too.
            if !def.children.is_empty() {
                continue;
            }
            let Some(node) = &def.schema_node else {
                issues.push(ValidationIssue {
                    path,
                    message: "no schema node for this path".to_string(),
                });
                continue;
            };
            if matches!(def.value, DefinitionValue::Multi(_)) && !node.multi {
                issues.push(ValidationIssue {
                    path: path.clone(),
                    message: "node does not accept multiple values".to_string(),
                });
            }
            for value in def.value.as_slice() {
                for message in validate_value(node, value) {
                    issues.push(ValidationIssue {
                        path: path.clone(),
                        message,
                    });
                }
            }
        }
        issues
    }

    fn register(&mut self, key: String, location: Vec<usize>, schema_node: Option<Arc<SchemaNode>>) {
        if let Some(node) = schema_node {
            if self.schema_nodes.insert(key.clone(), node).is_some() {
                warn!(path = %key, "schema node already recorded for path; keeping last");
            }
        }
        if self.index.insert(key.clone(), location).is_some() {
            warn!(path = %key, "definition already recorded for path; keeping last");
        }
    }

    fn node_at(&self, location: &[usize]) -> Option<&Definition> {
        let (first, rest) = location.split_first()?;
        let mut current = self.roots.get(*first)?;
        for idx in rest {
            current = current.children.get(*idx)?;
        }
        Some(current)
    }

    fn node_at_mut(&mut self, location: &[usize]) -> Option<&mut Definition> {
        let (first, rest) = location.split_first()?;
        let mut current = self.roots.get_mut(*first)?;
        for idx in rest {
            current = current.children.get_mut(*idx)?;
        }
        Some(current)
    }

    fn siblings_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<Definition>> {
        if parent.is_empty() {
            Some(&mut self.roots)
        } else {
            self.node_at_mut(parent).map(|def| &mut def.children)
        }
    }
}

type Registration = (Vec<usize>, String, Option<Arc<SchemaNode>>);

fn collect_registrations(def: &Definition, relative: &mut Vec<usize>, out: &mut Vec<Registration>) {
    out.push((relative.clone(), def.full_path_string(), def.schema_node.clone()));
    for (idx, child) in def.children.iter().enumerate() {
        relative.push(idx);
        collect_registrations(child, relative, out);
        relative.pop();
    }
}

/// Resolve `path` against the schema tree, logging a warning on a miss.
///
/// The empty path resolves to the schema root.
pub fn lookup_schema(schema: &Arc<SchemaNode>, path: &ConfigPath) -> Option<Arc<SchemaNode>> {
    let found = find_schema(schema, path);
    if found.is_none() {
        warn!(
            path = %path.literal_string(),
            schema_path = %path.schema_string(),
            "no schema node for path"
        );
    }
    found
}

fn find_schema(schema: &Arc<SchemaNode>, path: &ConfigPath) -> Option<Arc<SchemaNode>> {
    if path.is_empty() {
        return Some(Arc::clone(schema));
    }
    schema.find(path.schema()).cloned()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{DefinitionError, DefinitionValue, Definitions, DuplicatePolicy};
    use crate::path::{ConfigPath, Segment};
    use crate::tree::{NodeType, SchemaNode};

    fn schema() -> Arc<SchemaNode> {
        let mut all_ping = SchemaNode::new("all-ping", "firewall/all-ping");
        all_ping.node_type = NodeType::Txt;
        let mut port = SchemaNode::new("port", "firewall/group/port-group/node.tag/port");
        port.multi = true;
        port.node_type = NodeType::Txt;
        let mut group_tag = SchemaNode::new("node.tag", "firewall/group/port-group/node.tag");
        group_tag.children.insert("port".into(), Arc::new(port));
        let mut port_group = SchemaNode::new("port-group", "firewall/group/port-group");
        port_group.is_tag = true;
        port_group
            .children
            .insert("node.tag".into(), Arc::new(group_tag));
        let mut group = SchemaNode::new("group", "firewall/group");
        group
            .children
            .insert("port-group".into(), Arc::new(port_group));
        let mut firewall = SchemaNode::new("firewall", "firewall");
        firewall.children.insert("all-ping".into(), Arc::new(all_ping));
        firewall.children.insert("group".into(), Arc::new(group));
        let mut root = SchemaNode::new("templates", "");
        root.children.insert("firewall".into(), Arc::new(firewall));
        Arc::new(root)
    }

    fn ports_path(group: &str) -> ConfigPath {
        ConfigPath::from_segments([
            Segment::fixed("firewall"),
            Segment::fixed("group"),
            Segment::fixed("port-group"),
            Segment::value(group),
            Segment::fixed("port"),
        ])
    }

    #[test]
    fn ensure_reuses_containers_and_indexes_every_level() {
        let mut defs = Definitions::new(schema());
        defs.insert_values(&ports_path("web"), ["80", "443"])
            .expect("web ports");
        defs.insert_values(&ports_path("dns"), ["53"]).expect("dns ports");

        assert_eq!(defs.roots().len(), 1);
        let port_group = defs.get("firewall/group/port-group").expect("port-group");
        assert_eq!(port_group.children.len(), 2);
        assert_eq!(defs.len(), 7);
        assert!(defs.schema_node("firewall/group/port-group/web/port").is_some());
    }

    #[test]
    fn duplicate_leaf_warns_and_keeps_last_by_default() {
        let mut defs = Definitions::new(schema());
        let path = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("all-ping")]);
        defs.insert_value(&path, "enable").expect("first");
        defs.insert_value(&path, "disable").expect("second");
        assert_eq!(
            defs.get("firewall/all-ping").map(|d| d.value.clone()),
            Some(DefinitionValue::Single("disable".into()))
        );
    }

    #[test]
    fn duplicate_leaf_is_rejected_under_strict_policy() {
        let mut defs = Definitions::new(schema()).with_policy(DuplicatePolicy::Reject);
        let path = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("all-ping")]);
        defs.insert_value(&path, "enable").expect("first");
        assert_eq!(
            defs.insert_value(&path, "disable"),
            Err(DefinitionError::DuplicatePath {
                path: "firewall/all-ping".into()
            })
        );
    }

    #[test]
    fn cannot_nest_below_a_value_or_set_value_on_container() {
        let mut defs = Definitions::new(schema());
        let all_ping = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("all-ping")]);
        defs.insert_value(&all_ping, "enable").expect("value");
        let below = all_ping.extend([Segment::fixed("x")]);
        assert!(matches!(
            defs.insert_value(&below, "y"),
            Err(DefinitionError::NotAContainer { .. })
        ));

        let firewall = ConfigPath::from_segments([Segment::fixed("firewall")]);
        assert!(matches!(
            defs.insert_value(&firewall, "y"),
            Err(DefinitionError::ValueOnContainer { .. })
        ));
    }

    #[test]
    fn lookup_miss_leaves_schema_node_empty() {
        let mut defs = Definitions::new(schema());
        let path = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("bogus")]);
        defs.insert_value(&path, "x").expect("insert still succeeds");
        let def = defs.get("firewall/bogus").expect("definition");
        assert!(def.schema_node.is_none());
        assert!(def.parent_schema_node.is_some());
        assert_eq!(defs.validate().len(), 1);
    }

    #[test]
    fn multi_values_on_single_node_fail_validation() {
        let mut defs = Definitions::new(schema());
        let path = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("all-ping")]);
        defs.insert_values(&path, ["enable", "disable"]).expect("insert");
        let issues = defs.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "firewall/all-ping");
    }

    #[test]
    fn unbound_presence_node_fails_validation() {
        let mut defs = Definitions::new(schema());
        let bound = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("group")]);
        defs.ensure(&bound).expect("bound presence");
        let unbound = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("no-such-flag")]);
        defs.ensure(&unbound).expect("unbound presence");

        let issues = defs.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "firewall/no-such-flag");
        assert_eq!(issues[0].message, "no schema node for this path");
    }
}
