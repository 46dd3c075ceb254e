use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::definition::{Definition, DefinitionValue, Definitions};
use crate::diff::result::DiffEntry;
use crate::tree::SchemaNode;

/// Configures tree diff behavior.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Include [`DiffEntry::Identical`] rows.
    pub include_identical: bool,
    /// Maximum path depth compared. `-1` means unlimited.
    pub max_depth: i32,
    /// Paths or segment names to ignore.
    pub ignore_paths: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            include_identical: false,
            max_depth: -1,
            ignore_paths: Vec::new(),
        }
    }
}

/// Shallow comparison of two schema nodes.
///
/// Compares `name`, `type`, `is_tag`, `multi` and `path`; children are not
/// visited. Returns one message per mismatched field.
pub fn diff_schema_nodes(expected: &SchemaNode, actual: &SchemaNode) -> Vec<String> {
    let mut out = Vec::new();
    field(&mut out, "name", &expected.name, &actual.name);
    field(&mut out, "type", &expected.node_type, &actual.node_type);
    field(&mut out, "is_tag", &expected.is_tag, &actual.is_tag);
    field(&mut out, "multi", &expected.multi, &actual.multi);
    field(&mut out, "path", &expected.path, &actual.path);
    out
}

/// Shallow comparison of two definitions.
///
/// Compares `name`, parent `path`, `comment`, `value`, `values` and the bound
/// schema node. Children are not visited; use [`diff_definition_trees`] to
/// compare whole trees.
pub fn diff_definitions(expected: &Definition, actual: &Definition) -> Vec<String> {
    let mut out = Vec::new();
    field(&mut out, "name", &expected.name, &actual.name);
    field(
        &mut out,
        "path",
        &expected.path.literal_string(),
        &actual.path.literal_string(),
    );
    field(&mut out, "comment", &expected.comment, &actual.comment);
    field(&mut out, "value", &single(&expected.value), &single(&actual.value));
    field(&mut out, "values", &multi(&expected.value), &multi(&actual.value));

    match (&expected.schema_node, &actual.schema_node) {
        (Some(left), Some(right)) => out.extend(
            diff_schema_nodes(left, right)
                .into_iter()
                .map(|difference| format!("schema node {difference}")),
        ),
        (Some(_), None) => out.push("schema node: expected bound, got unbound".to_string()),
        (None, Some(_)) => out.push("schema node: expected unbound, got bound".to_string()),
        (None, None) => {}
    }
    out
}

/// Diff two schema trees by child name.
pub fn diff_schema_trees(
    left: &SchemaNode,
    right: &SchemaNode,
    opts: &DiffOptions,
) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    diff_schema_node(left, right, 0, opts, &mut out);
    out
}

fn diff_schema_node(
    left: &SchemaNode,
    right: &SchemaNode,
    depth: i32,
    opts: &DiffOptions,
    out: &mut Vec<DiffEntry>,
) {
    if should_ignore(&left.path, opts) || exceeds_depth(depth, opts) {
        return;
    }

    let differences = diff_schema_nodes(left, right);
    push_compared(&left.path, differences, opts, out);

    let names: BTreeSet<&String> = left.children.keys().chain(right.children.keys()).collect();
    for name in names {
        match (left.child(name), right.child(name)) {
            (Some(l), Some(r)) => diff_schema_node(l, r, depth + 1, opts, out),
            (Some(l), None) if !should_ignore(&l.path, opts) => {
                out.push(DiffEntry::OnlyLeft {
                    path: l.path.clone(),
                })
            }
            (None, Some(r)) if !should_ignore(&r.path, opts) => {
                out.push(DiffEntry::OnlyRight {
                    path: r.path.clone(),
                })
            }
            _ => {}
        }
    }
}

/// Diff two definition trees.
///
/// Paths present on one side only are reported once, at the top of the
/// missing branch. Paths present on both sides are compared with
/// [`diff_definitions`].
pub fn diff_definition_trees(
    left: &Definitions,
    right: &Definitions,
    opts: &DiffOptions,
) -> Vec<DiffEntry> {
    let paths: BTreeSet<&str> = left.paths().chain(right.paths()).collect();
    let mut out = Vec::new();

    for path in paths {
        let (left_def, right_def) = (left.get(path), right.get(path));
        let Some(def) = left_def.or(right_def) else {
            continue;
        };
        let depth = def.path.len() as i32;
        if should_ignore(path, opts) || exceeds_depth(depth, opts) {
            continue;
        }
        match (left_def, right_def) {
            (Some(l), Some(r)) => push_compared(path, diff_definitions(l, r), opts, &mut out),
            (Some(l), None) if !parent_missing(l, right) => out.push(DiffEntry::OnlyLeft {
                path: path.to_string(),
            }),
            (None, Some(r)) if !parent_missing(r, left) => out.push(DiffEntry::OnlyRight {
                path: path.to_string(),
            }),
            _ => {}
        }
    }
    out
}

// Tag values such as subnets may contain `/`, so the parent is taken from
// the definition rather than from the joined path.
fn parent_missing(def: &Definition, other: &Definitions) -> bool {
    !def.path.is_empty() && !other.contains(&def.path.literal_string())
}

fn push_compared(path: &str, differences: Vec<String>, opts: &DiffOptions, out: &mut Vec<DiffEntry>) {
    if !differences.is_empty() {
        out.push(DiffEntry::Modified {
            path: path.to_string(),
            differences,
        });
    } else if opts.include_identical {
        out.push(DiffEntry::Identical {
            path: path.to_string(),
        });
    }
}

fn field<T: PartialEq + Debug>(out: &mut Vec<String>, name: &str, expected: &T, actual: &T) {
    if expected != actual {
        out.push(format!("{name}: expected {expected:?}, got {actual:?}"));
    }
}

fn single(value: &DefinitionValue) -> Option<&str> {
    match value {
        DefinitionValue::Single(value) => Some(value),
        _ => None,
    }
}

fn multi(value: &DefinitionValue) -> Option<&[String]> {
    match value {
        DefinitionValue::Multi(values) => Some(values),
        _ => None,
    }
}

fn exceeds_depth(depth: i32, opts: &DiffOptions) -> bool {
    opts.max_depth >= 0 && depth > opts.max_depth
}

fn should_ignore(path: &str, opts: &DiffOptions) -> bool {
    opts.ignore_paths.iter().any(|ignore| {
        path == ignore
            || path.starts_with(&format!("{ignore}/"))
            || path.ends_with(&format!("/{ignore}"))
            || path.contains(&format!("/{ignore}/"))
    })
}

#[cfg(test)]
mod tests {
    use super::diff_schema_nodes;
    use crate::tree::{NodeType, SchemaNode};

    #[test]
    fn type_and_tag_mismatch_yield_exactly_two_differences() {
        let mut expected = SchemaNode::new("name", "firewall/name");
        expected.is_tag = true;
        let mut actual = SchemaNode::new("name", "firewall/name");
        actual.node_type = NodeType::Txt;

        let differences = diff_schema_nodes(&expected, &actual);
        assert_eq!(differences.len(), 2);
        assert!(differences[0].starts_with("type:"));
        assert!(differences[1].starts_with("is_tag:"));
    }

    #[test]
    fn children_are_not_compared() {
        let left = SchemaNode::new("firewall", "firewall");
        let mut right = SchemaNode::new("firewall", "firewall");
        right
            .children
            .insert("name".into(), std::sync::Arc::new(SchemaNode::new("name", "firewall/name")));
        assert!(diff_schema_nodes(&left, &right).is_empty());
    }
}
