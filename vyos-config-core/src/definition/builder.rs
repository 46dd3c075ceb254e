use std::sync::Arc;

use tracing::debug;

use super::{lookup_schema, Definition, DefinitionValue, Template, TemplateValue};
use crate::path::{ConfigPath, Segment};
use crate::tree::SchemaNode;

/// Build a chain of empty definitions, one per segment of `path`, each bound
/// to the schema node at its schema path.
///
/// Returns the outermost definition, or `None` for an empty path. Schema
/// misses are logged and leave the definition unbound.
pub fn generate_sparse_definition_tree(
    schema: &Arc<SchemaNode>,
    path: &ConfigPath,
) -> Option<Definition> {
    generate_populated_definition_tree(schema, path, &Template::new())
}

/// Like [`generate_sparse_definition_tree`], with `template` expanded below
/// the innermost definition of the chain.
pub fn generate_populated_definition_tree(
    schema: &Arc<SchemaNode>,
    path: &ConfigPath,
    template: &Template,
) -> Option<Definition> {
    let mut chain: Vec<Definition> = (0..path.len())
        .filter_map(|idx| {
            let segment = path.segment(idx)?;
            let parent = path.diverge_from(path.len() - idx, Vec::<Segment>::new());
            Some(bind(schema, Definition::new(segment, parent)))
        })
        .collect();

    let mut inner = chain.pop()?;
    inner.children = expand_template(schema, path, template);
    debug!(path = %path, children = inner.children.len(), "generated definition chain");

    Some(chain.into_iter().rev().fold(inner, |child, mut parent| {
        parent.children.push(child);
        parent
    }))
}

fn expand_template(
    schema: &Arc<SchemaNode>,
    parent: &ConfigPath,
    template: &Template,
) -> Vec<Definition> {
    let parent_node = if parent.is_empty() {
        Some(Arc::clone(schema))
    } else {
        schema.find(parent.schema()).cloned()
    };

    template
        .iter()
        .map(|(key, entry)| {
            let segment = Segment::under(parent_node.as_deref(), key.clone());
            let mut def = bind(schema, Definition::new(segment, parent.clone()));
            match entry {
                TemplateValue::Scalar(scalar) => {
                    def.value = DefinitionValue::Single(scalar.to_string());
                }
                TemplateValue::List(items) => {
                    def.value =
                        DefinitionValue::Multi(items.iter().map(ToString::to_string).collect());
                }
                TemplateValue::Node(nested) => {
                    def.children = expand_template(schema, &def.full_path(), nested);
                }
                TemplateValue::Presence => {}
            }
            def
        })
        .collect()
}

fn bind(schema: &Arc<SchemaNode>, mut def: Definition) -> Definition {
    def.schema_node = lookup_schema(schema, &def.full_path());
    def.parent_schema_node = lookup_schema(schema, &def.path);
    def
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{generate_populated_definition_tree, generate_sparse_definition_tree};
    use crate::definition::{DefinitionValue, Template, TemplateValue};
    use crate::path::{ConfigPath, Segment};
    use crate::tree::SchemaNode;

    fn schema() -> Arc<SchemaNode> {
        let action = SchemaNode::new("action", "firewall/name/node.tag/rule/node.tag/action");
        let protocol = SchemaNode::new("protocol", "firewall/name/node.tag/rule/node.tag/protocol");
        let mut rule_tag = SchemaNode::new("node.tag", "firewall/name/node.tag/rule/node.tag");
        rule_tag.children.insert("action".into(), Arc::new(action));
        rule_tag.children.insert("protocol".into(), Arc::new(protocol));
        let mut rule = SchemaNode::new("rule", "firewall/name/node.tag/rule");
        rule.is_tag = true;
        rule.children.insert("node.tag".into(), Arc::new(rule_tag));
        let mut name_tag = SchemaNode::new("node.tag", "firewall/name/node.tag");
        name_tag.children.insert("rule".into(), Arc::new(rule));
        let mut name = SchemaNode::new("name", "firewall/name");
        name.is_tag = true;
        name.children.insert("node.tag".into(), Arc::new(name_tag));
        let mut firewall = SchemaNode::new("firewall", "firewall");
        firewall.children.insert("name".into(), Arc::new(name));
        let mut root = SchemaNode::new("templates", "");
        root.children.insert("firewall".into(), Arc::new(firewall));
        Arc::new(root)
    }

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
    fn sparse_chain_has_one_bound_definition_per_segment() {
        let schema = schema();
        let root = generate_sparse_definition_tree(&schema, &rule_path()).expect("chain");

        let chain = root.walk();
        assert_eq!(chain.len(), 5);
        assert!(chain.iter().all(|def| def.schema_node.is_some()));
        assert!(chain.iter().all(|def| def.value.is_empty()));
        assert_eq!(chain[4].full_path_string(), "firewall/name/LAN-IN/rule/1000");
        assert_eq!(chain[4].path.literal_string(), "firewall/name/LAN-IN/rule");
    }

    #[test]
    fn empty_path_yields_nothing() {
        assert!(generate_sparse_definition_tree(&schema(), &ConfigPath::new()).is_none());
    }

    #[test]
    fn populated_chain_expands_template_below_innermost_segment() {
        let schema = schema();
        let mut template = Template::new();
        template.insert("action".into(), TemplateValue::scalar("accept"));
        template.insert("protocol".into(), TemplateValue::scalar("tcp"));

        let root =
            generate_populated_definition_tree(&schema, &rule_path(), &template).expect("chain");
        let rule = root
            .find(&["name", "LAN-IN", "rule", "1000"])
            .expect("rule definition");
        assert_eq!(rule.children.len(), 2);
        let action = rule.child("action").expect("action");
        assert_eq!(action.value, DefinitionValue::Single("accept".into()));
        assert!(action.schema_node.is_some());
    }

    #[test]
    fn template_keys_below_tag_nodes_become_tag_values() {
        let schema = schema();
        let path = ConfigPath::from_segments([Segment::fixed("firewall"), Segment::fixed("name")]);
        let mut template = Template::new();
        template.insert(
            "WAN-IN".into(),
            TemplateValue::node([(
                "rule",
                TemplateValue::node([(
                    "10",
                    TemplateValue::node([("action", TemplateValue::scalar("drop"))]),
                )]),
            )]),
        );

        let root = generate_populated_definition_tree(&schema, &path, &template).expect("chain");
        let action = root
            .find(&["name", "WAN-IN", "rule", "10", "action"])
            .expect("action");
        assert_eq!(
            action.full_path().schema_string(),
            "firewall/name/node.tag/rule/node.tag/action"
        );
        assert!(action.schema_node.is_some());
    }
}
