use vyos_config_core::{Definition, Definitions, SchemaNode};

/// Render a schema tree with a configurable max depth.
pub fn render_schema(node: &SchemaNode, max_depth: usize, constraints: bool) -> String {
    let mut out = String::new();
    render_schema_node(node, 0, max_depth, constraints, &mut out);
    out
}

fn render_schema_node(
    node: &SchemaNode,
    depth: usize,
    max_depth: usize,
    constraints: bool,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{indent}{node}\n"));
    if constraints {
        for constraint in &node.constraints {
            let json = serde_json::to_string(constraint).unwrap_or_default();
            out.push_str(&format!("{indent}  ! {json}\n"));
        }
    }

    if depth >= max_depth {
        return;
    }

    for child in node.children.values() {
        render_schema_node(child, depth + 1, max_depth, constraints, out);
    }
}

/// Render a definition tree, one definition per line.
pub fn render_definitions(defs: &Definitions) -> String {
    let mut out = String::new();
    for root in defs.roots() {
        render_definition(root, 0, &mut out);
    }
    out
}

fn render_definition(def: &Definition, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    if def.is_leaf() {
        out.push_str(&format!("{indent}{} {}\n", def.name, def.value));
    } else {
        out.push_str(&format!("{indent}{}\n", def.name));
    }
    if let Some(comment) = &def.comment {
        out.push_str(&format!("{indent}  # {comment}\n"));
    }

    for child in &def.children {
        render_definition(child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vyos_config_core::{ConfigPath, Definitions, NodeType, SchemaNode, Segment};

    use super::{render_definitions, render_schema};

    #[test]
    fn schema_rendering_stops_at_depth() {
        let mut port = SchemaNode::new("port", "service/ssh/port");
        port.node_type = NodeType::U32;
        let mut ssh = SchemaNode::new("ssh", "service/ssh");
        ssh.children.insert("port".into(), Arc::new(port));
        let mut service = SchemaNode::new("service", "service");
        service.children.insert("ssh".into(), Arc::new(ssh));

        assert_eq!(render_schema(&service, 1, false), "service\n  ssh\n");
        assert_eq!(
            render_schema(&service, 5, false),
            "service\n  ssh\n    port <u32>\n"
        );
    }

    #[test]
    fn definitions_render_values_inline() {
        let mut defs = Definitions::new(Arc::new(SchemaNode::new("templates", "")));
        let path = ConfigPath::from_segments([
            Segment::fixed("system"),
            Segment::fixed("name-server"),
        ]);
        defs.insert_values(&path, ["1.1.1.1", "9.9.9.9"])
            .expect("insert");

        assert_eq!(
            render_definitions(&defs),
            "system\n  name-server [1.1.1.1, 9.9.9.9]\n"
        );
    }
}
