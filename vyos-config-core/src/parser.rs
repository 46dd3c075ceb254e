use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::constraint::{from_allowed, from_expression};
use crate::tree::{NodeType, SchemaNode};

/// Name of the grammar file inside each template directory.
pub const NODE_DEF: &str = "node.def";

/// Errors that can occur while reading a template directory tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A template directory could not be listed.
    #[error("failed to read template directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A `node.def` file could not be read.
    #[error("failed to read grammar file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse a template directory tree into a [`SchemaNode`] tree.
///
/// Every subdirectory becomes a child named after the directory. A
/// directory is kept when its `node.def` sets at least one recognized
/// attribute or when it has kept children; the root is always kept.
pub fn parse_dir(root: &Path) -> Result<SchemaNode, ParseError> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let node = parse_node(root, name, String::new(), true)?;
    Ok(node.unwrap_or_default())
}

fn parse_node(
    dir: &Path,
    name: String,
    path: String,
    is_root: bool,
) -> Result<Option<SchemaNode>, ParseError> {
    let mut node = SchemaNode::new(name, path);
    let mut recognized = 0;

    let def_path = dir.join(NODE_DEF);
    if def_path.is_file() {
        let text = fs::read_to_string(&def_path).map_err(|source| ParseError::ReadFile {
            path: def_path.clone(),
            source,
        })?;
        recognized = parse_node_def(&text, &mut node);
        debug!(path = %def_path.display(), recognized, "parsed grammar file");
    }

    let entries = fs::read_dir(dir).map_err(|source| ParseError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ParseError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let child_dir = entry.path();
        if child_dir.is_dir() {
            subdirs.push((entry.file_name().to_string_lossy().into_owned(), child_dir));
        }
    }
    subdirs.sort();

    for (child_name, child_dir) in subdirs {
        let child_path = if node.path.is_empty() {
            child_name.clone()
        } else {
            format!("{}/{}", node.path, child_name)
        };
        if let Some(child) = parse_node(&child_dir, child_name.clone(), child_path, false)? {
            node.children.insert(child_name, Arc::new(child));
        }
    }

    if is_root || recognized > 0 || !node.children.is_empty() {
        Ok(Some(node))
    } else {
        Ok(None)
    }
}

/// Apply the scopes of one `node.def` text to `node`.
///
/// Returns the number of recognized scopes. Unknown scopes are ignored and
/// constraint expressions that cannot be understood are kept as
/// unrecognized constraints rather than failing.
pub fn parse_node_def(text: &str, node: &mut SchemaNode) -> usize {
    let mut recognized = 0;
    for (scope, value) in split_scopes(text) {
        match scope.as_str() {
            "tag" => node.is_tag = true,
            "multi" => node.multi = true,
            "type" => match NodeType::from_declaration(value.trim()) {
                Some(node_type) => node.node_type = node_type,
                None => warn!(
                    path = %node.path,
                    declared = value.trim(),
                    "unrecognized node type; leaving type unset"
                ),
            },
            "help" => node.help = Some(value.trim().to_string()),
            "val_help" | "value-help" => {
                let hint = value.split(';').next().unwrap_or_default().trim();
                node.value_help.push(hint.to_string());
            }
            "allowed" => {
                let command = value.trim();
                node.constraints.push(from_allowed(command));
                node.allowed = Some(command.to_string());
            }
            "syntax" => {
                let Some(expression) = value.trim_start().strip_prefix("expression:") else {
                    debug!(path = %node.path, "ignoring non-expression syntax scope");
                    continue;
                };
                let expression = expression.trim();
                node.constraints.push(from_expression(expression));
                node.expressions.push(expression.to_string());
            }
            other => {
                debug!(path = %node.path, scope = other, "ignoring unknown scope");
                continue;
            }
        }
        recognized += 1;
    }
    recognized
}

/// Split grammar text into `(scope, value)` blocks.
///
/// A line without leading whitespace that contains `:` opens a scope; any
/// other non-blank line continues the open scope. A blank line closes it.
fn split_scopes(text: &str) -> Vec<(String, String)> {
    let mut scopes = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            scopes.extend(current.take());
            continue;
        }

        let opens_scope = !line.starts_with(char::is_whitespace) && line.contains(':');
        if opens_scope {
            scopes.extend(current.take());
            if let Some((scope, value)) = line.split_once(':') {
                current = Some((scope.trim().to_string(), value.to_string()));
            }
        } else if let Some((_, value)) = current.as_mut() {
            value.push('\n');
            value.push_str(line);
        }
    }
    scopes.extend(current);
    scopes
}
