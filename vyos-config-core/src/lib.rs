//! Schema-driven configuration trees for VyOS-style routers.
//!
//! Parses a `node.def` template directory into a [`SchemaNode`] tree, builds
//! [`Definitions`] bound to that schema, and diffs or merges them.

pub mod constraint;
pub mod counter;
pub mod definition;
pub mod diff;
pub mod format;
pub mod merge;
pub mod parser;
pub mod path;
pub mod tree;

pub use constraint::{validate_value, Check, Constraint};
pub use counter::{CounterError, RuleCounter, RuleCounters, RuleSet};
pub use definition::{
    generate_populated_definition_tree, generate_sparse_definition_tree, Definition,
    DefinitionError, DefinitionValue, Definitions, DuplicatePolicy, Scalar, Template,
    TemplateValue, ValidationIssue,
};
pub use diff::{
    diff_definition_trees, diff_definitions, diff_schema_nodes, diff_schema_trees, DiffEntry,
    DiffOptions,
};
pub use format::{format_json, format_summary, format_text};
pub use merge::{merge_all, merge_definitions, MergeError};
pub use parser::{parse_dir, ParseError};
pub use path::{ConfigPath, Segment};
pub use tree::{NodeType, SchemaNode, TAG_PLACEHOLDER};
