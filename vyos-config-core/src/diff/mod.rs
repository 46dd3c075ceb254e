//! Structural comparison of schema trees and definition trees.

pub mod engine;
pub mod result;

pub use engine::{
    diff_definition_trees, diff_definitions, diff_schema_nodes, diff_schema_trees, DiffOptions,
};
pub use result::DiffEntry;
