//! Merge independently built definition trees.
//!
//! Branches missing from the destination are adopted whole. Leaves present
//! on both sides must carry identical values; containers are reconciled
//! child by child. The first conflict aborts the merge and the destination
//! must then be discarded, as earlier adoptions are not rolled back.

use thiserror::Error;
use tracing::{debug, info};

use crate::definition::{Definition, DefinitionError, Definitions};

/// Errors produced while merging definition trees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// Both trees define a leaf at `path` with different values.
    #[error("conflicting values at {path}: '{left}' vs '{right}'")]
    ValueConflict {
        path: String,
        left: String,
        right: String,
    },
    /// One tree holds a value at `path` where the other holds a container.
    #[error("cannot merge a value with a container at {path}")]
    ShapeConflict { path: String },
    /// The destination refused an adopted branch.
    #[error("failed to adopt definition: {0}")]
    Definition(#[from] DefinitionError),
}

/// Merge `source` into `destination`.
pub fn merge_definitions(
    destination: &mut Definitions,
    source: &Definitions,
) -> Result<(), MergeError> {
    let before = destination.len();
    for root in source.roots() {
        merge_definition(destination, root)?;
    }
    info!(
        adopted = destination.len() - before,
        total = destination.len(),
        "merged definition trees"
    );
    Ok(())
}

/// Merge every tree of `trees` into the first one, left to right.
pub fn merge_all(trees: Vec<Definitions>) -> Result<Option<Definitions>, MergeError> {
    let mut trees = trees.into_iter();
    let Some(mut destination) = trees.next() else {
        return Ok(None);
    };
    for source in trees {
        merge_definitions(&mut destination, &source)?;
    }
    Ok(Some(destination))
}

fn merge_definition(destination: &mut Definitions, incoming: &Definition) -> Result<(), MergeError> {
    let path = incoming.full_path_string();
    let Some(existing) = destination.get(&path) else {
        debug!(path = %path, "adopting branch");
        destination.attach(&incoming.path, incoming.clone())?;
        return Ok(());
    };

    match (existing.is_leaf(), incoming.is_leaf()) {
        (true, true) if existing.value == incoming.value => Ok(()),
        (true, true) => Err(MergeError::ValueConflict {
            left: existing.value.to_string(),
            right: incoming.value.to_string(),
            path,
        }),
        (false, false) => {
            for child in &incoming.children {
                merge_definition(destination, child)?;
            }
            Ok(())
        }
        _ => Err(MergeError::ShapeConflict { path }),
    }
}
