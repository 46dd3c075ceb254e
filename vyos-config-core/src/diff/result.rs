use serde::Serialize;

/// A single diff outcome for a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DiffEntry {
    /// Path exists on both sides with identical content.
    Identical { path: String },
    /// Path exists on both sides but fields differ; one message per field.
    Modified {
        path: String,
        differences: Vec<String>,
    },
    /// Path (and everything below it) only in the left input.
    OnlyLeft { path: String },
    /// Path (and everything below it) only in the right input.
    OnlyRight { path: String },
}

impl DiffEntry {
    pub fn path(&self) -> &str {
        match self {
            DiffEntry::Identical { path }
            | DiffEntry::Modified { path, .. }
            | DiffEntry::OnlyLeft { path }
            | DiffEntry::OnlyRight { path } => path,
        }
    }
}
