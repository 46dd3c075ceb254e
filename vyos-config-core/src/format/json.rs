use tracing::warn;

use crate::diff::result::DiffEntry;

/// Format diff entries as a pretty JSON array tagged by entry `type`.
///
/// Falls back to an empty array (and logs the error) if serialization fails.
pub fn format_json(entries: &[DiffEntry]) -> String {
    match serde_json::to_string_pretty(entries) {
        Ok(json) => json,
        Err(err) => {
            warn!(entries = entries.len(), error = %err, "failed to serialize diff entries");
            "[]".to_string()
        }
    }
}
