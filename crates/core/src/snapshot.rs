//! Conversation snapshots. Persist and restore a conversation as a JSON array.
//!
//! Each element is a serialized [`Message`]:
//! `{role, content, timestamp, tool_calls?, tool_call_id?, name?, agent_name?}`.
//! Timestamps are RFC 3339, so a save/load round trip reproduces every field.

use crate::error::SnapshotError;
use crate::message::{Conversation, Message};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default snapshot file name inside the workspace.
pub const DEFAULT_SNAPSHOT_NAME: &str = "session.json";

/// Resolve a user-supplied snapshot name to a path inside `workspace`.
///
/// `None` maps to [`DEFAULT_SNAPSHOT_NAME`]; a missing `.json` extension is appended.
/// Only the final path component of `name` is used, so the result never leaves
/// `workspace`.
pub fn snapshot_path(workspace: &Path, name: Option<&str>) -> PathBuf {
    let name = name
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_SNAPSHOT_NAME);
    if name.ends_with(".json") {
        workspace.join(name)
    } else {
        workspace.join(format!("{name}.json"))
    }
}

/// Write the conversation to `path`, creating parent directories as needed.
pub fn save(conversation: &Conversation, path: &Path) -> Result<(), SnapshotError> {
    let io_err = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(conversation.messages()).map_err(|source| {
        SnapshotError::Malformed {
            path: path.to_path_buf(),
            source,
        }
    })?;
    std::fs::write(path, json).map_err(io_err)?;

    debug!(path = %path.display(), count = conversation.len(), "Saved conversation snapshot");
    Ok(())
}

/// Read an ordered message list from `path`.
pub fn load(path: &Path) -> Result<Vec<Message>, SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let messages: Vec<Message> =
        serde_json::from_str(&content).map_err(|source| SnapshotError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), count = messages.len(), "Loaded conversation snapshot");
    Ok(messages)
}
