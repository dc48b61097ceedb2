use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Document storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; lost on restart.
    Memory,
    /// JSON file rewritten after every write.
    #[default]
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "d_path")]
    pub path: PathBuf,
    /// Most recent messages kept when a conversation is saved (plus the
    /// system message, if any).
    #[serde(default = "d_20")]
    pub conversation_window: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: d_path(),
            conversation_window: 20,
        }
    }
}

fn d_path() -> PathBuf {
    PathBuf::from("./data/documents.json")
}
fn d_20() -> usize {
    20
}
