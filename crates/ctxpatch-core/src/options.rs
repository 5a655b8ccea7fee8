use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKUP_SUFFIX: &str = ".original~";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PatchOptions {
    pub backup_suffix: String,
    pub create_backups: bool,
    /// How many parent directories the root resolver may climb above the suggestion.
    pub max_ancestors: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            create_backups: true,
            max_ancestors: 64,
        }
    }
}
