//! Error types for patch parsing and application.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    /// Malformed patch syntax. Aborts the whole run.
    #[error("line {line_number}: {reason}: {line:?}")]
    Format {
        line_number: usize,
        line: String,
        reason: &'static str,
    },

    /// The hunk's context could not be located in the target content.
    #[error("cannot apply hunk #{hunk_index} (@@ -{base_start} +{modified_start} @@)")]
    HunkApply {
        hunk_index: usize,
        base_start: usize,
        modified_start: usize,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid binary payload: {reason}")]
    InvalidBinary { reason: String },
}

impl PatchError {
    pub(crate) fn format(line_number: usize, line: &str, reason: &'static str) -> Self {
        PatchError::Format {
            line_number,
            line: line.to_string(),
            reason,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PatchResult<T> = Result<T, PatchError>;
