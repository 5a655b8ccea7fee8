use crate::error::PatchError;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Add(String),
    Remove(String),
}

impl HunkLine {
    pub fn text(&self) -> &str {
        match self {
            HunkLine::Context(s) | HunkLine::Add(s) | HunkLine::Remove(s) => s,
        }
    }

    pub fn is_addition(&self) -> bool {
        matches!(self, HunkLine::Add(_))
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, HunkLine::Remove(_))
    }
}

/// One block of edits. Line numbers are 1-based, as printed in the diff header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub base_start: usize,
    pub base_count: usize,
    pub modified_start: usize,
    pub modified_count: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Number of lines on each side that the body actually describes.
    pub fn body_counts(&self) -> (usize, usize) {
        self.lines.iter().fold((0, 0), |(base, modified), line| match line {
            HunkLine::Context(_) => (base + 1, modified + 1),
            HunkLine::Remove(_) => (base + 1, modified),
            HunkLine::Add(_) => (base, modified + 1),
        })
    }

    /// True once the body holds every line the header announced.
    pub fn is_complete(&self) -> bool {
        let (base, modified) = self.body_counts();
        base >= self.base_count && modified >= self.modified_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryPayload {
    Delete,
    Content {
        mime_type: String,
        encoding: String,
        length: i64,
        lines: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinglePatch {
    pub target_path: Option<String>,
    pub source_path: Option<String>,
    pub hunks: Vec<Hunk>,
    pub binary: Option<BinaryPayload>,
    pub copy: bool,
    pub rename: bool,
    pub no_ending_newline: bool,
    pub deletes_target: bool,

    // resolved against the root on every application attempt
    pub source_file: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub applied: bool,
}

impl SinglePatch {
    pub fn is_binary(&self) -> bool {
        self.binary.is_some()
    }

    /// Pure git renames and copies carry no hunks but are still complete patches.
    pub fn is_complete_move(&self) -> bool {
        (self.rename || self.copy) && self.source_path.is_some() && self.target_path.is_some()
    }

    pub(crate) fn has_metadata(&self) -> bool {
        self.rename || self.copy || self.source_path.is_some() || self.target_path.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Patched,
    Missing,
    Failure,
}

impl std::fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PatchStatus::Patched => "Patched",
            PatchStatus::Missing => "Missing",
            PatchStatus::Failure => "Failure",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct PatchReport {
    pub file: PathBuf,
    pub backup_file: Option<PathBuf>,
    pub binary: bool,
    pub status: PatchStatus,
    pub failure: Option<PatchError>,
}

impl PatchReport {
    pub fn is_patched(&self) -> bool {
        self.status == PatchStatus::Patched
    }
}
