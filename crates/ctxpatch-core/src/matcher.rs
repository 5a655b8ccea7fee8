//! Locates where a hunk applies inside a file's lines and performs its edits.
//!
//! Positions handed around here are 1-based like the hunk headers; the buffer
//! itself is a plain 0-based `Vec<String>`.

use crate::error::{PatchError, PatchResult};
use crate::types::{Hunk, HunkLine};
use log::{debug, trace};

pub struct HunkLocator {
    /// First line after the last applied hunk. Later hunks never match before it.
    last_patched_line: usize,
}

impl Default for HunkLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl HunkLocator {
    pub fn new() -> Self {
        Self {
            last_patched_line: 1,
        }
    }

    pub fn last_patched_line(&self) -> usize {
        self.last_patched_line
    }

    /// Finds the 1-based position at which every context and removal line of the
    /// hunk matches, trying the declared position, then scanning back towards the
    /// last patched line, then forward to the end of the buffer.
    pub fn find_hunk_index(&self, target: &[String], hunk: &Hunk) -> Option<usize> {
        let declared = declared_position(hunk);
        if declared >= self.last_patched_line && matches_at(target, hunk, declared) {
            return Some(declared);
        }

        // nothing to compare against, so any other position would be a guess
        if hunk.lines.iter().all(HunkLine::is_addition) {
            return None;
        }

        if let Some(idx) = (self.last_patched_line..declared)
            .rev()
            .find(|&idx| matches_at(target, hunk, idx))
        {
            debug!("Hunk declared at line {} found at line {}", declared, idx);
            return Some(idx);
        }

        let forward = (declared + 1).max(self.last_patched_line)..=target.len() + 1;
        let found = forward.into_iter().find(|&idx| matches_at(target, hunk, idx));
        if let Some(idx) = found {
            debug!("Hunk declared at line {} found at line {}", declared, idx);
        }
        found
    }

    /// Applies one hunk in place and returns the new watermark.
    pub fn apply_hunk(
        &mut self,
        target: &mut Vec<String>,
        hunk: &Hunk,
        hunk_index: usize,
    ) -> PatchResult<usize> {
        let idx = self
            .find_hunk_index(target, hunk)
            .ok_or(PatchError::HunkApply {
                hunk_index,
                base_start: hunk.base_start,
                modified_start: hunk.modified_start,
            })?;

        let mut cursor = idx.saturating_sub(1);
        for line in &hunk.lines {
            match line {
                HunkLine::Add(text) => {
                    target.insert(cursor, text.clone());
                    cursor += 1;
                }
                HunkLine::Remove(_) => {
                    target.remove(cursor);
                }
                HunkLine::Context(_) => cursor += 1,
            }
        }

        self.last_patched_line = cursor + 1;
        trace!(
            "Applied hunk #{} at line {}, next search starts at line {}",
            hunk_index,
            idx,
            self.last_patched_line
        );
        Ok(self.last_patched_line)
    }
}

/// Where the header says the hunk starts in the current buffer.
///
/// A hunk that leaves no lines behind (`+N,0`) names the line before the removed
/// range, so its first removal sits one line further down.
fn declared_position(hunk: &Hunk) -> usize {
    if hunk.modified_count == 0 {
        hunk.modified_start + 1
    } else {
        hunk.modified_start.max(1)
    }
}

/// Checks the hunk's context and removal lines against `target` starting at the
/// 1-based position `idx`. Whitespace at both ends of a line is ignored.
///
/// Positions past the end of the buffer plus one never match, even for a hunk
/// that only adds lines.
pub fn matches_at(target: &[String], hunk: &Hunk, idx: usize) -> bool {
    let mut cursor = idx.saturating_sub(1);
    if cursor > target.len() {
        return false;
    }
    for line in &hunk.lines {
        if line.is_addition() {
            continue;
        }
        match target.get(cursor) {
            Some(existing) if existing.trim() == line.text().trim() => cursor += 1,
            _ => return false,
        }
    }
    true
}
