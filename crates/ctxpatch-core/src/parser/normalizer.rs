//! Rewrites context-format hunks into the unified representation.

use super::context::ContextHunk;
use crate::error::{PatchError, PatchResult};
use crate::types::{Hunk, HunkLine};

const DIVIDER_PREFIX: &str = "--- ";

/// Splits a context body line into its marker and text.
///
/// The marker column is followed by a space; lines whose trailing whitespace was
/// stripped (a bare `-`, `!`, ...) carry empty text.
fn split_marker(line: &str) -> Option<(u8, &str)> {
    let marker = *line.as_bytes().first()?;
    if !marker.is_ascii() {
        return None;
    }
    let rest = &line[1..];
    if rest.is_empty() {
        Some((marker, ""))
    } else {
        rest.strip_prefix(' ').map(|text| (marker, text))
    }
}

pub fn context_to_unified(hunk: &ContextHunk) -> PatchResult<Hunk> {
    let split = hunk
        .lines
        .iter()
        .position(|line| line.starts_with(DIVIDER_PREFIX))
        .ok_or_else(|| {
            PatchError::format(hunk.line_number, "***************", "missing context divider")
        })?;

    let base = &hunk.lines[..split];
    let modified = &hunk.lines[split + 1..];
    let mut base_idx = 0;
    let mut modified_idx = 0;

    let mut unified = Hunk {
        base_start: hunk.base_start,
        modified_start: hunk.modified_start,
        ..Default::default()
    };

    while base_idx < base.len() || modified_idx < modified.len() {
        let base_line = base.get(base_idx).map(String::as_str);
        let modified_line = modified.get(modified_idx).map(String::as_str);
        let base_marker = base_line.and_then(split_marker);
        let modified_marker = modified_line.and_then(split_marker);

        let line = match (base_marker, modified_marker) {
            (Some((b'-', text)), _) => {
                base_idx += 1;
                HunkLine::Remove(text.to_string())
            }
            (_, Some((b'+', text))) => {
                modified_idx += 1;
                HunkLine::Add(text.to_string())
            }
            (Some((b'!', text)), _) => {
                base_idx += 1;
                HunkLine::Remove(text.to_string())
            }
            (_, Some((b'!', text))) => {
                modified_idx += 1;
                HunkLine::Add(text.to_string())
            }
            (Some((b' ', text)), Some((b' ', _))) => {
                base_idx += 1;
                modified_idx += 1;
                HunkLine::Context(text.to_string())
            }
            (Some((b' ', text)), _) => {
                base_idx += 1;
                HunkLine::Context(text.to_string())
            }
            (_, Some((b' ', text))) => {
                modified_idx += 1;
                HunkLine::Context(text.to_string())
            }
            _ => {
                let offending = base_line.or(modified_line).unwrap_or_default();
                return Err(PatchError::format(
                    hunk.line_number,
                    offending,
                    "invalid context patch line",
                ));
            }
        };

        match line {
            HunkLine::Context(_) => {
                unified.base_count += 1;
                unified.modified_count += 1;
            }
            HunkLine::Remove(_) => unified.base_count += 1,
            HunkLine::Add(_) => unified.modified_count += 1,
        }
        unified.lines.push(line);
    }

    Ok(unified)
}
