use super::line_reader::PatchLineReader;
use super::normalizer::context_to_unified;
use super::{compute_target_path, expect_header, is_dev_null, parse_number, range_count};
use super::{INDEX_PREFIX, NO_ENDING_NEWLINE};
use crate::error::{PatchError, PatchResult};
use crate::types::SinglePatch;
use once_cell::sync::Lazy;
use regex::Regex;

pub const CONTEXT_OLD_FILE_PREFIX: &str = "*** ";
pub const CONTEXT_NEW_FILE_PREFIX: &str = "--- ";
pub const HUNK_SEPARATOR: &str = "***************";

static BASE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*\* (\d+)(?:,(\d+))? \*\*\*\*$").unwrap());
static MODIFIED_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--- (\d+)(?:,(\d+))? ----$").unwrap());

/// A context-format hunk as written in the file: base lines, the `--- N,M ----`
/// divider, then modified lines, all still carrying their two-column prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextHunk {
    pub base_start: usize,
    pub base_count: usize,
    pub modified_start: usize,
    pub modified_count: usize,
    pub lines: Vec<String>,
    pub line_number: usize,
}

pub fn read_context_patch(
    reader: &mut PatchLineReader<'_>,
    patch: &mut SinglePatch,
) -> PatchResult<()> {
    let base = expect_header(reader, CONTEXT_OLD_FILE_PREFIX, "invalid context diff header")?;
    let modified = expect_header(reader, CONTEXT_NEW_FILE_PREFIX, "invalid context diff header")?;
    if patch.target_path.is_none() {
        patch.target_path = Some(compute_target_path(base, modified));
    }
    patch.deletes_target = is_dev_null(modified);

    let mut hunks: Vec<ContextHunk> = Vec::new();
    // modified-side lines kept so far; None while still in the base half
    let mut modified_lines: Option<usize> = None;

    while let Some(line) = reader.next_line() {
        if line.is_empty() || line.starts_with(INDEX_PREFIX) || line.starts_with("diff ") {
            reader.unread();
            break;
        }

        if line.starts_with(HUNK_SEPARATOR) {
            let separator_line = reader.line_number();
            let range = reader.next_line().ok_or_else(|| {
                PatchError::format(separator_line, line, "context hunk without range")
            })?;
            let (start, count) = parse_range(&BASE_RANGE, range, reader.line_number())?;
            hunks.push(ContextHunk {
                base_start: start,
                base_count: count,
                line_number: separator_line,
                ..Default::default()
            });
            modified_lines = None;
            continue;
        }

        let line_number = reader.line_number();
        let hunk = hunks
            .last_mut()
            .ok_or_else(|| PatchError::format(line_number, line, "hunk line before range header"))?;

        if line.starts_with(CONTEXT_NEW_FILE_PREFIX) {
            let (start, count) = parse_range(&MODIFIED_RANGE, line, line_number)?;
            hunk.modified_start = start;
            hunk.modified_count = count;
            hunk.lines.push(line.to_string());
            modified_lines = Some(0);
        } else if line == NO_ENDING_NEWLINE {
            if modified_lines.is_some() {
                patch.no_ending_newline = true;
            }
        } else if matches!(line.as_bytes()[0], b' ' | b'+' | b'-' | b'!') {
            match modified_lines.as_mut() {
                None => hunk.lines.push(line.to_string()),
                Some(kept) if *kept < hunk.modified_count => {
                    hunk.lines.push(line.to_string());
                    *kept += 1;
                }
                Some(_) => {}
            }
        } else {
            return Err(PatchError::format(line_number, line, "invalid hunk line"));
        }
    }

    patch.hunks = hunks
        .iter()
        .map(context_to_unified)
        .collect::<PatchResult<Vec<_>>>()?;
    Ok(())
}

fn parse_range(pattern: &Regex, line: &str, line_number: usize) -> PatchResult<(usize, usize)> {
    let caps = pattern
        .captures(line)
        .ok_or_else(|| PatchError::format(line_number, line, "invalid context diff range"))?;
    let start = parse_number(&caps[1], line_number, line)?;
    let end = caps
        .get(2)
        .map(|m| parse_number(m.as_str(), line_number, line))
        .transpose()?;
    Ok((start, range_count(start, end)))
}
