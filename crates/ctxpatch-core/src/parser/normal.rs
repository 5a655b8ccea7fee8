use super::line_reader::PatchLineReader;
use super::{parse_number, range_count, INDEX_PREFIX, NO_ENDING_NEWLINE};
use crate::error::{PatchError, PatchResult};
use crate::types::{Hunk, HunkLine, SinglePatch};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ADD_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)a(\d+)(?:,(\d+))?$").unwrap());
static CHANGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:,(\d+))?c(\d+)(?:,(\d+))?$").unwrap());
static DELETE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:,(\d+))?d(\d+)$").unwrap());

pub fn is_normal_range(line: &str) -> bool {
    ADD_RANGE.is_match(line) || CHANGE_RANGE.is_match(line) || DELETE_RANGE.is_match(line)
}

pub fn read_normal_patch(
    reader: &mut PatchLineReader<'_>,
    patch: &mut SinglePatch,
) -> PatchResult<()> {
    let mut hunks: Vec<Hunk> = Vec::new();

    while let Some(line) = reader.next_line() {
        if line.is_empty() || line.starts_with(INDEX_PREFIX) {
            reader.unread();
            break;
        }

        let line_number = reader.line_number();
        if let Some(hunk) = parse_normal_range(line, line_number)? {
            hunks.push(hunk);
            continue;
        }

        let hunk = hunks
            .last_mut()
            .ok_or_else(|| PatchError::format(line_number, line, "hunk line before range header"))?;

        if let Some(text) = body_text(line, '>') {
            hunk.lines.push(HunkLine::Add(text.to_string()));
        } else if let Some(text) = body_text(line, '<') {
            hunk.lines.push(HunkLine::Remove(text.to_string()));
        } else if line.starts_with("---") {
            // separates the old and new halves of a change
        } else if line == NO_ENDING_NEWLINE {
            if hunk.lines.last().is_some_and(HunkLine::is_addition) {
                patch.no_ending_newline = true;
            }
        } else {
            return Err(PatchError::format(line_number, line, "invalid hunk line"));
        }
    }

    patch.hunks = hunks;
    Ok(())
}

fn body_text(line: &str, marker: char) -> Option<&str> {
    let rest = line.strip_prefix(marker)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

fn parse_normal_range(line: &str, line_number: usize) -> PatchResult<Option<Hunk>> {
    let group = |caps: &Captures<'_>, idx: usize| -> PatchResult<Option<usize>> {
        caps.get(idx)
            .map(|m| parse_number(m.as_str(), line_number, line))
            .transpose()
    };

    if let Some(caps) = ADD_RANGE.captures(line) {
        let modified_start = group(&caps, 2)?.unwrap_or_default();
        return Ok(Some(Hunk {
            base_start: group(&caps, 1)?.unwrap_or_default(),
            base_count: 0,
            modified_start,
            modified_count: range_count(modified_start, group(&caps, 3)?),
            lines: Vec::new(),
        }));
    }

    if let Some(caps) = CHANGE_RANGE.captures(line) {
        let base_start = group(&caps, 1)?.unwrap_or_default();
        let modified_start = group(&caps, 3)?.unwrap_or_default();
        return Ok(Some(Hunk {
            base_start,
            base_count: range_count(base_start, group(&caps, 2)?),
            modified_start,
            modified_count: range_count(modified_start, group(&caps, 4)?),
            lines: Vec::new(),
        }));
    }

    if let Some(caps) = DELETE_RANGE.captures(line) {
        let base_start = group(&caps, 1)?.unwrap_or_default();
        return Ok(Some(Hunk {
            base_start,
            base_count: range_count(base_start, group(&caps, 2)?),
            modified_start: group(&caps, 3)?.unwrap_or_default(),
            modified_count: 0,
            lines: Vec::new(),
        }));
    }

    Ok(None)
}
