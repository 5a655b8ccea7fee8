use super::line_reader::PatchLineReader;
use super::{compute_target_path, expect_header, is_dev_null, parse_number};
use super::{INDEX_PREFIX, NO_ENDING_NEWLINE};
use crate::error::{PatchError, PatchResult};
use crate::types::{Hunk, HunkLine, SinglePatch};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

pub const UNIFIED_OLD_FILE_PREFIX: &str = "--- ";
pub const UNIFIED_NEW_FILE_PREFIX: &str = "+++ ";

// mercurial appends the enclosing function after the second @@
static UNIFIED_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(?:\s.*)?$").unwrap()
});

pub fn read_unified_patch(
    reader: &mut PatchLineReader<'_>,
    patch: &mut SinglePatch,
) -> PatchResult<()> {
    let base = expect_header(reader, UNIFIED_OLD_FILE_PREFIX, "invalid unified diff header")?;
    let modified = expect_header(reader, UNIFIED_NEW_FILE_PREFIX, "invalid unified diff header")?;
    if patch.target_path.is_none() {
        patch.target_path = Some(compute_target_path(base, modified));
    }
    patch.deletes_target = is_dev_null(modified);

    let mut hunks: Vec<Hunk> = Vec::new();
    let mut last_was_removal = false;

    while let Some(line) = reader.next_line() {
        if line.is_empty() || line.starts_with(INDEX_PREFIX) {
            reader.unread();
            break;
        }

        if line.starts_with('@') {
            hunks.push(parse_unified_range(line, reader.line_number())?);
            continue;
        }

        // a finished hunk followed by `--- ` is the next file's header, not a removal
        if line.starts_with(UNIFIED_OLD_FILE_PREFIX) && hunks.last().is_some_and(Hunk::is_complete)
        {
            reader.unread();
            break;
        }

        let hunk_line = match line.as_bytes()[0] {
            b' ' => HunkLine::Context(line[1..].to_string()),
            b'+' => HunkLine::Add(line[1..].to_string()),
            b'-' => HunkLine::Remove(line[1..].to_string()),
            _ if line == NO_ENDING_NEWLINE => {
                if !last_was_removal {
                    patch.no_ending_newline = true;
                }
                continue;
            }
            _ => {
                trace!("Unified hunk ended by {:?}", line);
                reader.unread();
                break;
            }
        };

        let hunk = hunks.last_mut().ok_or_else(|| {
            PatchError::format(reader.line_number(), line, "hunk line before range header")
        })?;
        last_was_removal = hunk_line.is_removal();
        hunk.lines.push(hunk_line);
    }

    patch.hunks = hunks;
    Ok(())
}

pub fn parse_unified_range(line: &str, line_number: usize) -> PatchResult<Hunk> {
    let caps = UNIFIED_RANGE
        .captures(line)
        .ok_or_else(|| PatchError::format(line_number, line, "invalid unified diff range"))?;

    let number = |idx: usize| -> PatchResult<usize> {
        match caps.get(idx) {
            Some(m) => parse_number(m.as_str(), line_number, line),
            None => Ok(1),
        }
    };

    Ok(Hunk {
        base_start: number(1)?,
        base_count: number(2)?,
        modified_start: number(3)?,
        modified_count: number(4)?,
        lines: Vec::new(),
    })
}
