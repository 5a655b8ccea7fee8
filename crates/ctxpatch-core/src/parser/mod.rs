pub mod binary;
pub mod context;
pub mod line_reader;
pub mod normal;
pub mod normalizer;
pub mod unified;

use crate::error::{PatchError, PatchResult};
use crate::types::SinglePatch;
use line_reader::PatchLineReader;
use log::{debug, trace};

/// First line of patches exported as UTF-8; everything else is read as ISO-8859-1.
pub const MAGIC: &str = "# This patch file was generated by NetBeans IDE";

pub const DEV_NULL: &str = "/dev/null";
pub const INDEX_PREFIX: &str = "Index:";
pub const NO_ENDING_NEWLINE: &str = "\\ No newline at end of file";

const RENAME_FROM: &str = "rename from ";
const RENAME_TO: &str = "rename to ";
const COPY_FROM: &str = "copy from ";
const COPY_TO: &str = "copy to ";
const GIT_DIFF_PREFIX: &str = "diff --git ";

pub fn decode_patch_bytes(bytes: &[u8]) -> String {
    if bytes.starts_with(MAGIC.as_bytes()) {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

pub fn parse_patches(content: &str) -> PatchResult<Vec<SinglePatch>> {
    let mut reader = PatchLineReader::new(content);
    let mut patches = Vec::new();

    while let Some(patch) = next_patch(&mut reader)? {
        debug!(
            "Parsed patch #{} for {:?} ({} hunk(s))",
            patches.len() + 1,
            patch.target_path,
            patch.hunks.len()
        );
        patches.push(patch);
    }

    Ok(patches)
}

fn next_patch(reader: &mut PatchLineReader<'_>) -> PatchResult<Option<SinglePatch>> {
    let mut patch = SinglePatch::default();

    loop {
        let Some(line) = reader.next_line() else {
            return Ok(patch.is_complete_move().then_some(patch));
        };

        if let Some(path) = line.strip_prefix(INDEX_PREFIX) {
            patch.target_path = Some(path.trim().to_string());
        } else if line.starts_with(binary::MIME_PREFIX) {
            reader.unread();
            binary::read_binary_patch(reader, &mut patch)?;
            return Ok(Some(patch));
        } else if line.starts_with("--- ") {
            reader.unread();
            unified::read_unified_patch(reader, &mut patch)?;
            return Ok(Some(patch));
        } else if line.starts_with("*** ") {
            reader.unread();
            context::read_context_patch(reader, &mut patch)?;
            return Ok(Some(patch));
        } else if normal::is_normal_range(line) {
            reader.unread();
            normal::read_normal_patch(reader, &mut patch)?;
            return Ok(Some(patch));
        } else if let Some(path) = line.strip_prefix(RENAME_FROM) {
            patch.source_path = Some(path.to_string());
            patch.rename = true;
        } else if let Some(path) = line.strip_prefix(RENAME_TO) {
            patch.target_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix(COPY_FROM) {
            patch.source_path = Some(path.to_string());
            patch.copy = true;
        } else if let Some(path) = line.strip_prefix(COPY_TO) {
            patch.target_path = Some(path.to_string());
        } else if line.starts_with(GIT_DIFF_PREFIX) && patch.has_metadata() {
            if patch.is_complete_move() {
                reader.unread();
                return Ok(Some(patch));
            }
            trace!("Discarding incomplete git header before {:?}", line);
            patch = SinglePatch::default();
        } else {
            trace!("Skipping line {}: {:?}", reader.line_number(), line);
        }
    }
}

/// Reads the next line and checks it carries the expected header prefix.
pub(crate) fn expect_header<'a>(
    reader: &mut PatchLineReader<'a>,
    prefix: &str,
    reason: &'static str,
) -> PatchResult<&'a str> {
    match reader.next_line() {
        Some(line) if line.starts_with(prefix) => Ok(line),
        Some(line) => Err(PatchError::format(reader.line_number(), line, reason)),
        None => Err(PatchError::format(reader.line_number(), "", reason)),
    }
}

pub(crate) fn is_dev_null(header: &str) -> bool {
    header.get(4..).is_some_and(|path| path.starts_with(DEV_NULL))
}

/// Derives the file a patch applies to from its two header lines.
///
/// Both headers still carry their four-character marker (`--- `, `+++ `, `*** `).
pub(crate) fn compute_target_path(base_header: &str, modified_header: &str) -> String {
    let mut base = base_header.get(4..).unwrap_or("");
    let mut modified = modified_header.get(4..).unwrap_or("");

    if base.starts_with("a/") && modified.starts_with("b/") {
        base = &base[2..];
    } else if base.starts_with(DEV_NULL) && modified.starts_with("b/") {
        modified = &modified[2..];
    } else if base.starts_with("a/") && modified.starts_with(DEV_NULL) {
        base = &base[2..];
    }

    let target = if base.starts_with(DEV_NULL) {
        modified
    } else {
        base
    };

    target.split('\t').next().unwrap_or(target).trim().to_string()
}

pub(crate) fn parse_number(text: &str, line_number: usize, line: &str) -> PatchResult<usize> {
    text.parse::<usize>()
        .map_err(|_| PatchError::format(line_number, line, "line number out of range"))
}

/// Line count of an `N[,M]` range where `M` is the last line, not a count.
pub(crate) fn range_count(start: usize, end: Option<usize>) -> usize {
    match end {
        Some(end) if start == 0 => end,
        Some(end) => (end + 1).saturating_sub(start),
        None if start == 0 => 0,
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BinaryPayload, HunkLine};

    #[test]
    fn test_decode_patch_bytes_latin1_by_default() {
        let bytes = b"--- a\n+++ a\n@@ -1 +1 @@\n-caf\xe9\n+cafe\n";
        let text = decode_patch_bytes(bytes);
        assert!(text.contains("caf\u{e9}"));
    }

    #[test]
    fn test_decode_patch_bytes_utf8_with_magic() {
        let mut bytes = format!("{}\n", MAGIC).into_bytes();
        bytes.extend_from_slice("+caf\u{e9}\n".as_bytes());
        let text = decode_patch_bytes(&bytes);
        assert!(text.ends_with("+caf\u{e9}\n"));
    }

    #[test]
    fn test_compute_target_path_variations() {
        assert_eq!(compute_target_path("--- a/src/lib.rs", "+++ b/src/lib.rs"), "src/lib.rs");
        assert_eq!(compute_target_path("--- /dev/null", "+++ b/new.txt"), "new.txt");
        assert_eq!(compute_target_path("--- a/gone.txt", "+++ /dev/null"), "gone.txt");
        assert_eq!(
            compute_target_path("--- file.c\t2024-01-01 10:00:00", "+++ file.c\t2024-01-02"),
            "file.c"
        );
        assert_eq!(compute_target_path("*** old.c", "--- new.c"), "old.c");
    }

    #[test]
    fn test_range_count() {
        assert_eq!(range_count(3, Some(5)), 3);
        assert_eq!(range_count(4, None), 1);
        assert_eq!(range_count(0, None), 0);
        assert_eq!(range_count(0, Some(0)), 0);
    }

    #[test]
    fn test_parse_mixed_formats() {
        let content = "\
Index: one.txt
--- one.txt
+++ one.txt
@@ -1,2 +1,2 @@
 keep
-old
+new

*** two.txt
--- two.txt
***************
*** 1,2 ****
  keep
! old
--- 1,2 ----
  keep
! new

Index: three.txt
2c2
< old
---
> new

Index: four.bin
MIME: application/octet-stream; encoding: base64; length: 3
AAEC
";
        let patches = parse_patches(content).unwrap();
        assert_eq!(patches.len(), 4);
        assert_eq!(patches[0].target_path.as_deref(), Some("one.txt"));
        assert_eq!(patches[1].target_path.as_deref(), Some("two.txt"));
        assert_eq!(patches[2].target_path.as_deref(), Some("three.txt"));
        assert_eq!(patches[3].target_path.as_deref(), Some("four.bin"));

        let expected = vec![
            HunkLine::Context("keep".to_string()),
            HunkLine::Remove("old".to_string()),
            HunkLine::Add("new".to_string()),
        ];
        assert_eq!(patches[0].hunks[0].lines, expected);
        assert_eq!(patches[1].hunks[0].lines, expected);
        assert_eq!(patches[2].hunks[0].lines, expected[1..].to_vec());
        assert!(matches!(patches[3].binary, Some(BinaryPayload::Content { .. })));
    }

    #[test]
    fn test_parse_git_rename_and_copy_headers() {
        let content = "\
diff --git a/old.txt b/new.txt
similarity index 100%
rename from old.txt
rename to new.txt
diff --git a/src.txt b/dup.txt
similarity index 100%
copy from src.txt
copy to dup.txt
";
        let patches = parse_patches(content).unwrap();
        assert_eq!(patches.len(), 2);
        assert!(patches[0].rename);
        assert_eq!(patches[0].source_path.as_deref(), Some("old.txt"));
        assert_eq!(patches[0].target_path.as_deref(), Some("new.txt"));
        assert!(patches[1].copy);
        assert_eq!(patches[1].source_path.as_deref(), Some("src.txt"));
        assert_eq!(patches[1].target_path.as_deref(), Some("dup.txt"));
        assert!(patches.iter().all(|p| p.hunks.is_empty()));
    }

    #[test]
    fn test_parse_git_rename_with_edit() {
        let content = "\
diff --git a/old.txt b/new.txt
similarity index 90%
rename from old.txt
rename to new.txt
--- a/old.txt
+++ b/new.txt
@@ -1 +1 @@
-hello
+goodbye
";
        let patches = parse_patches(content).unwrap();
        assert_eq!(patches.len(), 1);
        assert!(patches[0].rename);
        assert_eq!(patches[0].target_path.as_deref(), Some("new.txt"));
        assert_eq!(patches[0].hunks.len(), 1);
    }

    #[test]
    fn test_parse_skips_preamble_and_trailing_text() {
        let content = "\
From 1234 Mon Sep 17 00:00:00 2001
Subject: [PATCH] tweak

---
 a.txt | 2 +-
";
        let patches = parse_patches(content).unwrap();
        assert!(patches.is_empty());
    }
}
