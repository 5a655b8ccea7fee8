use super::file_operations::{backup, read_lines, remove_file, write_bytes, write_lines};
use crate::error::{PatchError, PatchResult};
use crate::matcher::HunkLocator;
use crate::options::PatchOptions;
use crate::parser::binary::decode_payload;
use crate::types::{BinaryPayload, SinglePatch};
use log::{debug, info};
use std::path::{Path, PathBuf};

fn resolve(root: &Path, root_is_file: bool, relative: &str) -> PathBuf {
    if root_is_file {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// Applies one patch relative to `root`. In dry-run mode nothing is written but
/// every hunk must still be locatable.
pub fn apply_patch(
    patch: &mut SinglePatch,
    root: &Path,
    options: &PatchOptions,
    dry_run: bool,
) -> PatchResult<()> {
    let root_is_file = root.is_file();
    patch.source_file = patch
        .source_path
        .as_deref()
        .map(|p| resolve(root, root_is_file, p));
    let target_file = match patch.target_path.as_deref() {
        Some(p) => resolve(root, root_is_file, p),
        None => root.to_path_buf(),
    };
    patch.target_file = Some(target_file.clone());

    let existing_source = patch.source_file.as_deref().filter(|p| p.exists());
    let mut lines = if patch.is_binary() {
        Vec::new()
    } else if let Some(source) = existing_source {
        read_lines(source)?
    } else if target_file.exists() {
        read_lines(&target_file)?
    } else {
        Vec::new()
    };

    if !patch.is_binary() && creates_existing_file(patch, &lines) {
        debug!("{:?} already has the content this patch creates", target_file);
        return Ok(());
    }

    let mut locator = HunkLocator::new();
    for (i, hunk) in patch.hunks.iter().enumerate() {
        locator.apply_hunk(&mut lines, hunk, i + 1)?;
    }

    let binary_content = match &patch.binary {
        Some(BinaryPayload::Content {
            mime_type,
            encoding,
            length,
            lines: body,
        }) => {
            let content = decode_payload(encoding, body)?;
            if i64::try_from(content.len()).ok() != Some(*length) {
                return Err(PatchError::InvalidBinary {
                    reason: format!("header announces {} bytes, body has {}", length, content.len()),
                });
            }
            debug!("Decoded {} bytes of {} for {:?}", content.len(), mime_type, target_file);
            Some(content)
        }
        _ => None,
    };

    if dry_run {
        return Ok(());
    }

    if options.create_backups {
        if let Some(source) = &patch.source_file {
            backup(source, &options.backup_suffix)?;
        }
        backup(&target_file, &options.backup_suffix)?;
    }

    match (&patch.binary, binary_content) {
        (_, Some(content)) => write_bytes(&target_file, &content)?,
        (Some(BinaryPayload::Delete), _) => {
            // a binary rename keeps its target
            if !patch.rename {
                remove_file(&target_file)?;
            }
        }
        _ if patch.deletes_target && lines.is_empty() => remove_file(&target_file)?,
        _ => write_lines(&target_file, &lines, !patch.no_ending_newline)?,
    }

    info!("Patched {:?}", target_file);
    Ok(())
}

/// A single hunk that recreates the whole current file from nothing has already
/// been applied.
fn creates_existing_file(patch: &SinglePatch, current: &[String]) -> bool {
    let [hunk] = patch.hunks.as_slice() else {
        return false;
    };
    if hunk.base_start != 0
        || hunk.base_count != 0
        || hunk.modified_start != 1
        || hunk.modified_count != current.len()
    {
        return false;
    }

    let mut rebuilt = Vec::with_capacity(hunk.modified_count);
    HunkLocator::new().apply_hunk(&mut rebuilt, hunk, 1).is_ok() && rebuilt == current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatchError;
    use crate::types::{Hunk, HunkLine};
    use std::fs;
    use tempfile::tempdir;

    fn new_file_patch(path: &str, content: &[&str]) -> SinglePatch {
        SinglePatch {
            target_path: Some(path.to_string()),
            hunks: vec![Hunk {
                base_start: 0,
                base_count: 0,
                modified_start: 1,
                modified_count: content.len(),
                lines: content.iter().map(|l| HunkLine::Add(l.to_string())).collect(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_creates_file_and_directories() {
        let dir = tempdir().unwrap();
        let mut patch = new_file_patch("src/new.rs", &["fn main() {", "}"]);

        apply_patch(&mut patch, dir.path(), &PatchOptions::default(), false).unwrap();

        let path = dir.path().join("src/new.rs");
        assert_eq!(fs::read_to_string(&path).unwrap(), "fn main() {\n}\n");
        assert_eq!(patch.target_file.as_deref(), Some(path.as_path()));
        assert!(!dir.path().join("src/new.rs.original~").exists());
    }

    #[test]
    fn test_creating_existing_identical_file_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("same.txt");
        fs::write(&path, "one\ntwo\n").unwrap();

        let mut patch = new_file_patch("same.txt", &["one", "two"]);
        apply_patch(&mut patch, dir.path(), &PatchOptions::default(), false).unwrap();
        apply_patch(&mut patch, dir.path(), &PatchOptions::default(), false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert!(!dir.path().join("same.txt.original~").exists());
    }

    #[test]
    fn test_dry_run_leaves_files_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("code.txt");
        fs::write(&path, "a\nb\n").unwrap();

        let mut patch = SinglePatch {
            target_path: Some("code.txt".to_string()),
            hunks: vec![Hunk {
                base_start: 1,
                base_count: 2,
                modified_start: 1,
                modified_count: 2,
                lines: vec![
                    HunkLine::Context("a".to_string()),
                    HunkLine::Remove("b".to_string()),
                    HunkLine::Add("B".to_string()),
                ],
            }],
            ..Default::default()
        };

        apply_patch(&mut patch, dir.path(), &PatchOptions::default(), true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
        assert!(!dir.path().join("code.txt.original~").exists());

        apply_patch(&mut patch, dir.path(), &PatchOptions::default(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nB\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("code.txt.original~")).unwrap(),
            "a\nb\n"
        );
    }

    #[test]
    fn test_backups_can_be_disabled() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("f.txt"), "x\n").unwrap();
        let mut patch = SinglePatch {
            target_path: Some("f.txt".to_string()),
            hunks: vec![Hunk {
                base_start: 1,
                base_count: 1,
                modified_start: 1,
                modified_count: 1,
                lines: vec![
                    HunkLine::Remove("x".to_string()),
                    HunkLine::Add("y".to_string()),
                ],
            }],
            ..Default::default()
        };
        let options = PatchOptions {
            create_backups: false,
            ..Default::default()
        };

        apply_patch(&mut patch, dir.path(), &options, false).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("f.txt")).unwrap(), "y\n");
        assert!(!dir.path().join("f.txt.original~").exists());
    }

    #[test]
    fn test_root_may_be_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("only.txt");
        fs::write(&path, "old\n").unwrap();
        let mut patch = SinglePatch {
            target_path: Some("somewhere/else.txt".to_string()),
            hunks: vec![Hunk {
                base_start: 1,
                base_count: 1,
                modified_start: 1,
                modified_count: 1,
                lines: vec![
                    HunkLine::Remove("old".to_string()),
                    HunkLine::Add("new".to_string()),
                ],
            }],
            ..Default::default()
        };

        apply_patch(&mut patch, &path, &PatchOptions::default(), false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_invalid_binary_payload_fails_in_dry_run() {
        let dir = tempdir().unwrap();
        let mut patch = SinglePatch {
            target_path: Some("blob.bin".to_string()),
            binary: Some(BinaryPayload::Content {
                mime_type: "application/octet-stream".to_string(),
                encoding: "base64".to_string(),
                length: 3,
                lines: vec!["not base64!".to_string()],
            }),
            ..Default::default()
        };

        let err = apply_patch(&mut patch, dir.path(), &PatchOptions::default(), true).unwrap_err();
        assert!(matches!(err, PatchError::InvalidBinary { .. }));
    }

    #[test]
    fn test_binary_length_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let mut patch = SinglePatch {
            target_path: Some("blob.bin".to_string()),
            binary: Some(BinaryPayload::Content {
                mime_type: "application/octet-stream".to_string(),
                encoding: "base64".to_string(),
                length: 5,
                lines: vec!["AAEC".to_string()],
            }),
            ..Default::default()
        };

        let err = apply_patch(&mut patch, dir.path(), &PatchOptions::default(), false).unwrap_err();
        match err {
            PatchError::InvalidBinary { reason } => assert!(reason.contains("5 bytes")),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!dir.path().join("blob.bin").exists());
    }
}
