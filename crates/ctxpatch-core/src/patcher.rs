//! Drives a whole patch file: parse, pick the root, reorder, apply, report.

use crate::error::{PatchError, PatchResult};
use crate::operations::file_operations::{compute_backup, remove_file};
use crate::operations::{apply_patch, resolve_root};
use crate::options::PatchOptions;
use crate::parser::{decode_patch_bytes, parse_patches};
use crate::types::{PatchReport, PatchStatus, SinglePatch};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ContextualPatch {
    content: String,
    suggested_root: PathBuf,
    options: PatchOptions,
}

impl ContextualPatch {
    pub fn open(patch_file: impl AsRef<Path>, root: impl Into<PathBuf>) -> PatchResult<Self> {
        let patch_file = patch_file.as_ref();
        let bytes = fs::read(patch_file).map_err(|e| PatchError::io(patch_file, e))?;
        Ok(Self::from_bytes(&bytes, root))
    }

    pub fn from_bytes(bytes: &[u8], root: impl Into<PathBuf>) -> Self {
        Self::from_text(decode_patch_bytes(bytes), root)
    }

    pub fn from_text(content: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            content: content.into(),
            suggested_root: root.into(),
            options: PatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Applies every patch in the file and returns one report per patch.
    ///
    /// Only malformed patch syntax fails the call; a patch that cannot be applied
    /// is reported and the remaining patches still run.
    pub fn patch(&self, dry_run: bool) -> PatchResult<Vec<PatchReport>> {
        let mut patches = parse_patches(&self.content)?;
        info!("Read {} patch(es)", patches.len());

        let root = resolve_root(&self.suggested_root, &mut patches, &self.options);
        reorder_patches(&mut patches);

        let reports = patches
            .iter_mut()
            .map(|patch| self.apply_and_report(patch, &root, dry_run))
            .collect();

        if !dry_run {
            apply_pending_deletes(&patches);
        }
        Ok(reports)
    }

    fn apply_and_report(&self, patch: &mut SinglePatch, root: &Path, dry_run: bool) -> PatchReport {
        let result = apply_patch(patch, root, &self.options, dry_run);
        let file = patch
            .target_file
            .clone()
            .unwrap_or_else(|| root.to_path_buf());

        match result {
            Ok(()) => {
                patch.applied = true;
                let backed_up = match (&patch.source_file, patch.rename) {
                    (Some(source), true) => source.as_path(),
                    _ => file.as_path(),
                };
                let backup_file = compute_backup(backed_up, &self.options.backup_suffix);
                PatchReport {
                    file,
                    backup_file: Some(backup_file),
                    binary: patch.is_binary(),
                    status: PatchStatus::Patched,
                    failure: None,
                }
            }
            Err(err) => {
                let existed = file.exists()
                    || patch.source_file.as_deref().is_some_and(Path::exists);
                let status = if matches!(err, PatchError::HunkApply { .. }) && !existed {
                    PatchStatus::Missing
                } else {
                    PatchStatus::Failure
                };
                warn!("[{}] {:?}: {}", status, file, err);
                PatchReport {
                    file,
                    backup_file: None,
                    binary: patch.is_binary(),
                    status,
                    failure: Some(err),
                }
            }
        }
    }
}

/// Copies first, then renames: both read a source file that later in-place
/// edits may modify. The sort is stable, so the file order is kept otherwise.
pub fn reorder_patches(patches: &mut [SinglePatch]) {
    patches.sort_by(|a, b| {
        b.copy
            .cmp(&a.copy)
            .then_with(|| b.rename.cmp(&a.rename))
    });
}

fn apply_pending_deletes(patches: &[SinglePatch]) {
    for patch in patches.iter().filter(|p| p.rename && p.applied) {
        let Some(source) = &patch.source_file else {
            continue;
        };
        if patch.target_file.as_deref() == Some(source.as_path()) {
            continue;
        }
        debug!("Removing renamed source {:?}", source);
        if let Err(e) = remove_file(source) {
            warn!("Could not remove renamed source: {}", e);
        }
    }
}
