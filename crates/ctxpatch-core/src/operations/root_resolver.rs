use super::patch_applicator::apply_patch;
use crate::options::PatchOptions;
use crate::types::SinglePatch;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Picks the directory, among `suggested` and its ancestors, under which the
/// most patches apply. The innermost directory wins ties.
pub fn resolve_root(
    suggested: &Path,
    patches: &mut [SinglePatch],
    options: &PatchOptions,
) -> PathBuf {
    let start = std::path::absolute(suggested).unwrap_or_else(|_| suggested.to_path_buf());
    if patches.is_empty() {
        return start;
    }

    let mut best = start.clone();
    let mut best_applied = 0;

    for candidate in start.ancestors().take(options.max_ancestors.saturating_add(1)) {
        let applied = patches
            .iter_mut()
            .map(|patch| apply_patch(patch, candidate, options, true))
            .filter(|result| result.is_ok())
            .count();
        debug!(
            "{} of {} patch(es) apply under {:?}",
            applied,
            patches.len(),
            candidate
        );

        if applied > best_applied {
            best_applied = applied;
            best = candidate.to_path_buf();
            if applied == patches.len() {
                break;
            }
        }
    }

    info!(
        "Using {:?} as patch root ({} of {} patch(es) apply)",
        best,
        best_applied,
        patches.len()
    );
    best
}
