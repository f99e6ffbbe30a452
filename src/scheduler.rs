//! File patch scheduling: grouping, per-file folds, and persistence.
//!
//! A batch is partitioned into file groups keyed by target path, each group
//! keeping its instructions in original batch order. Every group is
//! processed independently: content is read once, the interpreter is folded
//! over the group's instructions, and the final buffer is written back in
//! one atomic pass. A failure in one group never aborts the others, and a
//! file already written stays written if a later group fails - best effort
//! across independent units, not all-or-nothing. Callers needing
//! transactional guarantees must snapshot files before invoking the engine.

use crate::instruction::{Instruction, InstructionBatch};
use crate::interpret::{self, Applied};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Terminal state of one file group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileReport should be checked for skipped/failed groups"]
pub enum FileReport {
    /// The final buffer was persisted.
    Written {
        path: PathBuf,
        /// Instructions that changed the buffer.
        applied: usize,
        /// Instructions whose pattern matched nowhere.
        no_match: usize,
    },
    /// The target file does not exist; the whole group was skipped.
    SkippedMissing { path: PathBuf },
    /// Reading or writing the file failed; the group was abandoned.
    Failed { path: PathBuf, reason: String },
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileReport::Written {
                path,
                applied,
                no_match,
            } => {
                write!(
                    f,
                    "Updated {} ({} applied, {} unmatched)",
                    path.display(),
                    applied,
                    no_match
                )
            }
            FileReport::SkippedMissing { path } => {
                write!(f, "Skipped missing file {}", path.display())
            }
            FileReport::Failed { path, reason } => {
                write!(f, "Failed on {}: {}", path.display(), reason)
            }
        }
    }
}

/// Computed result for one file group, before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePreview {
    /// The group's final buffer, ready to persist.
    Ready {
        path: PathBuf,
        original: String,
        patched: String,
        applied: usize,
        no_match: usize,
    },
    /// The target file does not exist.
    SkippedMissing { path: PathBuf },
    /// Reading the file failed.
    Failed { path: PathBuf, reason: String },
}

/// Compute every file group's final content without touching disk.
///
/// Used by dry runs and previews; [`apply_batch`] persists the same results.
/// Previews are returned in first-seen file order.
pub fn preview_batch(batch: &InstructionBatch, root: &Path) -> Vec<FilePreview> {
    let mut previews = Vec::new();

    for (path, group) in group_by_file(batch, root) {
        if !path.exists() {
            warn!(file = %path.display(), "target file not found, skipping group");
            previews.push(FilePreview::SkippedMissing { path });
            continue;
        }

        let original = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                error!(file = %path.display(), "failed to read file: {e}");
                previews.push(FilePreview::Failed {
                    path,
                    reason: format!("read failed: {e}"),
                });
                continue;
            }
        };

        // Fold the interpreter over the group: each instruction sees the
        // cumulative effect of the ones before it.
        let mut patched = original.clone();
        let mut applied = 0;
        let mut no_match = 0;
        for instruction in group {
            let (next, outcome) = interpret::apply(instruction, &patched);
            match outcome {
                Applied::NoMatch => no_match += 1,
                Applied::Inert => {}
                _ => applied += 1,
            }
            patched = next;
        }

        previews.push(FilePreview::Ready {
            path,
            original,
            patched,
            applied,
            no_match,
        });
    }

    previews
}

/// Apply a batch to the filesystem, one report per file group.
///
/// Each group runs to a terminal state (`Written`, `SkippedMissing`, or
/// `Failed`) without affecting the others; no error propagates out of this
/// call. Files already written are not rolled back when a later group fails.
pub fn apply_batch(batch: &InstructionBatch, root: &Path) -> Vec<FileReport> {
    preview_batch(batch, root)
        .into_iter()
        .map(|preview| match preview {
            FilePreview::Ready {
                path,
                patched,
                applied,
                no_match,
                ..
            } => match atomic_write(&path, patched.as_bytes()) {
                Ok(()) => {
                    info!(
                        file = %path.display(),
                        applied, no_match, "updated file"
                    );
                    FileReport::Written {
                        path,
                        applied,
                        no_match,
                    }
                }
                Err(e) => {
                    error!(file = %path.display(), "failed to write file: {e}");
                    FileReport::Failed {
                        path,
                        reason: format!("write failed: {e}"),
                    }
                }
            },
            FilePreview::SkippedMissing { path } => FileReport::SkippedMissing { path },
            FilePreview::Failed { path, reason } => FileReport::Failed { path, reason },
        })
        .collect()
}

/// Stable partition of a batch into file groups.
///
/// Groups come back in first-seen order and each group preserves the batch's
/// original instruction order. Instructions without a filename are dropped
/// here - malformed upstream output is tolerated, not reported.
fn group_by_file<'a>(
    batch: &'a InstructionBatch,
    root: &Path,
) -> Vec<(PathBuf, Vec<&'a Instruction>)> {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut groups: HashMap<PathBuf, Vec<&Instruction>> = HashMap::new();

    for instruction in batch.iter() {
        if instruction.filename().is_empty() {
            debug!(kind = instruction.kind(), "dropping instruction without filename");
            continue;
        }
        let path = resolve_target(root, instruction.filename());
        groups
            .entry(path.clone())
            .or_insert_with(|| {
                order.push(path.clone());
                Vec::new()
            })
            .push(instruction);
    }

    order
        .into_iter()
        .filter_map(|path| groups.remove(&path).map(|group| (path, group)))
        .collect()
}

/// Resolve a target filename against the batch root.
fn resolve_target(root: &Path, filename: &str) -> PathBuf {
    let path = Path::new(filename);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Atomic file write: tempfile in the target directory + fsync + rename,
/// then an mtime bump so downstream watchers and incremental builds notice.
///
/// The handle is scoped; every exit path flushes and closes it. A crash can
/// leave the temp file behind but never a half-written target.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}
