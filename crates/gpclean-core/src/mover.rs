use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::exiftool::{is_datelike, MetadataTool};

/// Tags that qualify a file for moving, in priority order. Requested without
/// a group prefix so QuickTime and RIFF dates satisfy them too.
const DATE_TAGS: &[&str] = &["DateTimeOriginal", "CreateDate", "XMP:DateCreated"];

/// Formats whose mtime is accepted as a date signal of last resort.
const MTIME_FALLBACK_EXTS: &[&str] = &["png", "avi"];

/// Check whether the file carries a capture date the mover trusts.
pub fn has_capture_date(tool: &dyn MetadataTool, path: &Path) -> bool {
    let mut tags: Vec<&str> = DATE_TAGS.to_vec();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if ext
        .as_deref()
        .is_some_and(|e| MTIME_FALLBACK_EXTS.contains(&e))
    {
        tags.push("FileModifyDate");
    }

    let values = tool.read_tags(path, &tags);
    tags.iter()
        .any(|t| values.get(*t).is_some_and(|v| is_datelike(v)))
}

/// A planned move with its collision bookkeeping.
#[derive(Debug, Clone)]
pub struct MoveCandidate {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// 0 when the original base name was free, else the `_k` suffix used.
    pub collision_suffix: u32,
    /// The first-choice name was already occupied on disk at plan time.
    pub duplicate_on_disk: bool,
}

/// Reserve a destination name for every source, in the order given (the
/// scanner's traversal order). The claim set prevents two in-flight sources
/// with the same base name from landing on one destination, dry-run included.
pub fn plan_moves(sources: &[PathBuf], dest_dir: &Path) -> Vec<MoveCandidate> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut plan = Vec::with_capacity(sources.len());

    for source in sources {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let first_choice = dest_dir.join(filename);
        let duplicate_on_disk = first_choice.exists();

        let mut dest = first_choice;
        let mut collision_suffix = 0u32;
        if dest.exists() || claimed.contains(&dest) {
            let stem = Path::new(filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("file");
            let ext = Path::new(filename)
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("");
            let mut k = 1u32;
            loop {
                let name = if ext.is_empty() {
                    format!("{stem}_{k}")
                } else {
                    format!("{stem}_{k}.{ext}")
                };
                let candidate = dest_dir.join(name);
                if !candidate.exists() && !claimed.contains(&candidate) {
                    dest = candidate;
                    collision_suffix = k;
                    break;
                }
                k += 1;
            }
        }

        claimed.insert(dest.clone());
        plan.push(MoveCandidate {
            source: source.clone(),
            dest,
            collision_suffix,
            duplicate_on_disk,
        });
    }

    plan
}

/// The only call site that may touch the filesystem during a move run.
/// Rename is atomic within a filesystem; cross-device destinations fall back
/// to copy-then-delete.
pub fn execute_move(candidate: &MoveCandidate, execute: bool) -> io::Result<()> {
    if !execute {
        return Ok(());
    }
    match fs::rename(&candidate.source, &candidate.dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(&candidate.source, &candidate.dest)?;
            fs::remove_file(&candidate.source)
        }
        Err(e) => Err(e),
    }
}
