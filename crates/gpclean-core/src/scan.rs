use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Enumerate media files under `root` as a stable pre-order walk, sorted
/// lexicographically per directory. This order is what breaks collision
/// ties in the mover, so it must stay deterministic. Paths under `exclude`
/// are skipped.
pub fn find_media_files(
    root: &Path,
    extensions: &[&str],
    exclude: Option<&Path>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            // An unreadable root means the whole run is meaningless.
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if exclude.is_some_and(|ex| path.starts_with(ex)) {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
