pub mod cancel;
pub mod date;
pub mod exiftool;
pub mod media;
pub mod mover;
pub mod progress;
pub mod scan;
pub mod writer;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use cancel::{CancellationToken, CancelledError};
pub use exiftool::{ExifTool, MetadataTool};
pub use progress::{Counters, ProgressCallback, ProgressLine};

/// Options for a fill run (set-exif-from-metadata).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillOptions {
    pub input: PathBuf,
    /// Apply changes; false is dry-run, the default everywhere.
    #[serde(default)]
    pub execute: bool,
    /// Worker count; None lets rayon size the pool to the logical CPUs.
    #[serde(default)]
    pub jobs: Option<usize>,
}

/// Options for a move run (move-with-exif).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub execute: bool,
    #[serde(default)]
    pub jobs: Option<usize>,
}

/// Aggregated counts of a fill run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillReport {
    pub total: u64,
    pub written: u64,
    pub already_dated: u64,
    pub no_date_source: u64,
    pub write_failed: u64,
}

/// Aggregated counts of a move run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveReport {
    pub total: u64,
    pub movable: u64,
    pub duplicates: u64,
    pub not_moved: u64,
    pub moved: u64,
    pub failed: u64,
}

fn build_pool(jobs: Option<usize>) -> anyhow::Result<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = jobs {
        builder = builder.num_threads(n.max(1));
    }
    builder.build().context("failed to build worker pool")
}

fn canonical_input_dir(path: &Path) -> anyhow::Result<PathBuf> {
    let canonical = fs::canonicalize(path)
        .with_context(|| format!("input directory does not exist: {}", path.display()))?;
    if !canonical.is_dir() {
        anyhow::bail!("not a directory: {}", canonical.display());
    }
    Ok(canonical)
}

/// Fill run: resolve a capture date for every media file under the input
/// tree and write it into the file's own metadata. Per-file failures are
/// counted, never fatal.
pub fn run_fill(
    options: &FillOptions,
    tool: &dyn MetadataTool,
    token: &CancellationToken,
    counters: &Counters,
    progress_callback: &ProgressCallback,
) -> anyhow::Result<FillReport> {
    let input = canonical_input_dir(&options.input)?;
    let tp = ProgressLine::new(progress_callback);

    let files = scan::find_media_files(&input, media::MEDIA_EXTENSIONS, None)?;
    let total = files.len() as u64;

    let pool = build_pool(options.jobs)?;
    let processed = AtomicU64::new(0);
    pool.install(|| {
        files.par_iter().for_each(|path| {
            if token.is_cancelled() {
                return;
            }
            fill_one(tool, path, options.execute, counters);
            let current = processed.fetch_add(1, Ordering::Relaxed);
            tp.report("fill", current, total, "Setting capture dates");
        });
    });
    token.check()?;

    Ok(FillReport {
        total,
        written: counters.get("fill", "written"),
        already_dated: counters.get("fill", "already-dated"),
        no_date_source: counters.get("fill", "no-date-source"),
        write_failed: counters.get("fill", "write-failed"),
    })
}

fn fill_one(tool: &dyn MetadataTool, path: &Path, execute: bool, counters: &Counters) {
    let resolution = date::resolve_date(path);
    if resolution.sidecar_parse_failed {
        counters.add("fill", "sidecar-parse-fail");
    }
    let Some(resolved) = resolution.date else {
        counters.add("fill", "no-date-source");
        log::debug!("{}: no date source", path.display());
        return;
    };

    counters.add("date-source", resolved.provenance.label());
    let media_file = media::MediaFile::new(path.to_path_buf());
    let outcome = writer::write_capture_date(tool, &media_file, &resolved.datetime, execute);
    counters.add("fill", outcome.label());
    log::debug!(
        "{}: {} ({})",
        path.display(),
        outcome.label(),
        resolved.provenance.label()
    );
}

/// Move run: collect files whose metadata already carries a capture date,
/// assign collision-free names in the destination, then move (or, under
/// dry-run, only report).
pub fn run_move(
    options: &MoveOptions,
    tool: &dyn MetadataTool,
    token: &CancellationToken,
    counters: &Counters,
    progress_callback: &ProgressCallback,
) -> anyhow::Result<MoveReport> {
    let input = canonical_input_dir(&options.input)?;
    let output = if options.output.exists() {
        fs::canonicalize(&options.output)?
    } else {
        std::path::absolute(&options.output)?
    };

    let tp = ProgressLine::new(progress_callback);
    let files = scan::find_media_files(&input, media::MEDIA_EXTENSIONS, Some(&output))?;
    let total = files.len() as u64;

    // Stage 1: parallel date check, order preserved for the planner.
    let pool = build_pool(options.jobs)?;
    let checked = AtomicU64::new(0);
    let dated: Vec<bool> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                if token.is_cancelled() {
                    return false;
                }
                let has_date = mover::has_capture_date(tool, path);
                if !has_date {
                    log::debug!("{}: not moved (no date)", path.display());
                }
                let current = checked.fetch_add(1, Ordering::Relaxed);
                tp.report("check", current, total, "Reading capture dates");
                has_date
            })
            .collect()
    });
    token.check()?;

    let movable: Vec<PathBuf> = files
        .iter()
        .zip(&dated)
        .filter(|(_, &has_date)| has_date)
        .map(|(path, _)| path.clone())
        .collect();
    counters.add_n("move", "movable", movable.len() as u64);
    counters.add_n("move", "not-moved", (files.len() - movable.len()) as u64);

    // Stage 2: single-threaded reservation keeps suffix assignment
    // deterministic in traversal order.
    let plan = mover::plan_moves(&movable, &output);
    counters.add_n(
        "move",
        "duplicates",
        plan.iter().filter(|c| c.duplicate_on_disk).count() as u64,
    );

    // Stage 3: execution, gated on --execute.
    if options.execute {
        fs::create_dir_all(&output)
            .with_context(|| format!("failed to create output directory {}", output.display()))?;
        let move_total = plan.len() as u64;
        let done = AtomicU64::new(0);
        pool.install(|| {
            plan.par_iter().for_each(|candidate| {
                if token.is_cancelled() {
                    return;
                }
                match mover::execute_move(candidate, true) {
                    Ok(()) => counters.add("move", "moved"),
                    Err(e) => {
                        counters.add("move", "move-failed");
                        log::warn!(
                            "{} -> {}: move failed: {}",
                            candidate.source.display(),
                            candidate.dest.display(),
                            e
                        );
                    }
                }
                let current = done.fetch_add(1, Ordering::Relaxed);
                tp.report("move", current, move_total, "Moving files");
            });
        });
        token.check()?;
    }

    Ok(MoveReport {
        total,
        movable: counters.get("move", "movable"),
        duplicates: counters.get("move", "duplicates"),
        not_moved: counters.get("move", "not-moved"),
        moved: counters.get("move", "moved"),
        failed: counters.get("move", "move-failed"),
    })
}
