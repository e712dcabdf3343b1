use std::path::Path;

use chrono::NaiveDateTime;

use crate::exiftool::{is_datelike, MetadataTool};
use crate::media::{ContainerClass, MediaFile};

/// Per-file outcome of the metadata writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    AlreadyDated,
    WriteFailed,
}

impl WriteOutcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::AlreadyDated => "already-dated",
            Self::WriteFailed => "write-failed",
        }
    }
}

/// The rendering every written tag uses.
pub fn format_instant(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y:%m:%d %H:%M:%S").to_string()
}

/// Tags probed to decide whether a file already carries a trustworthy
/// capture date. Containers disagree on which tag is authoritative, so the
/// probe list follows the write set of each class.
fn probe_tags(class: ContainerClass) -> &'static [&'static str] {
    match class {
        ContainerClass::Png => &["DateTimeOriginal", "CreateDate", "XMP:DateCreated"],
        ContainerClass::Video => &["CreateDate", "TrackCreateDate", "MediaCreateDate"],
        ContainerClass::Avi => &["DateTimeOriginal", "CreateDate"],
        _ => &["DateTimeOriginal"],
    }
}

fn tag_set(class: ContainerClass, value: &str) -> Vec<(String, String)> {
    let tag = |name: &str| (name.to_string(), value.to_string());
    match class {
        ContainerClass::Jpeg
        | ContainerClass::Heic
        | ContainerClass::Tiff
        | ContainerClass::Other => vec![
            tag("EXIF:DateTimeOriginal"),
            tag("EXIF:CreateDate"),
            tag("EXIF:ModifyDate"),
        ],
        ContainerClass::Png => vec![
            tag("EXIF:DateTimeOriginal"),
            tag("EXIF:CreateDate"),
            tag("EXIF:ModifyDate"),
            tag("XMP:DateCreated"),
        ],
        ContainerClass::Video => vec![
            tag("QuickTime:CreateDate"),
            tag("QuickTime:ModifyDate"),
            tag("QuickTime:TrackCreateDate"),
            tag("QuickTime:MediaCreateDate"),
            tag("Keys:CreationDate"),
        ],
        ContainerClass::Avi => vec![
            tag("DateTimeOriginal"),
            tag("CreateDate"),
            tag("ModifyDate"),
        ],
    }
}

/// The only call site that may mutate a file during a fill run. Short-circuits
/// under dry-run so the decision path stays identical in both modes.
fn gated_write(
    tool: &dyn MetadataTool,
    path: &Path,
    tags: &[(String, String)],
    execute: bool,
) -> bool {
    if !execute {
        return true;
    }
    tool.write_tags(path, tags)
}

/// Write the capture date into `media` with the tag set its container class
/// needs, skipping files that already carry one.
pub fn write_capture_date(
    tool: &dyn MetadataTool,
    media: &MediaFile,
    instant: &NaiveDateTime,
    execute: bool,
) -> WriteOutcome {
    let existing = tool.read_tags(&media.path, probe_tags(media.class));
    if existing.values().any(|v| is_datelike(v)) {
        return WriteOutcome::AlreadyDated;
    }

    let value = format_instant(instant);
    if gated_write(tool, &media.path, &tag_set(media.class, &value), execute) {
        return WriteOutcome::Written;
    }

    if media.class == ContainerClass::Avi {
        // RIFF containers that reject the generic tags still sort correctly
        // by mtime in most galleries.
        let fallback = vec![("FileModifyDate".to_string(), value)];
        if gated_write(tool, &media.path, &fallback, execute) {
            return WriteOutcome::Written;
        }
    }

    WriteOutcome::WriteFailed
}
