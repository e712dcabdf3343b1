use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Extensions handled by both the fill and the move pipeline.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "tif", "tiff", "png", "heic", "mp4", "mov", "3gp", "avi",
];

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Format family of a media file; decides which metadata tag set is
/// authoritative for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerClass {
    Jpeg,
    Heic,
    Png,
    Tiff,
    /// MP4 / MOV / 3GP
    Video,
    Avi,
    Other,
}

impl ContainerClass {
    /// Classify by extension alone, case-insensitive.
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "heic" => Self::Heic,
            "png" => Self::Png,
            "tif" | "tiff" => Self::Tiff,
            "mp4" | "mov" | "3gp" => Self::Video,
            "avi" => Self::Avi,
            _ => Self::Other,
        }
    }
}

/// A media file paired with its resolved container class.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    pub class: ContainerClass,
}

impl MediaFile {
    /// Classify `path`. Takeout occasionally stores JPEG bytes under a .png
    /// name and vice versa, so for that pair the magic bytes win over the
    /// extension.
    pub fn new(path: PathBuf) -> Self {
        let ext_class = ContainerClass::from_extension(&path);
        let class = match ext_class {
            ContainerClass::Png | ContainerClass::Jpeg => sniff_png_jpeg(&path, ext_class),
            other => other,
        };
        Self { path, class }
    }
}

fn sniff_png_jpeg(path: &Path, ext_class: ContainerClass) -> ContainerClass {
    let mut magic = [0u8; 8];
    let Ok(mut file) = File::open(path) else {
        return ext_class;
    };
    if file.read_exact(&mut magic).is_err() {
        return ext_class;
    }
    if magic == PNG_MAGIC {
        ContainerClass::Png
    } else if magic[..3] == JPEG_MAGIC {
        ContainerClass::Jpeg
    } else {
        ext_class
    }
}
