pub mod folder;
pub mod sidecar;

use std::path::Path;

use chrono::NaiveDateTime;

/// Where a resolved capture date came from. Reported in summaries; does not
/// change the value written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    SidecarPrimary,
    SidecarSupplemental,
    FolderName,
}

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Self::SidecarPrimary => "sidecar-primary",
            Self::SidecarSupplemental => "sidecar-supplemental",
            Self::FolderName => "folder-name",
        }
    }
}

/// A capture instant plus its provenance.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedDate {
    pub datetime: NaiveDateTime,
    pub provenance: Provenance,
}

/// Outcome of the resolver; sidecar parse failures are surfaced so the
/// caller can count them.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub date: Option<ResolvedDate>,
    pub sidecar_parse_failed: bool,
}

/// Resolve the capture date for one media file: companion sidecar first,
/// then an enclosing folder name. Never consults file modification time.
pub fn resolve_date(media_path: &Path) -> Resolution {
    let mut sidecar_parse_failed = false;

    match sidecar::sidecar_date(media_path) {
        sidecar::SidecarLookup::Date(datetime, provenance) => {
            return Resolution {
                date: Some(ResolvedDate {
                    datetime,
                    provenance,
                }),
                sidecar_parse_failed: false,
            };
        }
        sidecar::SidecarLookup::ParseFailed(sidecar_path) => {
            log::warn!(
                "{}: sidecar {} has no usable photoTakenTime",
                media_path.display(),
                sidecar_path.display()
            );
            sidecar_parse_failed = true;
        }
        sidecar::SidecarLookup::None => {}
    }

    if let Some(datetime) = folder::infer_from_folders(media_path) {
        return Resolution {
            date: Some(ResolvedDate {
                datetime,
                provenance: Provenance::FolderName,
            }),
            sidecar_parse_failed,
        };
    }

    Resolution {
        date: None,
        sidecar_parse_failed,
    }
}
