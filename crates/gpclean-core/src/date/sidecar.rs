use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use super::Provenance;

/// Result of looking up a media file's companion sidecar.
#[derive(Debug, Clone)]
pub enum SidecarLookup {
    /// No sidecar exists under any known naming rule.
    None,
    /// A sidecar was found but held no usable photoTakenTime.
    ParseFailed(PathBuf),
    Date(NaiveDateTime, Provenance),
}

/// Find the sidecar for a media file, probing Takeout's naming variants in
/// priority order. The first existing file wins; later candidates are never
/// consulted.
pub fn find_sidecar(media_path: &Path) -> Option<(PathBuf, Provenance)> {
    let dir = media_path.parent()?;
    let name = media_path.file_name()?.to_str()?;
    let stem = media_path.file_stem()?.to_str()?;

    let primary = [format!("{name}.json"), format!("{stem}.json")];
    for candidate in &primary {
        let path = dir.join(candidate);
        if path.is_file() {
            return Some((path, Provenance::SidecarPrimary));
        }
    }

    // Takeout truncates long sidecar names, hence the -m and bare-dash forms.
    let supplemental = [
        format!("{name}.supplemental-metadata.json"),
        format!("{name}.supplemental.json"),
        format!("{name}.supplemental-m.json"),
        format!("{name}.supplemental-.json"),
    ];
    for candidate in &supplemental {
        let path = dir.join(candidate);
        if path.is_file() {
            return Some((path, Provenance::SidecarSupplemental));
        }
    }

    // Anything else the truncation produced: <name>.supp*.json, smallest
    // name first for a deterministic pick.
    let prefix = format!("{name}.supp");
    let mut globbed: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
        })
        .map(|entry| entry.path())
        .collect();
    globbed.sort();
    globbed
        .into_iter()
        .next()
        .map(|path| (path, Provenance::SidecarSupplemental))
}

/// Extract photoTakenTime from sidecar bytes. Google records UTC epoch
/// seconds; downstream viewers read the written EXIF value as local civil
/// time, so convert through the host zone.
pub fn parse_sidecar(bytes: &[u8]) -> Option<NaiveDateTime> {
    let data: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    let timestamp = data.get("photoTakenTime")?.get("timestamp")?;
    let epoch = match timestamp {
        serde_json::Value::String(s) => s.parse::<i64>().ok()?,
        serde_json::Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    let utc = chrono::DateTime::from_timestamp(epoch, 0)?;
    Some(utc.with_timezone(&chrono::Local).naive_local())
}

/// Locate and parse the sidecar for `media_path` in one step.
pub fn sidecar_date(media_path: &Path) -> SidecarLookup {
    let Some((sidecar_path, provenance)) = find_sidecar(media_path) else {
        return SidecarLookup::None;
    };
    let Ok(bytes) = fs::read(&sidecar_path) else {
        return SidecarLookup::ParseFailed(sidecar_path);
    };
    match parse_sidecar(&bytes) {
        Some(datetime) => SidecarLookup::Date(datetime, provenance),
        None => SidecarLookup::ParseFailed(sidecar_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn expected_local(epoch: i64) -> NaiveDateTime {
        chrono::DateTime::from_timestamp(epoch, 0)
            .unwrap()
            .with_timezone(&chrono::Local)
            .naive_local()
    }

    #[test]
    fn test_parse_sidecar() {
        let dt = parse_sidecar(br#"{"photoTakenTime":{"timestamp":"1577836800"}}"#).unwrap();
        assert_eq!(dt, expected_local(1577836800));
    }

    #[test]
    fn test_parse_sidecar_integer_timestamp() {
        let dt = parse_sidecar(br#"{"photoTakenTime":{"timestamp":1600000000}}"#).unwrap();
        assert_eq!(dt, expected_local(1600000000));
    }

    #[test]
    fn test_parse_sidecar_epoch_zero_is_valid() {
        let dt = parse_sidecar(br#"{"photoTakenTime":{"timestamp":"0"}}"#).unwrap();
        assert_eq!(dt, expected_local(0));
    }

    #[test]
    fn test_parse_sidecar_rejects_garbage() {
        assert!(parse_sidecar(b"{not json").is_none());
        assert!(parse_sidecar(br#"{"photoTakenTime":{"timestamp":"soon"}}"#).is_none());
        assert!(parse_sidecar(br#"{"creationTime":{"timestamp":"1600000000"}}"#).is_none());
        assert!(parse_sidecar(br#"{}"#).is_none());
    }

    #[test]
    fn test_parse_sidecar_ignores_extra_fields() {
        let dt = parse_sidecar(
            br#"{"title":"x.jpg","geoData":{"latitude":0.0},
                 "photoTakenTime":{"timestamp":"1600000000","formatted":"whatever"}}"#,
        );
        assert!(dt.is_some());
    }

    #[test]
    fn test_full_name_beats_stem() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("IMG_1234.JPG");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("IMG_1234.JPG.json"), b"{}").unwrap();
        fs::write(dir.path().join("IMG_1234.json"), b"{}").unwrap();

        let (found, provenance) = find_sidecar(&media).unwrap();
        assert_eq!(found, dir.path().join("IMG_1234.JPG.json"));
        assert_eq!(provenance, Provenance::SidecarPrimary);
    }

    #[test]
    fn test_stem_sidecar_found() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("IMG_1234.JPG");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("IMG_1234.json"), b"{}").unwrap();

        let (found, provenance) = find_sidecar(&media).unwrap();
        assert_eq!(found, dir.path().join("IMG_1234.json"));
        assert_eq!(provenance, Provenance::SidecarPrimary);
    }

    #[test]
    fn test_supplemental_variants() {
        for variant in [
            "VID.mp4.supplemental-metadata.json",
            "VID.mp4.supplemental.json",
            "VID.mp4.supplemental-m.json",
            "VID.mp4.supplemental-.json",
        ] {
            let dir = tempdir().unwrap();
            let media = dir.path().join("VID.mp4");
            fs::write(&media, b"x").unwrap();
            fs::write(dir.path().join(variant), b"{}").unwrap();

            let (found, provenance) = find_sidecar(&media).unwrap();
            assert_eq!(found, dir.path().join(variant), "variant {variant}");
            assert_eq!(provenance, Provenance::SidecarSupplemental);
        }
    }

    #[test]
    fn test_glob_picks_smallest_match() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("pic.png");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("pic.png.suppb.json"), b"{}").unwrap();
        fs::write(dir.path().join("pic.png.suppa.json"), b"{}").unwrap();

        let (found, provenance) = find_sidecar(&media).unwrap();
        assert_eq!(found, dir.path().join("pic.png.suppa.json"));
        assert_eq!(provenance, Provenance::SidecarSupplemental);
    }

    #[test]
    fn test_no_sidecar() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("pic.png");
        fs::write(&media, b"x").unwrap();
        // A sidecar belonging to a different file does not count.
        fs::write(dir.path().join("other.png.json"), b"{}").unwrap();

        assert!(find_sidecar(&media).is_none());
        assert!(matches!(sidecar_date(&media), SidecarLookup::None));
    }

    #[test]
    fn test_sidecar_date_reports_parse_failure() {
        let dir = tempdir().unwrap();
        let media = dir.path().join("pic.png");
        fs::write(&media, b"x").unwrap();
        fs::write(dir.path().join("pic.png.json"), b"{\"oops\":1}").unwrap();

        assert!(matches!(
            sidecar_date(&media),
            SidecarLookup::ParseFailed(_)
        ));
    }
}
