use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Seam over the external metadata tool. Every tag read and write in the
/// pipeline goes through this trait, so tests can substitute an in-memory
/// implementation and a different tool can be dropped in without touching
/// the resolver, writer or mover.
pub trait MetadataTool: Sync {
    /// Read a single tag. Returns an empty string when the tag is absent or
    /// the file is unreadable; tool errors are logged, never fatal.
    fn read_tag(&self, path: &Path, tag: &str) -> String;

    /// Batched read. Returns one entry per requested tag, empty when absent.
    fn read_tags(&self, path: &Path, tags: &[&str]) -> BTreeMap<String, String>;

    /// Write the given tag-value pairs, overwriting the original file in
    /// place. Returns true iff the tool exited cleanly.
    fn write_tags(&self, path: &Path, tags: &[(String, String)]) -> bool;
}

/// exiftool reports absent tags as missing JSON keys and prints dashes or
/// warning text in odd cases; a usable date value always leads with a digit.
pub fn is_datelike(value: &str) -> bool {
    value.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// `exiftool` subprocess wrapper. One short-lived process per operation, no
/// shared session state.
pub struct ExifTool {
    binary: String,
}

impl ExifTool {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl MetadataTool for ExifTool {
    fn read_tag(&self, path: &Path, tag: &str) -> String {
        self.read_tags(path, &[tag]).remove(tag).unwrap_or_default()
    }

    fn read_tags(&self, path: &Path, tags: &[&str]) -> BTreeMap<String, String> {
        let mut result: BTreeMap<String, String> = tags
            .iter()
            .map(|t| (t.to_string(), String::new()))
            .collect();

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-j");
        for tag in tags {
            cmd.arg(format!("-{tag}"));
        }
        cmd.arg(path);

        let output = match cmd.output() {
            Ok(o) => o,
            Err(e) => {
                log::warn!("{}: failed to run {}: {}", path.display(), self.binary, e);
                return result;
            }
        };
        if !output.status.success() {
            log::warn!(
                "{}: {} exited with {}",
                path.display(),
                self.binary,
                output.status
            );
            return result;
        }

        // exiftool emits a one-element JSON array per file
        let parsed: serde_json::Value = match serde_json::from_slice(&output.stdout) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("{}: unparseable {} output: {}", path.display(), self.binary, e);
                return result;
            }
        };
        let Some(obj) = parsed
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_object())
        else {
            return result;
        };

        for tag in tags {
            // Requested names may carry a group prefix (XMP:DateCreated); the
            // JSON keys do not.
            let bare = tag.rsplit(':').next().unwrap_or(tag);
            if let Some(value) = obj.get(*tag).or_else(|| obj.get(bare)) {
                if let Some(s) = value_to_string(value) {
                    result.insert(tag.to_string(), s);
                }
            }
        }
        result
    }

    fn write_tags(&self, path: &Path, tags: &[(String, String)]) -> bool {
        let mut cmd = Command::new(&self.binary);
        for (tag, value) in tags {
            cmd.arg(format!("-{tag}={value}"));
        }
        cmd.arg("-overwrite_original").arg(path);

        match cmd.output() {
            Ok(o) if o.status.success() => true,
            Ok(o) => {
                log::warn!(
                    "{}: {} write failed: {}",
                    path.display(),
                    self.binary,
                    String::from_utf8_lossy(&o.stderr).trim()
                );
                false
            }
            Err(e) => {
                log::warn!("{}: failed to run {}: {}", path.display(), self.binary, e);
                false
            }
        }
    }
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::MetadataTool;
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// In-memory stand-in for the external tool. Tags are stored by bare
    /// name (group prefix stripped), matching exiftool's behaviour of
    /// resolving an unprefixed read against any group.
    #[derive(Default)]
    pub struct MockTool {
        tags: Mutex<HashMap<PathBuf, BTreeMap<String, String>>>,
        writes: Mutex<Vec<(PathBuf, Vec<(String, String)>)>>,
        failing_tags: Mutex<HashSet<String>>,
    }

    fn bare(tag: &str) -> String {
        tag.rsplit(':').next().unwrap_or(tag).to_string()
    }

    impl MockTool {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populate a tag, as if the file already carried it.
        pub fn preset(&self, path: &Path, tag: &str, value: &str) {
            self.tags
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_default()
                .insert(bare(tag), value.to_string());
        }

        /// Make any write containing `tag` fail.
        pub fn fail_writes_containing(&self, tag: &str) {
            self.failing_tags.lock().unwrap().insert(bare(tag));
        }

        pub fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }

        pub fn tag(&self, path: &Path, tag: &str) -> String {
            self.tags
                .lock()
                .unwrap()
                .get(path)
                .and_then(|m| m.get(&bare(tag)))
                .cloned()
                .unwrap_or_default()
        }
    }

    impl MetadataTool for MockTool {
        fn read_tag(&self, path: &Path, tag: &str) -> String {
            self.tag(path, tag)
        }

        fn read_tags(&self, path: &Path, tags: &[&str]) -> BTreeMap<String, String> {
            tags.iter()
                .map(|t| (t.to_string(), self.tag(path, t)))
                .collect()
        }

        fn write_tags(&self, path: &Path, tags: &[(String, String)]) -> bool {
            self.writes
                .lock()
                .unwrap()
                .push((path.to_path_buf(), tags.to_vec()));

            let failing = self.failing_tags.lock().unwrap();
            if tags.iter().any(|(t, _)| failing.contains(&bare(t))) {
                return false;
            }
            drop(failing);

            let mut store = self.tags.lock().unwrap();
            let entry = store.entry(path.to_path_buf()).or_default();
            for (tag, value) in tags {
                entry.insert(bare(tag), value.clone());
            }
            true
        }
    }

    #[test]
    fn test_mock_group_insensitive() {
        let tool = MockTool::new();
        let path = Path::new("/x/a.jpg");
        assert!(tool
            .write_tags(path, &[("EXIF:DateTimeOriginal".into(), "2020:01:01 00:00:00".into())]));
        assert_eq!(tool.read_tag(path, "DateTimeOriginal"), "2020:01:01 00:00:00");
        assert_eq!(tool.read_tag(path, "CreateDate"), "");
    }
}
