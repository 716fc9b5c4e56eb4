//! Result writing.
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde::Serialize;

use crate::error::Error;

/// Subdirectory of the destination holding per-document audit records.
pub const RESULTS_DIR: &str = "results";

pub trait DocumentSink {
    /// Reserve the outputs of a document before it is processed.
    ///
    /// Called once per document, in enumeration order, so that when two
    /// documents would write to the same place the later one fails.
    fn claim(&self, _id: &str) -> Result<(), Error> {
        Ok(())
    }

    /// Write the (possibly transformed) text of a document.
    fn write_text(&self, id: &str, text: &str) -> Result<(), Error>;

    /// Write the audit record of a document.
    fn write_record<T: Serialize>(&self, id: &str, record: &T) -> Result<(), Error>;

    /// Write run statistics under `name`.
    fn write_stats<T: Serialize>(&self, name: &str, stats: &T) -> Result<(), Error>;
}

/// Writes into a destination directory, mirroring the relative document ids.
///
/// - texts: `<dst>/<id>`
/// - records: `<dst>/results/<id>.json`
/// - stats: `<dst>/<name>`
///
/// A `.gz` suffix is dropped from the file name since texts are written uncompressed,
/// which makes `a.txt` and `a.txt.gz` claim the same outputs.
pub struct DirSink {
    dst: PathBuf,
    claimed: Mutex<HashMap<PathBuf, String>>,
}

impl DirSink {
    /// Creates `dst` if needed.
    pub fn new(dst: &Path) -> Result<Self, Error> {
        fs::create_dir_all(dst)?;
        Ok(Self {
            dst: dst.to_path_buf(),
            claimed: Mutex::new(HashMap::new()),
        })
    }

    /// Output path of a document, relative to the destination.
    fn relative(id: &str) -> Result<PathBuf, Error> {
        let path = Path::new(id);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::Custom(format!(
                "document id {:?} is not a relative path",
                id
            )));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .ok_or_else(|| Error::Custom(format!("no file name in document id {:?}", id)))?;
        let name = name.strip_suffix(".gz").unwrap_or(name.as_ref());
        if name.is_empty() {
            return Err(Error::Custom(format!("no file name in document id {:?}", id)));
        }
        Ok(path.with_file_name(name))
    }

    fn create(path: &Path) -> Result<File, Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(File::create(path)?)
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
        let mut w = BufWriter::new(Self::create(path)?);
        serde_json::to_writer_pretty(&mut w, value)?;
        w.flush()?;
        Ok(())
    }
}

impl DocumentSink for DirSink {
    fn claim(&self, id: &str) -> Result<(), Error> {
        let relative = Self::relative(id)?;
        let mut claimed = self
            .claimed
            .lock()
            .map_err(|_| Error::Custom("output registry poisoned".to_string()))?;
        if let Some(owner) = claimed.get(&relative) {
            if owner != id {
                return Err(Error::Custom(format!(
                    "{} would overwrite the outputs of {} ({:?})",
                    id, owner, relative
                )));
            }
            return Ok(());
        }
        claimed.insert(relative, id.to_string());
        Ok(())
    }

    fn write_text(&self, id: &str, text: &str) -> Result<(), Error> {
        let path = self.dst.join(Self::relative(id)?);
        debug!("writing {:?}", path);
        Self::create(&path)?.write_all(text.as_bytes())?;
        Ok(())
    }

    fn write_record<T: Serialize>(&self, id: &str, record: &T) -> Result<(), Error> {
        let relative = Self::relative(id)?;
        let mut name = relative.file_name().unwrap_or_default().to_os_string();
        name.push(".json");
        let path = self.dst.join(RESULTS_DIR).join(relative.with_file_name(name));
        Self::write_json(&path, record)
    }

    fn write_stats<T: Serialize>(&self, name: &str, stats: &T) -> Result<(), Error> {
        Self::write_json(&self.dst.join(name), stats)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn layout() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out");
        let sink = DirSink::new(&dst).unwrap();

        sink.write_text("sub/a.txt", "文本").unwrap();
        sink.write_record("sub/a.txt", &json!({"accepted": true})).unwrap();
        sink.write_stats("stats.json", &json!({"total": 1})).unwrap();

        assert_eq!(fs::read_to_string(dst.join("sub/a.txt")).unwrap(), "文本");
        let record: Value =
            serde_json::from_str(&fs::read_to_string(dst.join("results/sub/a.txt.json")).unwrap()).unwrap();
        assert_eq!(record["accepted"], Value::from(true));
        assert!(dst.join("stats.json").is_file());
    }

    #[test]
    fn gz_suffix_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path()).unwrap();
        sink.write_text("a.txt.gz", "x").unwrap();
        assert!(dir.path().join("a.txt").is_file());
    }

    #[test]
    fn records_are_pretty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path()).unwrap();
        sink.write_record("a.txt", &json!({"a": 1})).unwrap();
        let raw = fs::read_to_string(dir.path().join(RESULTS_DIR).join("a.txt.json")).unwrap();
        assert_eq!(raw, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn same_name_in_different_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path()).unwrap();
        for (id, text) in [("x/a.txt", "first"), ("y/a.txt", "second")] {
            sink.claim(id).unwrap();
            sink.write_text(id, text).unwrap();
            sink.write_record(id, &json!({ "text": text })).unwrap();
        }
        assert_eq!(fs::read_to_string(dir.path().join("x/a.txt")).unwrap(), "first");
        assert_eq!(fs::read_to_string(dir.path().join("y/a.txt")).unwrap(), "second");
        assert!(dir.path().join("results/x/a.txt.json").is_file());
        assert!(dir.path().join("results/y/a.txt.json").is_file());
    }

    #[test]
    fn conflicting_outputs_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path()).unwrap();
        sink.claim("a.txt").unwrap();
        // claiming twice is fine
        sink.claim("a.txt").unwrap();
        assert!(matches!(sink.claim("a.txt.gz"), Err(Error::Custom(_))));
        assert!(sink.claim("b.txt.gz").is_ok());
    }

    #[test]
    fn escaping_ids_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path()).unwrap();
        assert!(sink.claim("../a.txt").is_err());
        assert!(sink.claim("/tmp/a.txt").is_err());
        assert!(sink.write_text(".gz", "x").is_err());
    }

    #[test]
    fn results_dir_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path()).unwrap();
        sink.write_text("a.txt", "x").unwrap();
        assert!(!dir.path().join(RESULTS_DIR).exists());
        sink.write_record("a.txt", &json!({})).unwrap();
        assert!(dir.path().join(RESULTS_DIR).is_dir());
    }
}
