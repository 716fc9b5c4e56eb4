//! Document enumeration and reading.
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, warn};

use crate::document::Document;
use crate::error::Error;

pub trait DocumentSource {
    /// Identifiers of the available documents, in a stable order.
    fn ids(&self) -> Result<Vec<String>, Error>;

    /// Read a document. Invalid UTF-8 is replaced, not rejected.
    fn read(&self, id: &str) -> Result<Document, Error>;
}

/// Files matching a glob pattern inside a directory.
///
/// Identifiers are paths relative to the directory.
/// Files ending in `.gz` are decompressed on read.
pub struct DirSource {
    root: PathBuf,
    pattern: String,
}

impl DirSource {
    pub fn new(root: &Path, pattern: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            pattern: pattern.to_string(),
        }
    }

    fn read_bytes(path: &Path) -> Result<Vec<u8>, Error> {
        let f = File::open(path)?;
        let mut buf = Vec::new();
        if path.extension().map_or(false, |ext| ext == "gz") {
            GzDecoder::new(BufReader::new(f)).read_to_end(&mut buf)?;
        } else {
            BufReader::new(f).read_to_end(&mut buf)?;
        }
        Ok(buf)
    }
}

impl DocumentSource for DirSource {
    fn ids(&self) -> Result<Vec<String>, Error> {
        let pattern = self.root.join(&self.pattern);
        let pattern = pattern
            .to_str()
            .ok_or_else(|| Error::Custom(format!("non UTF-8 path: {:?}", pattern)))?;

        let mut ids = Vec::new();
        for path in glob::glob(pattern)? {
            let path = path?;
            let id = path.strip_prefix(&self.root).unwrap_or(&path);
            ids.push(id.to_string_lossy().into_owned());
        }
        ids.sort();
        debug!("{} documents matching {:?}", ids.len(), pattern);
        Ok(ids)
    }

    fn read(&self, id: &str) -> Result<Document, Error> {
        let bytes = Self::read_bytes(&self.root.join(id))?;
        let content = match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => {
                warn!("{}: invalid UTF-8 replaced", id);
                s
            }
        };
        Ok(Document::new(id.to_string(), content))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    #[test]
    fn ids_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c.md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let src = DirSource::new(dir.path(), "*.txt");
        assert_eq!(src.ids().unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn nested_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("a.txt"), "x").unwrap();
        let src = DirSource::new(dir.path(), "**/*.txt");
        let ids = src.ids().unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(src.read(&ids[0]).unwrap().content(), "x");
    }

    #[test]
    fn lossy_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"ok \xff end").unwrap();
        let doc = DirSource::new(dir.path(), "*.txt").read("a.txt").unwrap();
        assert_eq!(doc.id(), "a.txt");
        assert_eq!(doc.content(), "ok \u{FFFD} end");
    }

    #[test]
    fn gzip_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut enc = GzEncoder::new(
            File::create(dir.path().join("a.txt.gz")).unwrap(),
            Compression::default(),
        );
        enc.write_all("压缩的文本".as_bytes()).unwrap();
        enc.finish().unwrap();

        let src = DirSource::new(dir.path(), "*.txt*");
        assert_eq!(src.ids().unwrap(), vec!["a.txt.gz"]);
        assert_eq!(src.read("a.txt.gz").unwrap().content(), "压缩的文本");
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = DirSource::new(dir.path(), "*.txt");
        assert!(matches!(src.read("nope.txt"), Err(Error::Io(_))));
    }

    #[test]
    fn directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("folder.txt")).unwrap();
        let src = DirSource::new(dir.path(), "*.txt");
        assert_eq!(src.ids().unwrap(), vec!["folder.txt"]);
        assert!(matches!(src.read("folder.txt"), Err(Error::Io(_))));
    }
}
