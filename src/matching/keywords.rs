//! Keyword list files.
//!
//! One keyword per line, UTF-8. Blank lines are skipped, surrounding
//! whitespace is trimmed.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};

use crate::error::Error;

/// Read the keywords of one file.
pub fn load_keywords(path: &Path) -> Result<Vec<String>, Error> {
    let raw = std::fs::read(path).map_err(|source| Error::PatternLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let keywords: Vec<String> = String::from_utf8_lossy(&raw)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    debug!("loaded {} keywords from {:?}", keywords.len(), path);
    Ok(keywords)
}

/// Read the keywords of several files.
///
/// Missing or unreadable files are reported and skipped, which can leave
/// the returned list empty.
pub fn load_keyword_files(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|path| match load_keywords(path) {
            Ok(keywords) => Some(keywords),
            Err(e) => {
                warn!("{}, continuing without it", e);
                None
            }
        })
        .flatten()
        .collect()
}

/// Merge every `*.txt` keyword list of `src` into `dst`,
/// removing duplicates. Returns the number of written keywords.
pub fn merge_keyword_files(src: &Path, dst: &Path, sort: bool) -> Result<usize, Error> {
    let pattern = src.join("*.txt");
    let pattern = pattern.to_string_lossy();
    let mut paths = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    info!("merging {} keyword files from {:?}", paths.len(), src);

    let keywords = load_keyword_files(&paths).into_iter().unique();
    let keywords: Vec<String> = if sort {
        keywords.sorted().collect()
    } else {
        keywords.collect()
    };

    let mut out = BufWriter::new(File::create(dst)?);
    for keyword in &keywords {
        writeln!(out, "{}", keyword)?;
    }
    out.flush()?;
    info!("wrote {} keywords to {:?}", keywords.len(), dst);
    Ok(keywords.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, "广告\n\n  赌博 \r\nspam\n").unwrap();
        assert_eq!(load_keywords(&path).unwrap(), vec!["广告", "赌博", "spam"]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, b"ok\n\xff\xfe\n").unwrap();
        assert_eq!(load_keywords(&path).unwrap(), vec!["ok", "\u{fffd}\u{fffd}"]);
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, "词\n").unwrap();
        let missing = dir.path().join("missing.txt");

        assert!(matches!(
            load_keywords(&missing),
            Err(Error::PatternLoad { .. })
        ));
        assert_eq!(load_keyword_files(&[missing.clone(), present]), vec!["词"]);
        assert!(load_keyword_files(&[missing]).is_empty());
    }

    #[test]
    fn merge() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.txt"), "b\na\n").unwrap();
        std::fs::write(src.path().join("b.txt"), "c\na\n").unwrap();
        std::fs::write(src.path().join("ignored.csv"), "z\n").unwrap();

        let out = dst.path().join("merged.txt");
        assert_eq!(merge_keyword_files(src.path(), &out, true).unwrap(), 3);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a\nb\nc\n");

        assert_eq!(merge_keyword_files(src.path(), &out, false).unwrap(), 3);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "b\na\nc\n");
    }
}
