/*! Reference embedding index of a document directory.

Every readable document is embedded, in batches, and the embeddings are
saved as the [EmbeddingIndex] that near-duplicate scoring compares against.
Unreadable documents are logged and left out. An embedder failure stops the
build, since a partial index would silently let duplicates through.
!*/
use std::path::PathBuf;
use std::time::Duration;

use log::{error, info};

use super::Pipeline;
use crate::config::ClusteringConfig;
use crate::error::Error;
use crate::io::{DirSource, DocumentSource};
use crate::scorers::{Embedder, EmbeddingIndex, RemoteEmbedder};

/// Number of texts sent to the embedder at once.
pub const EMBEDDING_BATCH_SIZE: usize = 100;

/// Embed every document of `source`, `batch_size` texts at a time.
pub fn build_index<S, E>(source: &S, embedder: &E, batch_size: usize) -> Result<EmbeddingIndex, Error>
where
    S: DocumentSource,
    E: Embedder,
{
    let ids = source.ids()?;
    let mut index = EmbeddingIndex::default();
    for chunk in ids.chunks(batch_size.max(1)) {
        let texts: Vec<String> = chunk
            .iter()
            .filter_map(|id| match source.read(id) {
                Ok(doc) => Some(doc.content().to_string()),
                Err(e) => {
                    error!("{}: {}", id, e);
                    None
                }
            })
            .collect();
        if texts.is_empty() {
            continue;
        }
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        for embedding in embedder.embed(&texts)? {
            index.push(embedding);
        }
        info!("{}/{} documents embedded", index.len(), ids.len());
    }
    Ok(index)
}

pub struct CorpusIndex {
    src: PathBuf,
    dst: PathBuf,
    pattern: String,
    config: ClusteringConfig,
}

impl CorpusIndex {
    pub fn new(src: PathBuf, dst: PathBuf, pattern: String, config: ClusteringConfig) -> Self {
        Self {
            src,
            dst,
            pattern,
            config,
        }
    }
}

impl Pipeline<usize> for CorpusIndex {
    fn run(&self) -> Result<usize, Error> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Custom("no embedding endpoint configured".to_string()))?;
        let embedder = RemoteEmbedder::new(endpoint, Duration::from_secs(self.config.timeout_secs))?;
        let source = DirSource::new(&self.src, &self.pattern);

        let index = build_index(&source, &embedder, EMBEDDING_BATCH_SIZE)?;
        index.to_path(&self.dst)?;
        info!("{} reference embeddings saved to {:?}", index.len(), self.dst);
        Ok(index.len())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use super::*;

    /// Embeds a text as its char count and records batch sizes.
    #[derive(Default)]
    struct Lengths(Mutex<Vec<usize>>);

    impl Embedder for Lengths {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
            self.0.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.chars().count() as f32, 1.0]).collect())
        }
    }

    struct Down;

    impl Embedder for Down {
        fn embed(&self, _: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
            Err(Error::Scorer("embedding service down".to_string()))
        }
    }

    #[test]
    fn batches_and_skips_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in [("a.txt", "一"), ("b.txt", "一二"), ("c.txt", "一二三")] {
            fs::write(dir.path().join(name), text).unwrap();
        }
        fs::create_dir(dir.path().join("d.txt")).unwrap();

        let embedder = Lengths::default();
        let index = build_index(&DirSource::new(dir.path(), "*.txt"), &embedder, 2).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(*embedder.0.lock().unwrap(), vec![2, 1]);
        assert!((index.max_similarity(&[3.0, 1.0]).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn embedder_failure_stops_the_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let built = build_index(&DirSource::new(dir.path(), "*.txt"), &Down, 10);
        assert!(matches!(built, Err(Error::Scorer(_))));
    }

    #[test]
    fn endpoint_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = CorpusIndex::new(
            dir.path().to_path_buf(),
            dir.path().join("index.json"),
            "*.txt".to_string(),
            ClusteringConfig::default(),
        );
        assert!(matches!(pipeline.run(), Err(Error::Custom(_))));
    }
}
