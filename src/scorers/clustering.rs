/*! Near-duplicate scoring with text embeddings.

A document is compared to a reference [EmbeddingIndex] (embeddings of
documents already in the corpus). Its duplicate ratio is its highest cosine
similarity to the index; above the similarity threshold it is a duplicate.
!*/
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Assessment, Details, Scorer};
use crate::error::Error;

/// Computes one embedding per text.
pub trait Embedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error>;
}

/// Cosine similarity, `None` for mismatched dimensions or null vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
        let (x, y) = (f64::from(*x), f64::from(*y));
        (dot + x * y, na + x * x, nb + y * y)
    });
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Reference embeddings, stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        Self { embeddings }
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)?;
        let index: Self = serde_json::from_reader(BufReader::new(f))?;
        info!("loaded {} reference embeddings from {:?}", index.len(), path);
        Ok(index)
    }

    pub fn to_path(&self, path: &Path) -> Result<(), Error> {
        let f = File::create(path)?;
        serde_json::to_writer(BufWriter::new(f), self)?;
        Ok(())
    }

    pub fn push(&mut self, embedding: Vec<f32>) {
        self.embeddings.push(embedding);
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Highest similarity of `embedding` to the index, 0 for an empty index.
    pub fn max_similarity(&self, embedding: &[f32]) -> Result<f64, Error> {
        let mut best: Option<f64> = None;
        for reference in &self.embeddings {
            if reference.len() != embedding.len() {
                return Err(Error::Scorer(format!(
                    "embedding dimension mismatch: {} vs {}",
                    embedding.len(),
                    reference.len()
                )));
            }
            if let Some(sim) = cosine_similarity(reference, embedding) {
                best = Some(best.map_or(sim, |b| b.max(sim)));
            }
        }
        Ok(best.unwrap_or(0.0))
    }
}

/// Embedding similarity based [Scorer].
pub struct DuplicateScorer<E> {
    embedder: E,
    index: EmbeddingIndex,
    threshold: f64,
}

impl<E: Embedder> DuplicateScorer<E> {
    pub fn new(embedder: E, index: EmbeddingIndex, threshold: f64) -> Self {
        Self {
            embedder,
            index,
            threshold,
        }
    }

    /// Highest similarity of `text` to the reference documents.
    pub fn duplicate_ratio(&self, text: &str) -> Result<f64, Error> {
        if self.index.is_empty() {
            return Ok(0.0);
        }
        let embedding = self
            .embedder
            .embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Scorer("embedder returned no embedding".to_string()))?;
        let ratio = self.index.max_similarity(&embedding)?;
        debug!("duplicate ratio {:.3}", ratio);
        Ok(ratio)
    }

    fn to_score(&self, ratio: f64) -> f64 {
        let t = self.threshold;
        if ratio >= t {
            if t >= 1.0 {
                return 0.0;
            }
            (0.2 * (1.0 - (ratio - t) / (1.0 - t))).max(0.0)
        } else if t <= 0.0 {
            1.0
        } else {
            (0.8 + 0.2 * (1.0 - ratio / t)).min(1.0)
        }
    }

    fn details(&self, ratio: f64) -> Details {
        let mut details = Details::new();
        details.insert("duplicateRatio".to_string(), Value::from(ratio));
        details.insert("threshold".to_string(), Value::from(self.threshold));
        details.insert("isDuplicate".to_string(), Value::from(ratio >= self.threshold));
        details
    }
}

impl<E: Embedder> Scorer for DuplicateScorer<E> {
    fn check(&self, text: &str) -> Result<(bool, Details), Error> {
        let ratio = self.duplicate_ratio(text)?;
        Ok((ratio < self.threshold, self.details(ratio)))
    }

    fn score(&self, text: &str) -> Result<f64, Error> {
        Ok(self.to_score(self.duplicate_ratio(text)?))
    }

    fn evaluate(&self, text: &str) -> Result<Assessment, Error> {
        let ratio = self.duplicate_ratio(text)?;
        Ok(Assessment {
            passed: ratio < self.threshold,
            score: self.to_score(ratio),
            details: self.details(ratio),
        })
    }
}
