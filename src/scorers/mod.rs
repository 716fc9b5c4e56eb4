/*! External scorers.

Model-backed quality signals are consumed through the [Scorer] trait and
injected into the [crate::pipelines::QualityPipeline]. Models themselves sit
behind a second seam ([PerplexityModel], [Embedder]) so that the mapping from
model output to a score can be tested without a model.

Scorers are built once by the caller and shared by reference across workers.
!*/
mod clustering;
mod perplexity;
mod remote;

pub use clustering::{cosine_similarity, DuplicateScorer, Embedder, EmbeddingIndex};
pub use perplexity::{PerplexityModel, PerplexityScorer};
pub use remote::{RemoteEmbedder, RemotePerplexity};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// Free-form scorer details, kept in the audit record.
pub type Details = Map<String, Value>;

/// Outcome of a scorer on one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub passed: bool,
    pub score: f64,
    pub details: Details,
}

pub trait Scorer {
    /// Pass/fail decision with details.
    fn check(&self, text: &str) -> Result<(bool, Details), Error>;

    /// Quality score in `[0, 1]`, higher is better.
    fn score(&self, text: &str) -> Result<f64, Error>;

    /// Both [Scorer::check] and [Scorer::score].
    ///
    /// Implementors backed by an expensive model should override it
    /// to query the model once.
    fn evaluate(&self, text: &str) -> Result<Assessment, Error> {
        let (passed, details) = self.check(text)?;
        let score = self.score(text)?;
        Ok(Assessment {
            passed,
            score: score.clamp(0.0, 1.0),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Scorer for Fixed {
        fn check(&self, text: &str) -> Result<(bool, Details), Error> {
            let mut details = Details::new();
            details.insert("len".to_string(), Value::from(text.len()));
            Ok((true, details))
        }

        fn score(&self, _: &str) -> Result<f64, Error> {
            Ok(1.5)
        }
    }

    #[test]
    fn default_evaluate_clamps() {
        let a = Fixed.evaluate("abc").unwrap();
        assert!(a.passed);
        assert_eq!(a.score, 1.0);
        assert_eq!(a.details["len"], Value::from(3));
    }
}
