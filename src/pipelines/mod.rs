//! Pipelines.
//!
//! [QualityPipeline] evaluates a single document. The batch pipelines
//! ([QualityFilter], [Redaction], [Dedup], [CorpusIndex]) run over a whole
//! directory and implement the light [Pipeline] trait used by the binary.
pub mod batch;
mod dedup;
mod filter;
mod index;
#[allow(clippy::module_inception)]
mod pipeline;
mod quality;
mod redact;

pub use batch::{BatchProcessor, FilterStats, RewriteStats};
pub use dedup::Dedup;
pub use filter::{duplicate_scorer, feature_words, filter_transforms, perplexity_scorer, QualityFilter};
pub use index::{build_index, CorpusIndex, EMBEDDING_BATCH_SIZE};
pub use pipeline::Pipeline;
pub use quality::{composite_score, Component, QualityPipeline, QualityVerdict, NEUTRAL_SCORE};
pub use redact::Redaction;
