/*! Quality filtering of a document directory.

Builds every component enabled in [Config] and runs a [BatchProcessor] in
filter mode. External scorers are only built when enabled *and* configured
with an endpoint; otherwise the stage is left out with a warning.
!*/
use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use super::batch::{BatchProcessor, FilterStats, Transforms};
use super::{Pipeline, QualityPipeline};
use crate::config::{Config, DedupConfig};
use crate::error::Error;
use crate::filtering::RuleScorer;
use crate::io::{DirSink, DirSource};
use crate::matching::{load_keyword_files, FeatureWords, Matcher};
use crate::scorers::{
    DuplicateScorer, EmbeddingIndex, PerplexityScorer, RemoteEmbedder, RemotePerplexity,
};
use crate::transformers::{CleanText, RemoveRepeats};

pub struct QualityFilter {
    src: PathBuf,
    dst: PathBuf,
    pattern: String,
    config: Config,
}

impl QualityFilter {
    pub fn new(src: PathBuf, dst: PathBuf, pattern: String, config: Config) -> Self {
        Self {
            src,
            dst,
            pattern,
            config,
        }
    }
}

/// Transforms run before scoring.
pub fn filter_transforms(config: &DedupConfig) -> Transforms {
    let mut transforms: Transforms = Vec::new();
    if config.clean_text {
        transforms.push(Box::new(CleanText));
    }
    if config.remove_repeats {
        transforms.push(Box::new(RemoveRepeats::new(config.min_repeat_length)));
    }
    transforms
}

/// Feature words from the configured keyword files.
pub fn feature_words(config: &Config) -> FeatureWords {
    let features = &config.features;
    let keywords = load_keyword_files(&features.keyword_paths);
    let matcher = Matcher::with_keywords(features.strategy, keywords);
    info!("{} feature words loaded", matcher.len());
    FeatureWords::new(matcher, features.max_feature_words_per_line)
}

pub fn perplexity_scorer(
    config: &Config,
) -> Result<Option<PerplexityScorer<RemotePerplexity>>, Error> {
    if !config.pipeline.enable_perplexity {
        return Ok(None);
    }
    let ppl = &config.perplexity;
    match &ppl.endpoint {
        Some(endpoint) => {
            let model = RemotePerplexity::new(endpoint, Duration::from_secs(ppl.timeout_secs))?;
            info!("perplexity model at {}", endpoint);
            Ok(Some(PerplexityScorer::new(model, ppl)))
        }
        None => {
            warn!("perplexity enabled without an endpoint, stage disabled");
            Ok(None)
        }
    }
}

pub fn duplicate_scorer(config: &Config) -> Result<Option<DuplicateScorer<RemoteEmbedder>>, Error> {
    if !config.pipeline.enable_clustering {
        return Ok(None);
    }
    let clustering = &config.clustering;
    let endpoint = match &clustering.endpoint {
        Some(endpoint) => endpoint,
        None => {
            warn!("clustering enabled without an endpoint, stage disabled");
            return Ok(None);
        }
    };
    let embedder = RemoteEmbedder::new(endpoint, Duration::from_secs(clustering.timeout_secs))?;
    let index = match &clustering.index_path {
        Some(path) => EmbeddingIndex::from_path(path)?,
        None => {
            warn!("no reference embedding index, no document will be a duplicate");
            EmbeddingIndex::default()
        }
    };
    Ok(Some(DuplicateScorer::new(
        embedder,
        index,
        clustering.similarity_threshold,
    )))
}

impl Pipeline<FilterStats> for QualityFilter {
    fn run(&self) -> Result<FilterStats, Error> {
        let config = &self.config;
        let processor = BatchProcessor::new(config.workers)?;
        let source = DirSource::new(&self.src, &self.pattern);
        let sink = DirSink::new(&self.dst)?;

        let perplexity = perplexity_scorer(config)?;
        let clustering = duplicate_scorer(config)?;

        let mut pipeline = QualityPipeline::new(&config.pipeline);
        if config.pipeline.enable_rules {
            pipeline = pipeline.with_rules(RuleScorer::new(config.rules.clone()));
        }
        if config.pipeline.enable_features {
            pipeline = pipeline.with_features(feature_words(config));
        }
        if let Some(scorer) = &perplexity {
            pipeline = pipeline.with_perplexity(scorer);
        }
        if let Some(scorer) = &clustering {
            pipeline = pipeline.with_clustering(scorer);
        }

        info!(
            "filtering {:?} into {:?} with {} workers",
            self.src,
            self.dst,
            processor.workers()
        );
        processor.filter(
            &source,
            &sink,
            &filter_transforms(&config.dedup),
            &pipeline,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_follow_config() {
        assert!(filter_transforms(&DedupConfig::default()).is_empty());
        let config = DedupConfig {
            remove_repeats: true,
            clean_text: true,
            ..Default::default()
        };
        assert_eq!(filter_transforms(&config).len(), 2);
    }

    #[test]
    fn external_stages_need_an_endpoint() {
        let mut config = Config::default();
        config.pipeline.enable_perplexity = true;
        config.pipeline.enable_clustering = true;
        assert!(perplexity_scorer(&config).unwrap().is_none());
        assert!(duplicate_scorer(&config).unwrap().is_none());

        config.perplexity.endpoint = Some("http://127.0.0.1:1/ppl".to_string());
        config.clustering.endpoint = Some("http://127.0.0.1:1/embed".to_string());
        assert!(perplexity_scorer(&config).unwrap().is_some());
        assert!(duplicate_scorer(&config).unwrap().is_some());
    }

    #[test]
    fn disabled_stages_are_not_built() {
        let mut config = Config::default();
        config.perplexity.endpoint = Some("http://127.0.0.1:1/ppl".to_string());
        assert!(perplexity_scorer(&config).unwrap().is_none());
    }

    #[test]
    fn bad_endpoint() {
        let mut config = Config::default();
        config.pipeline.enable_perplexity = true;
        config.perplexity.endpoint = Some("nope".to_string());
        assert!(matches!(perplexity_scorer(&config), Err(Error::Url(_))));
    }
}
