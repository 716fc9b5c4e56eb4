/*! Run configuration.

Every field has a default, so a configuration file only needs to name what it overrides:

```json
{
  "rules": { "minTextLength": 50 },
  "pipeline": { "qualityThreshold": 0.7, "enablePerplexity": true },
  "perplexity": { "endpoint": "http://localhost:8080/ppl" }
}
```
!*/
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rules: RuleConfig,
    pub features: FeatureConfig,
    pub pipeline: PipelineConfig,
    pub dedup: DedupConfig,
    pub perplexity: PerplexityConfig,
    pub clustering: ClusteringConfig,
    /// Worker threads for batch runs. Rayon picks when unset.
    pub workers: Option<usize>,
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        debug!("loading configuration from {:?}", path);
        let f = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(f))?;
        Ok(config)
    }
}

/// Thresholds of the rule battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleConfig {
    pub min_text_length: usize,
    pub min_avg_line_length: f64,
    pub min_chinese_ratio: f64,
    pub max_symbol_ratio: f64,
    pub max_internal_dup_ratio: f64,
    pub max_separator_ratio: f64,
    pub max_comma_ratio: f64,
    pub max_url_density: f64,
    pub max_emoji_ratio: f64,
    /// n-gram size (in chars) of the internal duplication check.
    pub ngram_size: usize,
    pub weights: RuleWeights,
    /// Multiplier applied to the rule score of obvious spam.
    pub spam_penalty: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            min_avg_line_length: 10.0,
            min_chinese_ratio: 0.4,
            max_symbol_ratio: 0.3,
            max_internal_dup_ratio: 0.5,
            max_separator_ratio: 0.005,
            max_comma_ratio: 0.05,
            max_url_density: 0.01,
            max_emoji_ratio: 0.02,
            ngram_size: 13,
            weights: RuleWeights::default(),
            spam_penalty: 0.3,
        }
    }
}

/// Weights of each rule check in the rule score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleWeights {
    pub length: f64,
    pub avg_line: f64,
    pub chinese: f64,
    pub symbol: f64,
    pub dup: f64,
    pub separator: f64,
    pub comma: f64,
    pub url: f64,
    pub emoji: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            length: 0.05,
            avg_line: 0.1,
            chinese: 0.15,
            symbol: 0.1,
            dup: 0.1,
            separator: 0.2,
            comma: 0.1,
            url: 0.1,
            emoji: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    Trie,
    AhoCorasick,
}

impl Default for MatchStrategy {
    fn default() -> Self {
        MatchStrategy::Trie
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureConfig {
    /// Keyword files, one keyword per line.
    pub keyword_paths: Vec<PathBuf>,
    pub max_feature_words_per_line: f64,
    pub strategy: MatchStrategy,
    pub replacement: char,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            keyword_paths: Vec::new(),
            max_feature_words_per_line: 0.2,
            strategy: MatchStrategy::default(),
            replacement: '*',
        }
    }
}

/// What a failing external scorer contributes to the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScorerErrorPolicy {
    /// Passes with a score of 0.5.
    Neutral,
    /// Left out of the composite, remaining weights re-normalise.
    Exclude,
}

impl Default for ScorerErrorPolicy {
    fn default() -> Self {
        ScorerErrorPolicy::Neutral
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentWeights {
    pub rule: f64,
    pub feature: f64,
    pub perplexity: f64,
    pub clustering: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            rule: 0.3,
            feature: 0.5,
            perplexity: 0.1,
            clustering: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub quality_threshold: f64,
    pub component_weights: ComponentWeights,
    pub enable_rules: bool,
    pub enable_features: bool,
    pub enable_perplexity: bool,
    pub enable_clustering: bool,
    pub on_scorer_error: ScorerErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 0.8,
            component_weights: ComponentWeights::default(),
            enable_rules: true,
            enable_features: true,
            enable_perplexity: false,
            enable_clustering: false,
            on_scorer_error: ScorerErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DedupConfig {
    pub remove_repeats: bool,
    pub min_repeat_length: usize,
    pub clean_text: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            remove_repeats: false,
            min_repeat_length: 21,
            clean_text: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerplexityConfig {
    pub endpoint: Option<String>,
    pub threshold: f64,
    pub max_perplexity: f64,
    /// Longer texts are reduced to representative sentences before scoring.
    pub max_chars: usize,
    pub timeout_secs: u64,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            threshold: 200.0,
            max_perplexity: 10_000.0,
            max_chars: 500,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusteringConfig {
    pub endpoint: Option<String>,
    /// JSON file holding reference embeddings.
    pub index_path: Option<PathBuf>,
    pub similarity_threshold: f64,
    pub timeout_secs: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index_path: None,
            similarity_threshold: 0.85,
            timeout_secs: 30,
        }
    }
}
