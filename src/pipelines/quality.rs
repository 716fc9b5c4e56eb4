/*! Document quality evaluation.

A document goes through up to four components, in order:

1. rules ([RuleScorer]),
1. feature words ([FeatureWords]),
1. perplexity (external [Scorer]),
1. near duplicates (external [Scorer]).

Each present component yields a score in `[0, 1]`. The composite score is the
weighted mean of the present scores, so that leaving a component out
re-normalizes the remaining weights. A document is accepted when the
composite reaches the quality threshold.

External scorers never abort an evaluation: their errors are logged and,
depending on [ScorerErrorPolicy], replaced by a neutral score or left out.
!*/
use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{ComponentWeights, PipelineConfig, ScorerErrorPolicy};
use crate::filtering::RuleScorer;
use crate::matching::FeatureWords;
use crate::scorers::Scorer;

/// Score given to a failing external scorer under [ScorerErrorPolicy::Neutral].
pub const NEUTRAL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Component {
    Rule,
    Feature,
    Perplexity,
    Clustering,
}

impl Component {
    pub fn name(&self) -> &'static str {
        match self {
            Component::Rule => "rule",
            Component::Feature => "feature",
            Component::Perplexity => "perplexity",
            Component::Clustering => "clustering",
        }
    }

    pub fn weight(&self, weights: &ComponentWeights) -> f64 {
        match self {
            Component::Rule => weights.rule,
            Component::Feature => weights.feature,
            Component::Perplexity => weights.perplexity,
            Component::Clustering => weights.clustering,
        }
    }
}

/// Outcome of the evaluation of one document. Serialized as its audit record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityVerdict {
    pub composite_score: f64,
    pub accepted: bool,
    pub component_scores: BTreeMap<&'static str, f64>,
    pub reasons: BTreeMap<&'static str, Value>,
}

/// Weighted mean of the present component scores. No component scores 0.
pub fn composite_score(scores: &BTreeMap<Component, f64>, weights: &ComponentWeights) -> f64 {
    let (sum, total) = scores
        .iter()
        .fold((0.0, 0.0), |(sum, total), (component, score)| {
            let weight = component.weight(weights);
            (sum + score * weight, total + weight)
        });
    if total > 0.0 {
        sum / total
    } else {
        0.0
    }
}

pub struct QualityPipeline<'a> {
    rules: Option<RuleScorer>,
    features: Option<FeatureWords>,
    perplexity: Option<&'a (dyn Scorer + Sync)>,
    clustering: Option<&'a (dyn Scorer + Sync)>,
    weights: ComponentWeights,
    threshold: f64,
    on_error: ScorerErrorPolicy,
}

impl<'a> QualityPipeline<'a> {
    /// Pipeline without components. Use the `with_*` methods to add them.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            rules: None,
            features: None,
            perplexity: None,
            clustering: None,
            weights: config.component_weights.clone(),
            threshold: config.quality_threshold,
            on_error: config.on_scorer_error,
        }
    }

    pub fn with_rules(mut self, rules: RuleScorer) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_features(mut self, features: FeatureWords) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_perplexity(mut self, scorer: &'a (dyn Scorer + Sync)) -> Self {
        self.perplexity = Some(scorer);
        self
    }

    pub fn with_clustering(mut self, scorer: &'a (dyn Scorer + Sync)) -> Self {
        self.clustering = Some(scorer);
        self
    }

    pub fn evaluate(&self, text: &str) -> QualityVerdict {
        let mut scores = BTreeMap::new();
        let mut reasons = BTreeMap::new();

        if let Some(rules) = &self.rules {
            let report = rules.filter(text);
            scores.insert(Component::Rule, rules.score_report(text, &report));
            reasons.insert(
                Component::Rule,
                json!({ "passed": report.passed, "checks": report.checks }),
            );
        }

        if let Some(features) = &self.features {
            let (passed, report) = features.check(text);
            scores.insert(Component::Feature, features.score_report(text, &report));
            reasons.insert(
                Component::Feature,
                json!({ "passed": passed, "details": report }),
            );
        }

        let externals = [
            (Component::Perplexity, self.perplexity),
            (Component::Clustering, self.clustering),
        ];
        for (component, scorer) in externals {
            let scorer = match scorer {
                Some(scorer) => scorer,
                None => continue,
            };
            match scorer.evaluate(text) {
                Ok(assessment) => {
                    scores.insert(component, assessment.score);
                    reasons.insert(
                        component,
                        json!({ "passed": assessment.passed, "details": assessment.details }),
                    );
                }
                Err(e) => {
                    warn!("{} scorer failed: {}", component.name(), e);
                    match self.on_error {
                        ScorerErrorPolicy::Neutral => {
                            scores.insert(component, NEUTRAL_SCORE);
                            reasons.insert(
                                component,
                                json!({ "passed": true, "error": e.to_string() }),
                            );
                        }
                        ScorerErrorPolicy::Exclude => {
                            reasons.insert(
                                component,
                                json!({ "passed": true, "error": e.to_string(), "excluded": true }),
                            );
                        }
                    }
                }
            }
        }

        let composite = composite_score(&scores, &self.weights);
        let accepted = composite >= self.threshold;
        debug!("composite {:.3}, accepted: {}", composite, accepted);

        QualityVerdict {
            composite_score: composite,
            accepted,
            component_scores: scores.into_iter().map(|(c, s)| (c.name(), s)).collect(),
            reasons: reasons.into_iter().map(|(c, r)| (c.name(), r)).collect(),
        }
    }
}
