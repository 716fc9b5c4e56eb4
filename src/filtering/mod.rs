/*! Filtering utilities

Filters operate on whole documents:
- [rules::RuleScorer] runs the rule battery (length, ratios, duplication, spam densities),
- [crate::matching::FeatureWords] checks the density of feature words.

[chars] and [spam] hold the character classes and spam signatures shared
with the scorers.
!*/
pub mod chars;
pub mod rules;
pub mod spam;

pub use rules::{Check, CheckResult, RuleReport, RuleScorer};
