/*! Rule-based quality checks.

A fixed battery of independent checks, each measuring one ratio or length
of the text against a threshold:

| name             | measure                                   | default  |
|------------------|-------------------------------------------|----------|
| `length_check`   | chars                                     | >= 100   |
| `avg_line_check` | mean length of non blank lines            | >= 10    |
| `chinese_check`  | Han chars / chars                         | >= 0.4   |
| `symbol_check`   | non alphanumeric chars / chars            | <= 0.3   |
| `dup_check`      | 1 - distinct 13-grams / 13-grams          | <= 0.5   |
| `vbar_check`     | vertical bars / chars                     | <= 0.005 |
| `comma_check`    | `,` / chars                               | <= 0.05  |
| `url_check`      | URLs / chars                              | <= 0.01  |
| `emoji_check`    | pictographs / chars                       | <= 0.02  |

[RuleScorer::score] is 1.0 when every check passes. Otherwise it is the
weighted mean of per-check credits, where a failing check is credited in
proportion to its distance from the threshold, and obvious spam gets an
extra penalty.
!*/
use std::collections::{BTreeMap, HashSet};
use std::hash::BuildHasherDefault;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;
use twox_hash::XxHash64;

use super::chars::{is_cjk, is_pictograph, is_symbol};
use super::spam::{char_density, density, has_seo_signature};
use crate::config::RuleConfig;

lazy_static! {
    static ref URL: Regex = Regex::new(
        r"https?://\S+|www\.\S+|[a-zA-Z0-9][a-zA-Z0-9-]{1,61}[a-zA-Z0-9]\.[a-zA-Z]{2,}"
    )
    .expect("invalid url pattern");
}

const SEPARATOR: char = '|';
const COMMA: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Check {
    Length,
    AvgLine,
    Chinese,
    Symbol,
    Dup,
    Separator,
    Comma,
    Url,
    Emoji,
}

impl Check {
    pub const ALL: [Check; 9] = [
        Check::Length,
        Check::AvgLine,
        Check::Chinese,
        Check::Symbol,
        Check::Dup,
        Check::Separator,
        Check::Comma,
        Check::Url,
        Check::Emoji,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Check::Length => "length_check",
            Check::AvgLine => "avg_line_check",
            Check::Chinese => "chinese_check",
            Check::Symbol => "symbol_check",
            Check::Dup => "dup_check",
            Check::Separator => "vbar_check",
            Check::Comma => "comma_check",
            Check::Url => "url_check",
            Check::Emoji => "emoji_check",
        }
    }

    /// Lower bounded checks. The others are upper bounded.
    fn is_minimum(&self) -> bool {
        matches!(self, Check::Length | Check::AvgLine | Check::Chinese)
    }

    /// Highest credit of a failing check.
    fn max_credit(&self) -> f64 {
        match self {
            Check::Separator => 0.5,
            Check::Url => 0.3,
            _ => 1.0,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Check::Length => "text length",
            Check::AvgLine => "average line length",
            Check::Chinese => "chinese char ratio",
            Check::Symbol => "symbol ratio",
            Check::Dup => "internal duplication ratio",
            Check::Separator => "'|' ratio",
            Check::Comma => "',' ratio",
            Check::Url => "url density",
            Check::Emoji => "emoji ratio",
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub passed: bool,
    pub measured: f64,
    pub threshold: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Outcome of the whole battery, keyed by check name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub passed: bool,
    pub checks: BTreeMap<&'static str, CheckResult>,
}

impl RuleReport {
    pub fn get(&self, check: Check) -> Option<&CheckResult> {
        self.checks.get(check.name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleScorer {
    config: RuleConfig,
}

impl RuleScorer {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    fn threshold(&self, check: Check) -> f64 {
        let c = &self.config;
        match check {
            Check::Length => c.min_text_length as f64,
            Check::AvgLine => c.min_avg_line_length,
            Check::Chinese => c.min_chinese_ratio,
            Check::Symbol => c.max_symbol_ratio,
            Check::Dup => c.max_internal_dup_ratio,
            Check::Separator => c.max_separator_ratio,
            Check::Comma => c.max_comma_ratio,
            Check::Url => c.max_url_density,
            Check::Emoji => c.max_emoji_ratio,
        }
    }

    fn weight(&self, check: Check) -> f64 {
        let w = &self.config.weights;
        match check {
            Check::Length => w.length,
            Check::AvgLine => w.avg_line,
            Check::Chinese => w.chinese,
            Check::Symbol => w.symbol,
            Check::Dup => w.dup,
            Check::Separator => w.separator,
            Check::Comma => w.comma,
            Check::Url => w.url,
            Check::Emoji => w.emoji,
        }
    }

    fn measure(&self, check: Check, text: &str) -> f64 {
        match check {
            Check::Length => text.chars().count() as f64,
            Check::AvgLine => avg_line_length(text),
            Check::Chinese => density(text, is_cjk),
            Check::Symbol => density(text, is_symbol),
            Check::Dup => duplication_ratio(text, self.config.ngram_size),
            Check::Separator => char_density(text, SEPARATOR),
            Check::Comma => char_density(text, COMMA),
            Check::Url => url_density(text),
            Check::Emoji => density(text, is_pictograph),
        }
    }

    /// Run a single check.
    pub fn check(&self, check: Check, text: &str) -> CheckResult {
        let measured = self.measure(check, text);
        let threshold = self.threshold(check);
        let passed = if check.is_minimum() {
            measured >= threshold
        } else {
            measured <= threshold
        };
        let reason = match (passed, check.is_minimum()) {
            (true, _) => String::new(),
            (false, true) => format!(
                "{} ({:.4}) is below the minimum ({})",
                check.label(),
                measured,
                threshold
            ),
            (false, false) => format!(
                "{} ({:.4}) is above the maximum ({})",
                check.label(),
                measured,
                threshold
            ),
        };
        CheckResult {
            passed,
            measured,
            threshold,
            reason,
        }
    }

    /// Run every check. Passes when all checks pass.
    pub fn filter(&self, text: &str) -> RuleReport {
        let checks: BTreeMap<&'static str, CheckResult> = Check::ALL
            .iter()
            .map(|check| (check.name(), self.check(*check, text)))
            .collect();
        RuleReport {
            passed: checks.values().all(|c| c.passed),
            checks,
        }
    }

    /// Composite rule score in `[0, 1]`.
    pub fn score(&self, text: &str) -> f64 {
        self.score_report(text, &self.filter(text))
    }

    /// Score a text from an already computed report.
    pub fn score_report(&self, text: &str, report: &RuleReport) -> f64 {
        if report.passed {
            return 1.0;
        }

        let (weighted, total_weight) = Check::ALL.iter().fold((0.0, 0.0), |(sum, total), check| {
            let credit = report
                .get(*check)
                .map(|result| credit(*check, result))
                .unwrap_or(1.0);
            let weight = self.weight(*check);
            (sum + credit * weight, total + weight)
        });
        if total_weight <= 0.0 {
            return 0.0;
        }
        let mut score = weighted / total_weight;

        if self.is_obvious_spam(text) {
            debug!("obvious spam, rule score {:.3} penalized", score);
            score *= self.config.spam_penalty;
        }
        score.clamp(0.0, 1.0)
    }

    /// Separator walls, link farms and SEO phrasing.
    pub fn is_obvious_spam(&self, text: &str) -> bool {
        char_density(text, SEPARATOR) > self.config.max_separator_ratio * 2.0
            || url_density(text) > self.config.max_url_density * 3.0
            || has_seo_signature(text)
    }
}

/// Partial credit of a check, 1.0 when it passed.
fn credit(check: Check, result: &CheckResult) -> f64 {
    if result.passed {
        return 1.0;
    }
    let ratio = if check.is_minimum() {
        if result.threshold > 0.0 {
            result.measured / result.threshold
        } else {
            1.0
        }
    } else if result.measured > 0.0 {
        result.threshold / result.measured
    } else {
        1.0
    };
    ratio.clamp(0.0, check.max_credit())
}

fn avg_line_length(text: &str) -> f64 {
    let (count, total) = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .fold((0usize, 0usize), |(count, total), line| {
            (count + 1, total + line.chars().count())
        });
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Share of repeated n-grams. Texts shorter than `n` have none.
fn duplication_ratio(text: &str, n: usize) -> f64 {
    let chars: Vec<char> = text.chars().collect();
    if n == 0 || chars.len() < n {
        return 0.0;
    }
    let ngrams = chars.len() - n + 1;
    let distinct: HashSet<&[char], BuildHasherDefault<XxHash64>> = chars.windows(n).collect();
    1.0 - distinct.len() as f64 / ngrams as f64
}

fn url_density(text: &str) -> f64 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0.0;
    }
    URL.find_iter(text).count() as f64 / chars as f64
}
