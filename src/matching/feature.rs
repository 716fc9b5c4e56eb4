/*! Feature word detection.

Feature words are promotional or sensitive keywords. A document is checked
for the average number of feature words per line, and scored from the
share of distinct feature words in its text.
!*/
use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::RegexSet;
use serde::Serialize;

use super::{fold, Matcher, PatternMatcher};

/// Keywords counted three times, whether in the keyword set or not.
const HIGH_WEIGHT_KEYWORDS: &[&str] = &[
    "色情", "赌博", "特价", "促销", "优惠", "免费", "限时", "加qq", "加微信", "http://", "www.",
    "点击", "链接", "联系电话", "约炮", "一夜情",
];

/// Frequent in regular text, not counted.
const COMMON_WORDS: &[&str] = &["系统", "手机", "电话", "网络", "联系", "人才", "招聘"];

/// Lines shorter than this (trimmed) do not count as content lines.
const MIN_LINE_CHARS: usize = 5;

lazy_static! {
    /// Text that mentions spam topics to reject them ("禁止赌博").
    static ref NEGATIVE_CONTEXT: RegexSet = RegexSet::new([
        r"不包含.*?(色情|赌博|广告)",
        r"没有.*?(色情|赌博|广告)",
        r"禁止.*?(色情|赌博|广告)",
        r"反对.*?(色情|赌博|广告)",
        r"拒绝.*?(色情|赌博|广告)",
    ])
    .expect("invalid negative context pattern");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureReport {
    pub feature_count: usize,
    pub feature_words: Vec<String>,
    pub avg_per_line: f64,
}

/// Feature word checker.
#[derive(Debug, Clone)]
pub struct FeatureWords {
    matcher: Matcher,
    max_per_line: f64,
}

impl Default for FeatureWords {
    /// No keyword, at most 0.2 feature word per line.
    fn default() -> Self {
        Self::new(Matcher::default(), 0.2)
    }
}

impl FeatureWords {
    pub fn new(matcher: Matcher, max_per_line: f64) -> Self {
        Self {
            matcher,
            max_per_line,
        }
    }

    /// Passes when the average count of feature words per content line
    /// stays under the configured maximum.
    pub fn check(&self, text: &str) -> (bool, FeatureReport) {
        if self.matcher.is_empty() {
            return (
                true,
                FeatureReport {
                    feature_count: 0,
                    feature_words: Vec::new(),
                    avg_per_line: 0.0,
                },
            );
        }

        let feature_words = self.matcher.detect(text);
        let mut matched = 0;
        let mut content_lines = 0;
        for line in text.split('\n') {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            matched += self.matcher.count(line).0;
            if trimmed.chars().count() >= MIN_LINE_CHARS {
                content_lines += 1;
            }
        }
        let avg_per_line = if content_lines > 0 {
            matched as f64 / content_lines as f64
        } else {
            0.0
        };

        (
            avg_per_line <= self.max_per_line,
            FeatureReport {
                feature_count: feature_words.len(),
                feature_words,
                avg_per_line,
            },
        )
    }

    /// Score in `[0, 1]`, higher is cleaner. Empty text scores 0.
    pub fn score(&self, text: &str) -> f64 {
        let (_, report) = self.check(text);
        self.score_report(text, &report)
    }

    /// Score a text from its already computed [FeatureReport].
    pub fn score_report(&self, text: &str, report: &FeatureReport) -> f64 {
        let total_chars = text.chars().count();
        if total_chars == 0 {
            return 0.0;
        }

        let distinct: BTreeSet<&str> = report
            .feature_words
            .iter()
            .map(String::as_str)
            .filter(|w| !COMMON_WORDS.contains(w))
            .collect();

        let folded: String = text.chars().map(fold).collect();
        let high_weight = HIGH_WEIGHT_KEYWORDS
            .iter()
            .filter(|k| folded.contains(*k))
            .count()
            * 3;

        let mut ratio = (distinct.len() + high_weight) as f64 / (total_chars as f64 / 10.0);
        let negative_context = NEGATIVE_CONTEXT.is_match(text);
        if negative_context {
            ratio *= 0.3;
        }

        match ratio {
            r if r > 0.2 => 0.0,
            r if r > 0.1 => 0.2,
            r if r > 0.05 => 0.5,
            r if r > 0.01 => 0.8,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchStrategy;

    fn feature_words(keywords: &[&str]) -> FeatureWords {
        FeatureWords::new(Matcher::with_keywords(MatchStrategy::Trie, keywords), 0.2)
    }

    #[test]
    fn no_keywords_pass() {
        let (passed, report) = FeatureWords::default().check("免费领取");
        assert!(passed);
        assert_eq!(report.feature_count, 0);
    }

    #[test]
    fn average_per_content_line() {
        let fw = feature_words(&["代购", "返利"]);
        let text = "这是一行普通的内容\n代购代购返利\n短\n\n另一行普通内容文字";
        let (passed, report) = fw.check(text);
        // 3 matches over 3 lines of at least 5 chars
        assert_eq!(report.feature_count, 3);
        assert_eq!(report.avg_per_line, 1.0);
        assert!(!passed);
    }

    #[test]
    fn clean_text_passes() {
        let fw = feature_words(&["代购"]);
        let (passed, report) = fw.check("今天我们讨论一下天气。\n明天可能会下雨。");
        assert!(passed);
        assert_eq!(report.avg_per_line, 0.0);
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(feature_words(&["代购"]).score(""), 0.0);
    }

    #[test]
    fn score_buckets() {
        let fw = FeatureWords::default();
        let plain = "今天的天气非常好，我们一起去公园散步，看到了很多美丽的花朵和绿树。".repeat(3);
        assert_eq!(fw.score(&plain), 1.0);

        // one high weight keyword in 19 chars: ratio 3 / 1.9
        assert_eq!(fw.score("限时特卖会今天开始欢迎大家来看看好东西"), 0.0);
    }

    #[test]
    fn high_weight_keywords_are_case_insensitive() {
        let fw = FeatureWords::default();
        let text = format!("{}加QQ", "普".repeat(2000));
        // 3 / 200.3 > 0.01
        assert_eq!(fw.score(&text), 0.8);
    }

    #[test]
    fn common_words_are_ignored() {
        let fw = feature_words(&["手机", "代购"]);
        let filler = "普".repeat(96);
        // only "代购" counts: 1 / 10 => 0.1, not > 0.1
        assert_eq!(fw.score(&format!("手机{}代购", filler)), 0.5);
    }

    #[test]
    fn negative_context() {
        let fw = FeatureWords::default();
        let filler = "普".repeat(189);
        // two high weight keywords in 200 chars: 6 / 20, times 0.3 when rejected
        assert_eq!(fw.score(&format!("本站禁止色情和赌博内容{}", filler)), 0.5);
        assert_eq!(fw.score(&format!("本站出现色情和赌博内容{}", filler)), 0.0);
    }
}
