/*! Language model perplexity scoring.

Fluent text has a low perplexity under a language model, while keyword
soups, link lists and machine generated spam score high. The model is
queried through [PerplexityModel]; this module prepares the text, corrects
the perplexity of obvious spam and maps it to a score:

- `ppl <= threshold / 2` scores 1,
- `ppl >= max_perplexity` scores 0,
- in between the score decreases linearly,
- obvious spam halves the score.
!*/
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::Value;

use super::{Assessment, Details, Scorer};
use crate::config::PerplexityConfig;
use crate::error::Error;
use crate::filtering::chars::is_pictograph;
use crate::filtering::spam::{char_density, density, has_spam_signature};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("invalid whitespace pattern");
    static ref URL: Regex = Regex::new(r"https?://\S+|www\.\S+").expect("invalid url pattern");
    static ref EXCLAMATIONS: Regex = Regex::new(r"[!?]{2,}").expect("invalid pattern");
    static ref ELLIPSIS: Regex = Regex::new(r"\.{3,}").expect("invalid pattern");
    static ref SENTENCE_END: Regex = Regex::new(r"[。！？.!?]").expect("invalid pattern");
}

const SENTENCE_PUNCTUATION: &str = ".。,，!！?？:：;；";

/// A language model able to compute the perplexity of a text.
pub trait PerplexityModel {
    fn perplexity(&self, text: &str) -> Result<f64, Error>;
}

/// Perplexity based [Scorer].
pub struct PerplexityScorer<M> {
    model: M,
    threshold: f64,
    max_perplexity: f64,
    max_chars: usize,
}

impl<M: PerplexityModel> PerplexityScorer<M> {
    pub fn new(model: M, config: &PerplexityConfig) -> Self {
        Self {
            model,
            threshold: config.threshold,
            max_perplexity: config.max_perplexity,
            max_chars: config.max_chars,
        }
    }

    /// Corrected perplexity of `text`, and whether it looks like spam.
    pub fn measure(&self, text: &str) -> Result<(f64, bool), Error> {
        let prepared = prepare(text, self.max_chars);
        let raw = self.model.perplexity(&prepared)?;
        if raw.is_nan() || raw < 0.0 {
            return Err(Error::Scorer(format!("invalid perplexity {}", raw)));
        }

        let mut perplexity = raw.min(self.max_perplexity);
        let spam = has_spam(text);
        if spam {
            perplexity = (perplexity * 1.5).max(self.threshold * 1.2);
        }
        debug!("perplexity {:.2} (raw {:.2}, spam: {})", perplexity, raw, spam);
        Ok((perplexity, spam))
    }

    fn to_score(&self, perplexity: f64, spam: bool) -> f64 {
        let low = self.threshold / 2.0;
        let base = if perplexity >= self.max_perplexity {
            0.0
        } else if perplexity <= low {
            1.0
        } else {
            (1.0 - (perplexity - low) / (self.max_perplexity - low)).max(0.0)
        };
        if spam {
            base * 0.5
        } else {
            base
        }
    }

    fn details(&self, perplexity: f64, spam: bool) -> Details {
        let mut details = Details::new();
        details.insert("perplexity".to_string(), Value::from(perplexity));
        details.insert("threshold".to_string(), Value::from(self.threshold));
        details.insert("hasSpamPatterns".to_string(), Value::from(spam));
        details
    }
}

impl<M: PerplexityModel> Scorer for PerplexityScorer<M> {
    fn check(&self, text: &str) -> Result<(bool, Details), Error> {
        let (perplexity, spam) = self.measure(text)?;
        Ok((
            perplexity <= self.threshold && !spam,
            self.details(perplexity, spam),
        ))
    }

    fn score(&self, text: &str) -> Result<f64, Error> {
        let (perplexity, spam) = self.measure(text)?;
        Ok(self.to_score(perplexity, spam))
    }

    fn evaluate(&self, text: &str) -> Result<Assessment, Error> {
        let (perplexity, spam) = self.measure(text)?;
        Ok(Assessment {
            passed: perplexity <= self.threshold && !spam,
            score: self.to_score(perplexity, spam),
            details: self.details(perplexity, spam),
        })
    }
}

/// Signatures, separator walls or punctuation soup.
fn has_spam(text: &str) -> bool {
    has_spam_signature(text)
        || char_density(text, '|') > 0.01
        || density(text, |c| SENTENCE_PUNCTUATION.contains(c)) > 0.15
}

/// Normalize noise that inflates perplexity without meaning anything,
/// then reduce long texts to a sample of their sentences.
fn prepare(text: &str, max_chars: usize) -> String {
    let text: String = text.chars().filter(|c| !is_pictograph(*c)).collect();
    let text = WHITESPACE.replace_all(&text, " ");
    let text = URL.replace_all(&text, "[URL]");
    let text = EXCLAMATIONS.replace_all(&text, "!");
    let text = ELLIPSIS.replace_all(&text, "...");
    let text = text.trim();

    if text.chars().count() > max_chars {
        sample_sentences(text, max_chars)
    } else {
        text.to_string()
    }
}

/// Up to two sentences from the start, the middle and the end of `text`,
/// truncated to `max_chars`.
fn sample_sentences(text: &str, max_chars: usize) -> String {
    let sentences: Vec<&str> = SENTENCE_END
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect();
    if sentences.len() <= 3 {
        return text.chars().take(max_chars).collect();
    }

    let n = sentences.len();
    let (front, rest) = sentences.split_at(n / 3);
    let (middle, end) = rest.split_at(2 * n / 3 - n / 3);
    let selected: Vec<&str> = front
        .iter()
        .take(2)
        .chain(middle.iter().take(2))
        .chain(end.iter().take(2))
        .copied()
        .collect();
    selected.join("。").chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Constant(f64);

    impl PerplexityModel for Constant {
        fn perplexity(&self, _: &str) -> Result<f64, Error> {
            Ok(self.0)
        }
    }

    /// Records what the model is asked to score.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl PerplexityModel for Recorder {
        fn perplexity(&self, text: &str) -> Result<f64, Error> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(10.0)
        }
    }

    struct Broken;

    impl PerplexityModel for Broken {
        fn perplexity(&self, _: &str) -> Result<f64, Error> {
            Err(Error::Scorer("model unavailable".to_string()))
        }
    }

    fn scorer<M: PerplexityModel>(model: M) -> PerplexityScorer<M> {
        PerplexityScorer::new(model, &PerplexityConfig::default())
    }

    const FLUENT: &str = "今天天气很好，我们去公园散步。";

    #[test]
    fn score_mapping() {
        assert_eq!(scorer(Constant(50.0)).score(FLUENT).unwrap(), 1.0);
        assert_eq!(scorer(Constant(100.0)).score(FLUENT).unwrap(), 1.0);
        assert!((scorer(Constant(5050.0)).score(FLUENT).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(scorer(Constant(20_000.0)).score(FLUENT).unwrap(), 0.0);
        assert_eq!(scorer(Constant(f64::INFINITY)).score(FLUENT).unwrap(), 0.0);
    }

    #[test]
    fn check_threshold() {
        let (passed, details) = scorer(Constant(150.0)).check(FLUENT).unwrap();
        assert!(passed);
        assert_eq!(details["perplexity"], Value::from(150.0));
        assert_eq!(details["hasSpamPatterns"], Value::from(false));
        assert!(!scorer(Constant(250.0)).check(FLUENT).unwrap().0);
    }

    #[test]
    fn spam_is_corrected() {
        let s = scorer(Constant(50.0));
        let spam = "最新电影在线观看，中文字幕高清";
        let (perplexity, is_spam) = s.measure(spam).unwrap();
        assert!(is_spam);
        assert_eq!(perplexity, 240.0);
        let a = s.evaluate(spam).unwrap();
        assert!(!a.passed);
        let expected = (1.0 - 140.0 / 9900.0) * 0.5;
        assert!((a.score - expected).abs() < 1e-9);
    }

    #[test]
    fn punctuation_soup_is_spam() {
        assert!(has_spam("好。。。！！，，？？"));
        assert!(has_spam("a|b|c|d"));
        assert!(!has_spam(FLUENT));
        assert!(!has_spam(""));
    }

    #[test]
    fn model_errors_propagate() {
        assert!(matches!(
            scorer(Broken).evaluate(FLUENT),
            Err(Error::Scorer(_))
        ));
        assert!(scorer(Constant(f64::NAN)).score(FLUENT).is_err());
    }

    #[test]
    fn text_is_prepared() {
        let s = scorer(Recorder::default());
        s.score("看  这里!!!  http://spam.example/x 🚀 好的......").unwrap();
        let seen = s.model.0.lock().unwrap();
        assert_eq!(seen.as_slice(), ["看 这里! [URL] 好的..."]);
    }

    #[test]
    fn long_text_is_sampled() {
        let sentences: Vec<String> = (0..30).map(|i| format!("第{}句话的内容", i)).collect();
        let text = sentences.join("。");
        assert!(text.chars().count() > 50);
        let sampled = sample_sentences(&text, 500);
        assert_eq!(
            sampled,
            "第0句话的内容。第1句话的内容。第10句话的内容。第11句话的内容。第20句话的内容。第21句话的内容"
        );
        assert_eq!(sample_sentences(&text, 10).chars().count(), 10);
        assert_eq!(prepare(&text, 50).chars().count(), 50);
        assert_eq!(sample_sentences("一。二。三", 2), "一。");
    }
}
