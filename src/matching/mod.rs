/*! Keyword matching.

Two strategies share the [PatternMatcher] trait:
- [TrieWalker]: plain prefix trie, restarts the walk at the next position on a mismatch.
- [AhoCorasick]: trie with failure links, single pass over the text.

Both report, for each scan position, the *shortest* keyword starting there,
then resume the scan after it, so they produce identical matches.

Matching is case insensitive: keywords and text are folded char by char
(see [fold]), and since folding never changes the char count,
matched spans can be mapped back onto the original text.
Redaction ([PatternMatcher::filter]) only rewrites matched spans and keeps the
original casing everywhere else.

Matchers are built once and then shared read-only across workers.
!*/
mod aho_corasick;
mod feature;
mod keywords;
mod trie;

pub use aho_corasick::AhoCorasick;
pub use feature::{FeatureReport, FeatureWords};
pub use keywords::{load_keyword_files, load_keywords, merge_keyword_files};
pub use trie::TrieWalker;

use crate::config::MatchStrategy;

/// Matched span, in char offsets (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lowercase `c` when it maps to a single char, keep it otherwise.
pub fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Trim and fold a keyword. Blank keywords give `None`.
pub fn normalize_keyword(keyword: &str) -> Option<Vec<char>> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        None
    } else {
        Some(keyword.chars().map(fold).collect())
    }
}

pub trait PatternMatcher {
    /// Insert a keyword. Blank keywords are ignored.
    fn add(&mut self, keyword: &str);

    /// Finish construction after a series of [PatternMatcher::add].
    fn build(&mut self) {}

    /// Non overlapping matches over already folded text, left to right.
    fn find(&self, folded: &[char]) -> Vec<Match>;

    /// Matched keywords (folded), in text order.
    fn detect(&self, text: &str) -> Vec<String> {
        let folded: Vec<char> = text.chars().map(fold).collect();
        self.find(&folded)
            .into_iter()
            .map(|m| folded[m.start..m.end].iter().collect())
            .collect()
    }

    /// Replace every matched span by `replacement` repeated to the span length.
    fn filter(&self, text: &str, replacement: char) -> String {
        let chars: Vec<char> = text.chars().collect();
        let folded: Vec<char> = chars.iter().copied().map(fold).collect();
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for m in self.find(&folded) {
            out.extend(&chars[cursor..m.start]);
            out.extend(std::iter::repeat(replacement).take(m.len()));
            cursor = m.end;
        }
        out.extend(&chars[cursor..]);
        out
    }

    fn count(&self, text: &str) -> (usize, Vec<String>) {
        let found = self.detect(text);
        (found.len(), found)
    }
}

/// Matcher selected by configuration.
#[derive(Debug, Clone)]
pub enum Matcher {
    Trie(TrieWalker),
    AhoCorasick(AhoCorasick),
}

impl Matcher {
    pub fn new(strategy: MatchStrategy) -> Self {
        match strategy {
            MatchStrategy::Trie => Matcher::Trie(TrieWalker::default()),
            MatchStrategy::AhoCorasick => Matcher::AhoCorasick(AhoCorasick::default()),
        }
    }

    /// Build a ready to use matcher.
    pub fn with_keywords<I, S>(strategy: MatchStrategy, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::new(strategy);
        for keyword in keywords {
            matcher.add(keyword.as_ref());
        }
        matcher.build();
        matcher
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        match self {
            Matcher::Trie(m) => m.len(),
            Matcher::AhoCorasick(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(MatchStrategy::default())
    }
}

impl PatternMatcher for Matcher {
    fn add(&mut self, keyword: &str) {
        match self {
            Matcher::Trie(m) => m.add(keyword),
            Matcher::AhoCorasick(m) => m.add(keyword),
        }
    }

    fn build(&mut self) {
        match self {
            Matcher::Trie(m) => m.build(),
            Matcher::AhoCorasick(m) => m.build(),
        }
    }

    fn find(&self, folded: &[char]) -> Vec<Match> {
        match self {
            Matcher::Trie(m) => m.find(folded),
            Matcher::AhoCorasick(m) => m.find(folded),
        }
    }
}
