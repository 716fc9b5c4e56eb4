/*! Known spam signatures.

Link-farm and SEO pages in Chinese web crawls share a handful of phrasings
(streaming site categories, region tags). They are matched with a
[regex::RegexSet] compiled once.
!*/
use lazy_static::lazy_static;
use regex::RegexSet;

const SEO_PATTERNS: &[&str] = &[
    r"\d+\s*区\s*\d+",
    r"在线\s*播放",
    r"视频\s*一区\s*二区",
    r"久久+久+",
    r"不卡\s*一区\s*二区",
    r"精品\s*视频\s*在线",
    r"日本\s*韩国\s*欧美",
];

const ADULT_PATTERNS: &[&str] = &[
    r"激情\s*小说",
    r"成人\s*视频",
    r"在线\s*观看",
    r"一本\s*道",
    r"中文\s*字幕",
];

lazy_static! {
    static ref SEO: RegexSet = RegexSet::new(SEO_PATTERNS).expect("invalid SEO pattern");
    static ref EXTENDED: RegexSet = RegexSet::new(SEO_PATTERNS.iter().chain(ADULT_PATTERNS))
        .expect("invalid spam pattern");
}

/// SEO/link-farm signature.
pub fn has_seo_signature(text: &str) -> bool {
    SEO.is_match(text)
}

/// SEO signatures plus adult-site phrasing.
pub fn has_spam_signature(text: &str) -> bool {
    EXTENDED.is_match(text)
}

/// Ratio of `c` among the chars of `text`. Empty text has a ratio of 0.
pub fn char_density(text: &str, c: char) -> f64 {
    density(text, |x| x == c)
}

/// Ratio of chars matching `pred`. Empty text has a ratio of 0.
pub fn density<F: Fn(char) -> bool>(text: &str, pred: F) -> f64 {
    let (total, matching) = text
        .chars()
        .fold((0usize, 0usize), |(t, m), c| (t + 1, m + pred(c) as usize));
    if total == 0 {
        0.0
    } else {
        matching as f64 / total as f64
    }
}
