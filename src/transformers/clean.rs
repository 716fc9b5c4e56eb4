//! Crawl text cleanup.
//!
//! Keeps CJK ideographs, ASCII alphanumerics and a fixed set of punctuation,
//! then collapses space runs.
use super::transform::Transform;
use crate::document::Document;

const ALLOWED_PUNCTUATION: &str =
    " !~@#$%^&*()_+<>?:\"{}|,./;'[]\\-！￥…（）？：，。；【】—";

/// Remove everything but text and common punctuation.
///
/// Newlines and pictographs are dropped.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars().filter(|c| is_kept(*c)) {
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        out.push(c);
    }
    out.trim().to_string()
}

fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fff}').contains(&c) || ALLOWED_PUNCTUATION.contains(c)
}

#[derive(Default)]
pub struct CleanText;

impl Transform for CleanText {
    fn transform_own(&self, mut doc: Document) -> Document {
        let cleaned = clean_text(doc.content());
        doc.set_content(cleaned);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_pictographs() {
        assert_eq!(clean_text("你好😀世界🚀"), "你好世界");
    }

    #[test]
    fn collapses_spaces() {
        assert_eq!(clean_text("  hello   world\n\n再见  "), "hello world再见");
        assert_eq!(clean_text("a \t b"), "a b");
    }

    #[test]
    fn keeps_punctuation() {
        assert_eq!(clean_text("价格：100元！【促销】"), "价格：100元！【促销】");
        assert_eq!(clean_text("été"), "t");
    }

    #[test]
    fn transform() {
        let doc = Document::new("x".to_string(), "✈ 飞机 ✈".to_string());
        assert_eq!(CleanText.transform_own(doc).content(), "飞机");
    }
}
