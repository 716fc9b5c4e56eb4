//! Keyword redaction.
use log::debug;

use super::Transform;
use crate::document::Document;
use crate::matching::{Matcher, PatternMatcher};

/// Replaces every char of every keyword match by a replacement char.
pub struct Redact {
    matcher: Matcher,
    replacement: char,
}

impl Redact {
    pub fn new(matcher: Matcher, replacement: char) -> Self {
        Self {
            matcher,
            replacement,
        }
    }
}

impl Transform for Redact {
    fn transform_own(&self, mut doc: Document) -> Document {
        let redacted = self.matcher.filter(doc.content(), self.replacement);
        if redacted != doc.content() {
            debug!("{}: redacted", doc.id());
        }
        doc.set_content(redacted);
        doc
    }
}
