//! Document type.

/// A named text unit, read from a [crate::io::DocumentSource].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    content: String,
}

impl Document {
    pub fn new(id: String, content: String) -> Self {
        Self { id, content }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace content, keeping the identifier.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }
}
