/*! Document transformers.

Transforms rewrite the content of a document: repeat removal, cleanup and
keyword redaction. They run before scoring in the filter pipeline, or on
their own in the redact and dedup pipelines.
!*/
pub mod automaton;
mod clean;
mod redact;
mod repeats;
mod transform;

pub use automaton::SuffixAutomaton;
pub use clean::{clean_text, CleanText};
pub use redact::Redact;
pub use repeats::{remove_repeats, remove_repeats_once, RemoveRepeats, DEFAULT_MIN_REPEAT_LENGTH};
pub use transform::Transform;
