/*!
# IO utilities

Document loading and result saving.

Documents come from a [DocumentSource] and go to a [DocumentSink]. Both are
shared by reference across the batch workers, so their methods take `&self`
and every document maps to its own files.
!*/
mod sink;
mod source;

pub use sink::{DirSink, DocumentSink, RESULTS_DIR};
pub use source::{DirSource, DocumentSource};
