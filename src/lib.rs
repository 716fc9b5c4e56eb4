/*! # textsieve

Quality filtering and cleanup of text corpora, mostly Chinese web text.

- [transformers]: repeated passage removal with a suffix automaton, text cleanup, keyword redaction.
- [matching]: keyword matching (trie or Aho-Corasick) and feature word scoring.
- [filtering]: rule based quality checks.
- [scorers]: model backed scorers (perplexity, near duplicates).
- [pipelines]: per-document quality evaluation and batch processing of directories.
- [download]: bounded, resumable archive downloads.

```
use textsieve::transformers::remove_repeats;

let text = "abcdefghijklmnopqrstu".repeat(2);
assert_eq!(remove_repeats(&text, 21), "abcdefghijklmnopqrstu");
```
!*/
pub mod config;
pub mod document;
pub mod download;
pub mod error;
pub mod filtering;
pub mod io;
pub mod matching;
pub mod pipelines;
pub mod scorers;
pub mod transformers;
