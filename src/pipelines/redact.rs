//! Keyword redaction of a document directory.
use std::path::PathBuf;

use log::{info, warn};

use super::batch::{BatchProcessor, RewriteStats, Transforms};
use super::Pipeline;
use crate::config::FeatureConfig;
use crate::error::Error;
use crate::io::{DirSink, DirSource};
use crate::matching::{load_keyword_files, Matcher};
use crate::transformers::Redact;

pub struct Redaction {
    src: PathBuf,
    dst: PathBuf,
    pattern: String,
    features: FeatureConfig,
    workers: Option<usize>,
}

impl Redaction {
    pub fn new(
        src: PathBuf,
        dst: PathBuf,
        pattern: String,
        features: FeatureConfig,
        workers: Option<usize>,
    ) -> Self {
        Self {
            src,
            dst,
            pattern,
            features,
            workers,
        }
    }
}

impl Pipeline<RewriteStats> for Redaction {
    fn run(&self) -> Result<RewriteStats, Error> {
        let processor = BatchProcessor::new(self.workers)?;
        let source = DirSource::new(&self.src, &self.pattern);
        let sink = DirSink::new(&self.dst)?;

        let keywords = load_keyword_files(&self.features.keyword_paths);
        let matcher = Matcher::with_keywords(self.features.strategy, keywords);
        if matcher.is_empty() {
            warn!("no keywords loaded, documents are copied unchanged");
        } else {
            info!("redacting {} keywords", matcher.len());
        }

        let transforms: Transforms = vec![Box::new(Redact::new(matcher, self.features.replacement))];
        processor.rewrite(&source, &sink, &transforms)
    }
}
