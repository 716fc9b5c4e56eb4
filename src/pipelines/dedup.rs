//! Repeat removal over a document directory.
use std::path::PathBuf;

use log::info;

use super::batch::{BatchProcessor, RewriteStats, Transforms};
use super::Pipeline;
use crate::config::DedupConfig;
use crate::error::Error;
use crate::io::{DirSink, DirSource};
use crate::transformers::{CleanText, RemoveRepeats};

pub struct Dedup {
    src: PathBuf,
    dst: PathBuf,
    pattern: String,
    config: DedupConfig,
    workers: Option<usize>,
}

impl Dedup {
    pub fn new(
        src: PathBuf,
        dst: PathBuf,
        pattern: String,
        config: DedupConfig,
        workers: Option<usize>,
    ) -> Self {
        Self {
            src,
            dst,
            pattern,
            config,
            workers,
        }
    }
}

impl Pipeline<RewriteStats> for Dedup {
    fn run(&self) -> Result<RewriteStats, Error> {
        let processor = BatchProcessor::new(self.workers)?;
        let source = DirSource::new(&self.src, &self.pattern);
        let sink = DirSink::new(&self.dst)?;

        let mut transforms: Transforms = Vec::new();
        if self.config.clean_text {
            transforms.push(Box::new(CleanText));
        }
        transforms.push(Box::new(RemoveRepeats::new(self.config.min_repeat_length)));

        info!(
            "removing repeats of {}+ chars from {:?}",
            self.config.min_repeat_length, self.src
        );
        processor.rewrite(&source, &sink, &transforms)
    }
}
