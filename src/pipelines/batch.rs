/*! Batch processing.

A [BatchProcessor] runs every document of a [DocumentSource] through a
per-document function on a fixed-size worker pool and writes the outcome to a
[DocumentSink]. Workers share the matchers and scorers by reference and own
everything built for a single document (e.g. its suffix automaton).

A failing document never stops the run: its error is logged, counted and the
run goes on. Results are collected in enumeration order, so the counters and
the logs of two runs over the same source are identical.
!*/
use log::{debug, error, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

use super::QualityPipeline;
use crate::document::Document;
use crate::error::Error;
use crate::io::{DocumentSink, DocumentSource};
use crate::transformers::Transform;

/// Stats file of a filter run.
pub const FILTER_STATS: &str = "stats.json";
/// Stats file of a redact or dedup run.
pub const REWRITE_STATS: &str = "filter_stats.json";

/// Transforms applied in order to each document.
pub type Transforms = Vec<Box<dyn Transform + Send + Sync>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub errored: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub total: usize,
    pub processed: usize,
    pub errored: usize,
}

fn apply(transforms: &[Box<dyn Transform + Send + Sync>], doc: Document) -> Document {
    transforms.iter().fold(doc, |doc, t| t.transform_own(doc))
}

pub struct BatchProcessor {
    pool: ThreadPool,
}

impl BatchProcessor {
    /// Processor with `workers` threads, or as many as rayon sees fit.
    pub fn new(workers: Option<usize>) -> Result<Self, Error> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(n) = workers {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        debug!("batch pool of {} workers", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Read every document and run `f` on it, in parallel.
    ///
    /// Outputs are claimed in `sink` beforehand, in enumeration order: a document
    /// whose claim fails is not processed and gets the claim error.
    /// Results are returned in enumeration order along with the document identifiers.
    /// Only a failure to enumerate the source is an error.
    pub fn for_each_document<S, K, F, T>(
        &self,
        source: &S,
        sink: &K,
        f: F,
    ) -> Result<Vec<(String, Result<T, Error>)>, Error>
    where
        S: DocumentSource + Sync,
        K: DocumentSink + Sync,
        F: Fn(Document) -> Result<T, Error> + Sync,
        T: Send,
    {
        let ids = source.ids()?;
        info!("processing {} documents", ids.len());
        let claims: Vec<Result<(), Error>> = ids.iter().map(|id| sink.claim(id)).collect();
        let results = self.pool.install(|| {
            ids.into_par_iter()
                .zip(claims)
                .map(|(id, claim)| {
                    let result = claim.and_then(|()| source.read(&id)).and_then(&f);
                    (id, result)
                })
                .collect()
        });
        Ok(results)
    }

    /// Evaluate every document, keep the accepted ones.
    ///
    /// Each document gets an audit record, accepted texts are written after
    /// `transforms` ran on them, and stats go to [FILTER_STATS].
    pub fn filter<S, K>(
        &self,
        source: &S,
        sink: &K,
        transforms: &[Box<dyn Transform + Send + Sync>],
        pipeline: &QualityPipeline,
    ) -> Result<FilterStats, Error>
    where
        S: DocumentSource + Sync,
        K: DocumentSink + Sync,
    {
        let results = self.for_each_document(source, sink, |doc| {
            let doc = apply(transforms, doc);
            let verdict = pipeline.evaluate(doc.content());
            debug!(
                "{}: score {:.3}, accepted: {}",
                doc.id(),
                verdict.composite_score,
                verdict.accepted
            );
            // text first: an accepted record always has its text
            if verdict.accepted {
                sink.write_text(doc.id(), doc.content())?;
            }
            sink.write_record(doc.id(), &verdict)?;
            Ok(verdict.accepted)
        })?;

        let mut stats = FilterStats {
            total: results.len(),
            ..Default::default()
        };
        for (id, result) in results {
            match result {
                Ok(true) => stats.accepted += 1,
                Ok(false) => stats.rejected += 1,
                Err(e) => {
                    error!("{}: {}", id, e);
                    stats.errored += 1;
                }
            }
        }

        info!(
            "{} documents: {} accepted, {} rejected, {} errored",
            stats.total, stats.accepted, stats.rejected, stats.errored
        );
        sink.write_stats(FILTER_STATS, &stats)?;
        Ok(stats)
    }

    /// Run `transforms` on every document and write the result.
    /// Stats go to [REWRITE_STATS].
    pub fn rewrite<S, K>(
        &self,
        source: &S,
        sink: &K,
        transforms: &[Box<dyn Transform + Send + Sync>],
    ) -> Result<RewriteStats, Error>
    where
        S: DocumentSource + Sync,
        K: DocumentSink + Sync,
    {
        let results = self.for_each_document(source, sink, |doc| {
            let doc = apply(transforms, doc);
            sink.write_text(doc.id(), doc.content())
        })?;

        let mut stats = RewriteStats {
            total: results.len(),
            ..Default::default()
        };
        for (id, result) in results {
            match result {
                Ok(()) => stats.processed += 1,
                Err(e) => {
                    error!("{}: {}", id, e);
                    stats.errored += 1;
                }
            }
        }

        info!(
            "{} documents: {} processed, {} errored",
            stats.total, stats.processed, stats.errored
        );
        sink.write_stats(REWRITE_STATS, &stats)?;
        Ok(stats)
    }
}
