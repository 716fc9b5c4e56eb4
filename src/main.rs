//! # textsieve
//!
//! Quality filtering, keyword redaction and repeat removal for text corpora.
//!
//! ## Getting started
//!
//! ```sh
//! textsieve 0.1.0
//! text corpus quality filtering and cleanup.
//!
//! USAGE:
//!     textsieve <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     dedup             Remove repeated passages from documents
//!     download          Download raw archives
//!     filter            Score documents and keep the good ones
//!     help              Prints this message or the help of the given subcommand(s)
//!     index             Build the reference embedding index of a corpus
//!     merge-keywords    Merge keyword lists into a single deduplicated one
//!     redact            Redact keywords from documents
//! ```
//!
//! Logging is configured through `RUST_LOG`.
use std::fs::File;
use std::io::Write;
use std::time::Duration;

use log::{debug, error, info, warn};
use structopt::StructOpt;
use tokio_util::sync::CancellationToken;

use textsieve::download::{Downloader, FetchOutcome};
use textsieve::error::Error;
use textsieve::matching::merge_keyword_files;
use textsieve::pipelines::{CorpusIndex, Dedup, Pipeline, QualityFilter, Redaction};

mod cli;

fn download(d: cli::Download) -> Result<(), Error> {
    let dl = Downloader::from_paths_file(
        &d.paths_file,
        &d.base_url,
        d.n_tasks.unwrap_or(4),
        Duration::from_secs(d.read_timeout),
    )?;
    let offset = d.offset.unwrap_or(0);
    let cancel = CancellationToken::new();

    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(async {
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping transfers");
                on_interrupt.cancel();
            }
        });
        dl.download(&d.dst, offset, &cancel).await
    })?;

    // write eventual download errors
    let mut error_file = File::create(d.dst.join("errors.txt"))?;
    let (mut completed, mut skipped, mut failed) = (0, 0, 0);
    for (url, result) in dl.urls().iter().skip(offset).zip(&results) {
        match result {
            Ok(FetchOutcome::Completed { .. }) => completed += 1,
            Ok(FetchOutcome::Skipped { .. }) => skipped += 1,
            Err(e) => {
                failed += 1;
                writeln!(error_file, "{}\t{}", url, e)?;
            }
        }
    }
    info!(
        "{} completed, {} skipped (resumable), {} failed",
        completed, skipped, failed
    );
    Ok(())
}

fn run(opt: cli::Textsieve) -> Result<(), Error> {
    match opt {
        cli::Textsieve::Filter(f) => {
            let config = f.config()?;
            let stats = QualityFilter::new(f.src, f.dst, f.pattern, config).run()?;
            debug!("{:?}", stats);
        }
        cli::Textsieve::Redact(r) => {
            let config = r.config()?;
            let stats =
                Redaction::new(r.src, r.dst, r.pattern, config.features, config.workers).run()?;
            debug!("{:?}", stats);
        }
        cli::Textsieve::Dedup(d) => {
            let config = d.config()?;
            let stats = Dedup::new(d.src, d.dst, d.pattern, config.dedup, config.workers).run()?;
            debug!("{:?}", stats);
        }
        cli::Textsieve::Index(i) => {
            let config = i.config()?;
            let n = CorpusIndex::new(i.src, i.dst, i.pattern, config.clustering).run()?;
            debug!("{} documents indexed", n);
        }
        cli::Textsieve::MergeKeywords(m) => {
            let n = merge_keyword_files(&m.src, &m.dst, !m.no_sort)?;
            info!("{} keywords written to {:?}", n, m.dst);
        }
        cli::Textsieve::Download(d) => download(d)?,
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Textsieve::from_args();
    debug!("cli args\n{:#?}", opt);

    run(opt).map_err(|e| {
        error!("{}", e);
        e
    })
}
