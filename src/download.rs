/*! Bounded, resumable downloads.

Raw archives are fetched from a list of relative paths joined to a base URL.
Transfers run concurrently (up to `n_tasks` at a time) but complete in list
order.

Every network await (response headers, then each body chunk) is bounded by a
read timeout and raced against a [CancellationToken]. A stalled or cancelled
transfer is [FetchOutcome::Skipped], never an error: the partial file stays on
disk and the next run resumes it with a `Range` request.
!*/
use std::future::Future;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{stream, StreamExt};
use log::{debug, error, info, log_enabled, warn, Level};
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode, Url};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

pub const BASE_URL: &str = "https://data.commoncrawl.org/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No data arrived within the read timeout.
    Timeout(Duration),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file at `path` is complete and holds `size` bytes.
    Completed { path: PathBuf, size: u64 },
    /// The transfer stopped after `size` bytes. Resumable.
    Skipped {
        path: PathBuf,
        size: u64,
        reason: SkipReason,
    },
}

/// Await `fut` unless the deadline elapses or `cancel` fires first.
async fn bounded<F: Future>(
    deadline: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, SkipReason> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SkipReason::Cancelled),
        res = tokio::time::timeout(deadline, fut) => res.map_err(|_| SkipReason::Timeout(deadline)),
    }
}

/// Holds urls to download and the http client that will make the requests.
pub struct Downloader {
    urls: Vec<Url>,
    client: Client,
    n_tasks: usize,
    read_timeout: Duration,
}

impl Downloader {
    pub fn new(urls: Vec<Url>, n_tasks: usize, read_timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            urls,
            client: Client::builder().build()?,
            n_tasks: n_tasks.max(1),
            read_timeout,
        })
    }

    /// Construct a downloader from a .paths file, one path relative to `base_url` per line.
    /// Unreadable lines and invalid URLs are logged and skipped.
    pub fn from_paths_file(
        paths_file: &Path,
        base_url: &str,
        n_tasks: usize,
        read_timeout: Duration,
    ) -> Result<Self, Error> {
        debug!("Downloader using {:?}", paths_file);
        let f = BufReader::new(std::fs::File::open(paths_file)?);

        let (lines, failures): (Vec<_>, Vec<_>) = f.lines().partition(Result::is_ok);
        for failure in failures.into_iter().filter_map(Result::err) {
            warn!("unreadable line: {}", failure);
        }

        let (urls, failures): (Vec<_>, Vec<_>) = lines
            .into_iter()
            .filter_map(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .map(|line| Url::parse(&format!("{}{}", base_url, line.trim())))
            .partition(Result::is_ok);

        if log_enabled!(Level::Debug) {
            debug!(
                "Got {valid}/{total} valid URLs",
                valid = urls.len(),
                total = urls.len() + failures.len()
            )
        }
        for failure in failures.into_iter().filter_map(Result::err) {
            warn!("invalid url: {}", failure);
        }

        let urls = urls.into_iter().filter_map(Result::ok).collect();
        Self::new(urls, n_tasks, read_timeout)
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    /// Download every url from the `offset`-th one into `dst/<index>.txt.gz`.
    ///
    /// Results are in url order. Failed transfers are logged and returned,
    /// they don't stop the others.
    pub async fn download(
        &self,
        dst: &Path,
        offset: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<FetchOutcome, Error>>, Error> {
        tokio::fs::create_dir_all(dst).await?;
        let total = self.urls.len();

        let results: Vec<Result<FetchOutcome, Error>> = stream::iter(self.urls.iter().enumerate().skip(offset))
            .map(|(idx, url)| {
                let path = dst.join(format!("{}.txt.gz", idx));
                async move {
                    info!("downloading {}/{}: {}", idx + 1, total, url);
                    let result = fetch(&self.client, url, path, self.read_timeout, cancel).await;
                    match &result {
                        Ok(FetchOutcome::Skipped { path, size, reason }) => {
                            warn!("{} skipped after {} bytes into {:?}: {:?}", url, size, path, reason)
                        }
                        Ok(FetchOutcome::Completed { .. }) => (),
                        Err(e) => error!("{}: {}", url, e),
                    }
                    result
                }
            })
            .buffered(self.n_tasks)
            .collect()
            .await;

        Ok(results)
    }
}

/// Fetch `url` into `path`, resuming from the current size of `path`.
pub async fn fetch(
    client: &Client,
    url: &Url,
    path: PathBuf,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<FetchOutcome, Error> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    let mut size = file.metadata().await?.len();

    let mut request = client.get(url.clone());
    if size > 0 {
        debug!("resuming {} from byte {}", url, size);
        request = request.header(RANGE, format!("bytes={}-", size));
    }

    let response = match bounded(read_timeout, cancel, request.send()).await {
        Ok(response) => response?,
        Err(reason) => return Ok(FetchOutcome::Skipped { path, size, reason }),
    };

    match response.status() {
        StatusCode::PARTIAL_CONTENT => (),
        StatusCode::RANGE_NOT_SATISFIABLE if size > 0 => {
            debug!("{} already complete", url);
            return Ok(FetchOutcome::Completed { path, size });
        }
        status if status.is_success() && size > 0 => {
            debug!("{} ignored the range request, restarting", url);
            file.set_len(0).await?;
            size = 0;
        }
        _ => (),
    }
    let response = response.error_for_status()?;

    let body = response.bytes_stream();
    tokio::pin!(body);
    loop {
        let chunk = match bounded(read_timeout, cancel, body.next()).await {
            Ok(Some(chunk)) => chunk?,
            Ok(None) => break,
            Err(reason) => {
                file.flush().await?;
                return Ok(FetchOutcome::Skipped { path, size, reason });
            }
        };
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(FetchOutcome::Completed { path, size })
}
