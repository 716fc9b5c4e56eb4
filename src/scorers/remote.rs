/*! HTTP model clients.

Language and embedding models are served out of process. Both clients post
JSON and expect JSON back:

- perplexity: `{"text": "..."}` → `{"perplexity": 42.0}`
- embeddings: `{"texts": ["...", ...]}` → `{"embeddings": [[0.1, ...], ...]}`

Requests are blocking and bounded by a timeout; they run on the batch
worker threads.
!*/
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Embedder, PerplexityModel};
use crate::error::Error;

/// Blocking JSON client bound to one endpoint.
struct JsonClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl JsonClient {
    fn new(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: Url::parse(endpoint)?,
            timeout,
        })
    }

    fn post<Q: Serialize, R: DeserializeOwned>(&self, query: &Q) -> Result<R, Error> {
        let body = serde_json::to_vec(query)?;
        let bytes = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::Http(e)
                }
            })?;
        debug!("{} answered {} bytes", self.endpoint, bytes.len());
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Serialize)]
struct PerplexityQuery<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct PerplexityAnswer {
    perplexity: f64,
}

/// Perplexity model behind an HTTP endpoint.
pub struct RemotePerplexity {
    client: JsonClient,
}

impl RemotePerplexity {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: JsonClient::new(endpoint, timeout)?,
        })
    }
}

impl PerplexityModel for RemotePerplexity {
    fn perplexity(&self, text: &str) -> Result<f64, Error> {
        let answer: PerplexityAnswer = self.client.post(&PerplexityQuery { text })?;
        Ok(answer.perplexity)
    }
}

#[derive(Serialize)]
struct EmbeddingQuery<'a> {
    texts: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingAnswer {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding model behind an HTTP endpoint.
pub struct RemoteEmbedder {
    client: JsonClient,
}

impl RemoteEmbedder {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: JsonClient::new(endpoint, timeout)?,
        })
    }
}

impl Embedder for RemoteEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        let answer: EmbeddingAnswer = self.client.post(&EmbeddingQuery { texts })?;
        if answer.embeddings.len() != texts.len() {
            return Err(Error::Scorer(format!(
                "asked for {} embeddings, got {}",
                texts.len(),
                answer.embeddings.len()
            )));
        }
        Ok(answer.embeddings)
    }
}
