//! Error enum
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Custom(String),
    Serde(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Http(reqwest::Error),
    Url(url::ParseError),
    ThreadPool(rayon::ThreadPoolBuildError),
    /// A keyword file could not be loaded.
    PatternLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An external scorer (perplexity model, embedder) failed or answered garbage.
    Scorer(String),
    Timeout(Duration),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Custom(s) => write!(f, "{}", s),
            Error::Serde(e) => write!(f, "serialization error: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "invalid glob pattern: {}", e),
            Error::Http(e) => write!(f, "http error: {}", e),
            Error::Url(e) => write!(f, "invalid url: {}", e),
            Error::ThreadPool(e) => write!(f, "could not build worker pool: {}", e),
            Error::PatternLoad { path, source } => {
                write!(f, "could not load patterns from {:?}: {}", path, source)
            }
            Error::Scorer(s) => write!(f, "external scorer error: {}", s),
            Error::Timeout(d) => write!(f, "deadline of {:?} elapsed", d),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Http(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Error {
        Error::Url(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Error {
        Error::ThreadPool(e)
    }
}
