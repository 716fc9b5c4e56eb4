//! Command line arguments and parameters management/parsing.
use std::path::{Path, PathBuf};

use structopt::StructOpt;

use textsieve::config::{Config, MatchStrategy};
use textsieve::error::Error;

#[derive(Debug, StructOpt)]
#[structopt(name = "textsieve", about = "text corpus quality filtering and cleanup.")]
/// Holds every command that is callable by the `textsieve` command.
pub enum Textsieve {
    #[structopt(about = "Score documents and keep the good ones")]
    Filter(Filter),
    #[structopt(about = "Redact keywords from documents")]
    Redact(Redact),
    #[structopt(about = "Remove repeated passages from documents")]
    Dedup(Dedup),
    #[structopt(about = "Build the reference embedding index of a corpus")]
    Index(Index),
    #[structopt(about = "Merge keyword lists into a single deduplicated one")]
    MergeKeywords(MergeKeywords),
    #[structopt(about = "Download raw archives")]
    Download(Download),
}

/// Load the configuration file, or the default configuration.
fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    match path {
        Some(path) => Config::from_path(path),
        None => Ok(Config::default()),
    }
}

#[derive(Debug, StructOpt)]
/// Filter command and parameters.
///
/// ```sh
/// textsieve filter corpus/ filtered/ --keywords ads.txt -t 8
/// ```
///
/// Accepted documents land in `filtered/`, audit records in `filtered/results/`
/// and counters in `filtered/stats.json`.
pub struct Filter {
    #[structopt(parse(from_os_str), help = "source directory")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination directory")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "*.txt", help = "glob pattern of source documents")]
    pub pattern: String,
    #[structopt(long, short = "c", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(long, parse(from_os_str), help = "keyword file (repeatable)")]
    pub keywords: Vec<PathBuf>,
    #[structopt(short = "t", help = "number of worker threads")]
    pub workers: Option<usize>,
    #[structopt(long, help = "remove repeated passages before scoring")]
    pub remove_repeats: bool,
    #[structopt(long, help = "minimum length (in chars) of a removed repeat")]
    pub min_repeat_length: Option<usize>,
}

impl Filter {
    /// Configuration file with the command line overrides applied.
    pub fn config(&self) -> Result<Config, Error> {
        let mut config = load_config(self.config.as_deref())?;
        config.features.keyword_paths.extend(self.keywords.iter().cloned());
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.remove_repeats {
            config.dedup.remove_repeats = true;
        }
        if let Some(len) = self.min_repeat_length {
            config.dedup.min_repeat_length = len;
        }
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
/// Redact command and parameters.
pub struct Redact {
    #[structopt(parse(from_os_str), help = "source directory")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination directory")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "*.txt", help = "glob pattern of source documents")]
    pub pattern: String,
    #[structopt(long, short = "c", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(long, parse(from_os_str), help = "keyword file (repeatable)")]
    pub keywords: Vec<PathBuf>,
    #[structopt(long, help = "replacement char")]
    pub replacement: Option<char>,
    #[structopt(long, help = "use the Aho-Corasick matcher")]
    pub aho_corasick: bool,
    #[structopt(short = "t", help = "number of worker threads")]
    pub workers: Option<usize>,
}

impl Redact {
    pub fn config(&self) -> Result<Config, Error> {
        let mut config = load_config(self.config.as_deref())?;
        config.features.keyword_paths.extend(self.keywords.iter().cloned());
        if let Some(replacement) = self.replacement {
            config.features.replacement = replacement;
        }
        if self.aho_corasick {
            config.features.strategy = MatchStrategy::AhoCorasick;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
/// Dedup command and parameters.
pub struct Dedup {
    #[structopt(parse(from_os_str), help = "source directory")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination directory")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "*.txt", help = "glob pattern of source documents")]
    pub pattern: String,
    #[structopt(long, short = "c", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(long, help = "minimum length (in chars) of a removed repeat")]
    pub min_repeat_length: Option<usize>,
    #[structopt(short = "t", help = "number of worker threads")]
    pub workers: Option<usize>,
}

impl Dedup {
    pub fn config(&self) -> Result<Config, Error> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(len) = self.min_repeat_length {
            config.dedup.min_repeat_length = len;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
/// Index command and parameters.
///
/// ```sh
/// textsieve index corpus/ index.json --endpoint http://localhost:8080/embed
/// ```
///
/// The resulting file is the `clustering.indexPath` of later filter runs.
pub struct Index {
    #[structopt(parse(from_os_str), help = "source directory")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "embedding index file (JSON)")]
    pub dst: PathBuf,
    #[structopt(long, default_value = "*.txt", help = "glob pattern of source documents")]
    pub pattern: String,
    #[structopt(long, short = "c", parse(from_os_str), help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[structopt(long, help = "embedding service URL")]
    pub endpoint: Option<String>,
}

impl Index {
    pub fn config(&self) -> Result<Config, Error> {
        let mut config = load_config(self.config.as_deref())?;
        if self.endpoint.is_some() {
            config.clustering.endpoint = self.endpoint.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, StructOpt)]
pub struct MergeKeywords {
    #[structopt(parse(from_os_str), help = "directory of keyword lists (*.txt)")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "merged keyword file")]
    pub dst: PathBuf,
    #[structopt(long, help = "keep first-seen order instead of sorting")]
    pub no_sort: bool,
}

#[derive(Debug, StructOpt)]
/// Download command and parameters.
///
/// Interrupted transfers are resumed when the command is run again
/// with the same destination.
pub struct Download {
    #[structopt(parse(from_os_str), help = "path to a .paths file")]
    pub paths_file: PathBuf,
    #[structopt(parse(from_os_str), help = "download destination")]
    pub dst: PathBuf,
    #[structopt(short = "t", help = "number of concurrent transfers. Default is 4.")]
    pub n_tasks: Option<usize>,
    #[structopt(short = "o", help = "number of files to skip. Default is 0.")]
    pub offset: Option<usize>,
    #[structopt(
        long,
        default_value = "https://data.commoncrawl.org/",
        help = "prefix of every path"
    )]
    pub base_url: String,
    #[structopt(long, default_value = "60", help = "read timeout, in seconds")]
    pub read_timeout: u64,
}
