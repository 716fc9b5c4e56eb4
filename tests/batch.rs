use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use textsieve::config::{Config, DedupConfig, FeatureConfig, PipelineConfig};
use textsieve::error::Error;
use textsieve::io::{DirSink, DirSource};
use textsieve::pipelines::{
    BatchProcessor, Dedup, FilterStats, Pipeline, QualityFilter, QualityPipeline, Redaction,
    RewriteStats,
};
use textsieve::scorers::{Details, Scorer};

const GOOD_TEXT: &str = "春天来了，公园里的桃花和杏花都开放了，空气中弥漫着淡淡的清香。
许多市民趁着周末的好天气，带着孩子来到湖边散步、放风筝，享受难得的悠闲时光。
湖面上几只白鹭时而低飞时而停在岸边的石头上，引得游客纷纷拿出相机拍照留念。
管理处的工作人员介绍说，今年园内新种植了三千多株樱花树，预计下个月进入最佳观赏期。";

const SPAM_TEXT: &str = "点击链接领取免费优惠";

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Scores 1 when the text says "good", 0 otherwise.
struct Keyword;

impl Scorer for Keyword {
    fn check(&self, text: &str) -> Result<(bool, Details), Error> {
        Ok((text.contains("good"), Details::new()))
    }

    fn score(&self, text: &str) -> Result<f64, Error> {
        Ok(if text.contains("good") { 1.0 } else { 0.0 })
    }
}

#[test_log::test]
fn failures_are_counted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir(&src).unwrap();

    let contents = ["good", "bad", "good", "good", "bad", "good", "bad", "good"];
    for (i, text) in contents.iter().enumerate() {
        fs::write(src.join(format!("{}.txt", i)), text).unwrap();
    }
    // matched by the pattern, unreadable
    fs::create_dir(src.join("8.txt")).unwrap();
    fs::create_dir(src.join("9.txt")).unwrap();

    let scorer = Keyword;
    let pipeline = QualityPipeline::new(&PipelineConfig::default()).with_perplexity(&scorer);
    let stats = BatchProcessor::new(Some(3))
        .unwrap()
        .filter(
            &DirSource::new(&src, "*.txt"),
            &DirSink::new(&dst).unwrap(),
            &[],
            &pipeline,
        )
        .unwrap();

    assert_eq!(
        stats,
        FilterStats {
            total: 10,
            accepted: 5,
            rejected: 3,
            errored: 2
        }
    );

    let saved = read_json(&dst.join("stats.json"));
    assert_eq!(saved["total"], Value::from(10));
    assert_eq!(saved["accepted"], Value::from(5));
    assert_eq!(saved["rejected"], Value::from(3));
    assert_eq!(saved["errored"], Value::from(2));

    assert_eq!(fs::read_dir(dst.join("results")).unwrap().count(), 8);
    assert_eq!(fs::read_to_string(dst.join("0.txt")).unwrap(), "good");
    assert!(!dst.join("1.txt").exists());

    let record = read_json(&dst.join("results").join("1.txt.json"));
    assert_eq!(record["accepted"], Value::from(false));
    assert_eq!(record["compositeScore"], Value::from(0.0));
}

#[test]
fn quality_filter() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("good.txt"), GOOD_TEXT).unwrap();
    fs::write(src.join("spam.txt"), SPAM_TEXT).unwrap();

    let mut config = Config::default();
    // missing keyword files are skipped
    config.features.keyword_paths = vec![dir.path().join("missing.txt")];
    let stats = QualityFilter::new(src, dst.clone(), "*.txt".to_string(), config)
        .run()
        .unwrap();

    assert_eq!(
        stats,
        FilterStats {
            total: 2,
            accepted: 1,
            rejected: 1,
            errored: 0
        }
    );
    assert_eq!(fs::read_to_string(dst.join("good.txt")).unwrap(), GOOD_TEXT);
    assert!(!dst.join("spam.txt").exists());

    let record = read_json(&dst.join("results").join("spam.txt.json"));
    assert_eq!(
        record["reasons"]["rule"]["checks"]["length_check"]["passed"],
        Value::from(false)
    );
    assert!(record["componentScores"]["rule"].is_number());
    assert!(record["componentScores"].get("perplexity").is_none());
}

#[test]
fn config_file_drives_the_filter() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("spam.txt"), SPAM_TEXT).unwrap();

    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"pipeline": {"qualityThreshold": 0.0, "enableFeatures": false}}"#,
    )
    .unwrap();
    let config = Config::from_path(&config_path).unwrap();

    let stats = QualityFilter::new(src, dst.clone(), "*.txt".to_string(), config)
        .run()
        .unwrap();
    assert_eq!(stats.accepted, 1);

    let record = read_json(&dst.join("results").join("spam.txt.json"));
    assert!(record["componentScores"].get("feature").is_none());
}

#[test]
fn redaction() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), "这是敏感词示例").unwrap();
    fs::write(src.join("b.txt"), "Nothing to HIDE here").unwrap();

    let keywords = dir.path().join("keywords.txt");
    fs::write(&keywords, "敏感词\n\n  hide  \n").unwrap();

    let features = FeatureConfig {
        keyword_paths: vec![keywords],
        ..Default::default()
    };
    let stats = Redaction::new(src, dst.clone(), "*.txt".to_string(), features, Some(2))
        .run()
        .unwrap();

    assert_eq!(
        stats,
        RewriteStats {
            total: 2,
            processed: 2,
            errored: 0
        }
    );
    assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "这是***示例");
    assert_eq!(
        fs::read_to_string(dst.join("b.txt")).unwrap(),
        "Nothing to **** here"
    );
    let saved = read_json(&dst.join("filter_stats.json"));
    assert_eq!(saved["processed"], Value::from(2));
}

#[test]
fn dedup_compressed_input() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir(&src).unwrap();

    let mut enc = GzEncoder::new(
        fs::File::create(src.join("a.txt.gz")).unwrap(),
        Compression::default(),
    );
    enc.write_all("abcdefghijklmnopqrstu".repeat(2).as_bytes())
        .unwrap();
    enc.finish().unwrap();
    fs::write(src.join("b.txt.gz"), b"not gzip").unwrap();

    let stats = Dedup::new(
        src,
        dst.clone(),
        "*.gz".to_string(),
        DedupConfig::default(),
        None,
    )
    .run()
    .unwrap();

    assert_eq!(
        stats,
        RewriteStats {
            total: 2,
            processed: 1,
            errored: 1
        }
    );
    assert_eq!(
        fs::read_to_string(dst.join("a.txt")).unwrap(),
        "abcdefghijklmnopqrstu"
    );
}

#[test]
fn same_file_name_in_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(src.join("x")).unwrap();
    fs::create_dir_all(src.join("y")).unwrap();
    fs::write(src.join("x").join("a.txt"), "first").unwrap();
    fs::write(src.join("y").join("a.txt"), "second").unwrap();

    let config = PipelineConfig {
        quality_threshold: 0.0,
        ..Default::default()
    };
    let stats = BatchProcessor::new(Some(2))
        .unwrap()
        .filter(
            &DirSource::new(&src, "**/*.txt"),
            &DirSink::new(&dst).unwrap(),
            &[],
            &QualityPipeline::new(&config),
        )
        .unwrap();

    assert_eq!(stats.accepted, 2);
    assert_eq!(fs::read_to_string(dst.join("x").join("a.txt")).unwrap(), "first");
    assert_eq!(fs::read_to_string(dst.join("y").join("a.txt")).unwrap(), "second");
    assert!(dst.join("results/x/a.txt.json").is_file());
    assert!(dst.join("results/y/a.txt.json").is_file());
}

#[test]
fn compressed_twin_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.txt"), "plain").unwrap();
    let mut enc = GzEncoder::new(
        fs::File::create(src.join("a.txt.gz")).unwrap(),
        Compression::default(),
    );
    enc.write_all(b"compressed").unwrap();
    enc.finish().unwrap();

    let stats = Dedup::new(
        src,
        dst.clone(),
        "a.txt*".to_string(),
        DedupConfig::default(),
        Some(2),
    )
    .run()
    .unwrap();

    assert_eq!(
        stats,
        RewriteStats {
            total: 2,
            processed: 1,
            errored: 1
        }
    );
    assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "plain");
    assert!(!dst.join("results").exists());
}
