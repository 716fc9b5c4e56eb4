use criterion::{black_box, criterion_group, criterion_main, Criterion};
use textsieve::config::MatchStrategy;
use textsieve::matching::{Matcher, PatternMatcher};

pub fn redact(c: &mut Criterion) {
    let keywords: Vec<String> = (0..2000).map(|i| format!("关键词{}号", i)).collect();
    let text = "这是一段普通的文本，其中偶尔出现关键词42号和关键词1999号，其余部分都是正常内容。".repeat(200);

    for (name, strategy) in [
        ("redact_trie", MatchStrategy::Trie),
        ("redact_aho_corasick", MatchStrategy::AhoCorasick),
    ] {
        let matcher = Matcher::with_keywords(strategy, &keywords);
        c.bench_function(name, |b| b.iter(|| matcher.filter(black_box(&text), '*')));
    }
}

criterion_group!(benches, redact);
criterion_main!(benches);
