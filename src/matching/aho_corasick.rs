//! Aho-Corasick automaton.
use std::collections::{HashMap, VecDeque};
use std::hash::BuildHasherDefault;

use log::debug;
use twox_hash::XxHash64;

use super::{normalize_keyword, Match, PatternMatcher};

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<char, usize, BuildHasherDefault<XxHash64>>,
    fail: usize,
    /// Lengths of the keywords ending here, including those of the failure chain.
    outputs: Vec<usize>,
}

/// Trie with failure links.
///
/// [PatternMatcher::build] must be called after the last [PatternMatcher::add],
/// otherwise only keywords found by a plain walk from the root are reported.
#[derive(Debug, Clone)]
pub struct AhoCorasick {
    nodes: Vec<Node>,
    keywords: usize,
}

impl Default for AhoCorasick {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            keywords: 0,
        }
    }
}

impl AhoCorasick {
    pub fn len(&self) -> usize {
        self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords == 0
    }

    fn goto(&self, mut node: usize, c: char) -> usize {
        loop {
            if let Some(next) = self.nodes[node].children.get(&c) {
                return *next;
            }
            if node == 0 {
                return 0;
            }
            node = self.nodes[node].fail;
        }
    }

    /// Every keyword occurrence, as `(start, end)` in scan order of `end`.
    pub fn find_all(&self, folded: &[char]) -> Vec<Match> {
        let mut node = 0;
        let mut all = Vec::new();
        for (pos, c) in folded.iter().enumerate() {
            node = self.goto(node, *c);
            all.extend(self.nodes[node].outputs.iter().map(|len| Match {
                start: pos + 1 - len,
                end: pos + 1,
            }));
        }
        all
    }
}

impl PatternMatcher for AhoCorasick {
    fn add(&mut self, keyword: &str) {
        let keyword = match normalize_keyword(keyword) {
            Some(k) => k,
            None => return,
        };
        let len = keyword.len();
        let mut node = 0;
        for c in keyword {
            node = match self.nodes[node].children.get(&c) {
                Some(next) => *next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(c, next);
                    next
                }
            };
        }
        if !self.nodes[node].outputs.contains(&len) {
            self.nodes[node].outputs.push(len);
            self.keywords += 1;
        }
    }

    /// Breadth-first construction of the failure links.
    fn build(&mut self) {
        let mut queue: VecDeque<usize> = self.nodes[0].children.values().copied().collect();
        for child in queue.iter() {
            self.nodes[*child].fail = 0;
        }

        while let Some(node) = queue.pop_front() {
            let children: Vec<(char, usize)> = self.nodes[node]
                .children
                .iter()
                .map(|(c, n)| (*c, *n))
                .collect();
            for (c, child) in children {
                let fail = self.goto(self.nodes[node].fail, c);
                self.nodes[child].fail = fail;
                let inherited = self.nodes[fail].outputs.clone();
                for len in inherited {
                    if !self.nodes[child].outputs.contains(&len) {
                        self.nodes[child].outputs.push(len);
                    }
                }
                queue.push_back(child);
            }
        }
        debug!(
            "built Aho-Corasick automaton: {} keywords, {} nodes",
            self.keywords,
            self.nodes.len()
        );
    }

    fn find(&self, folded: &[char]) -> Vec<Match> {
        // shortest keyword per start position: ends are scanned in
        // increasing order, so the first end seen for a start is the smallest.
        let mut shortest: Vec<Option<usize>> = vec![None; folded.len()];
        for m in self.find_all(folded) {
            shortest[m.start].get_or_insert(m.end);
        }

        let mut matches = Vec::new();
        let mut start = 0;
        while start < folded.len() {
            match shortest[start] {
                Some(end) => {
                    matches.push(Match { start, end });
                    start = end;
                }
                None => start += 1,
            }
        }
        matches
    }
}
