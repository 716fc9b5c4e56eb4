//! Prefix trie matcher.
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use twox_hash::XxHash64;

use super::{normalize_keyword, Match, PatternMatcher};

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<char, usize, BuildHasherDefault<XxHash64>>,
    terminal: bool,
}

/// Trie without failure links.
///
/// A mismatch restarts the walk at the next text position,
/// which costs `O(n * longest keyword)`.
#[derive(Debug, Clone)]
pub struct TrieWalker {
    nodes: Vec<Node>,
    keywords: usize,
}

impl Default for TrieWalker {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
            keywords: 0,
        }
    }
}

impl TrieWalker {
    pub fn len(&self) -> usize {
        self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords == 0
    }

    /// End of the shortest keyword starting at `start`.
    fn shortest_from(&self, text: &[char], start: usize) -> Option<usize> {
        let mut node = 0;
        for (offset, c) in text[start..].iter().enumerate() {
            node = *self.nodes[node].children.get(c)?;
            if self.nodes[node].terminal {
                return Some(start + offset + 1);
            }
        }
        None
    }
}

impl PatternMatcher for TrieWalker {
    fn add(&mut self, keyword: &str) {
        let keyword = match normalize_keyword(keyword) {
            Some(k) => k,
            None => return,
        };
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
        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.keywords += 1;
        }
    }

    fn find(&self, folded: &[char]) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut start = 0;
        while start < folded.len() {
            match self.shortest_from(folded, start) {
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
