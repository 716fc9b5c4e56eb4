/*! Suffix automaton over a char sequence.

States live in an arena and refer to each other by index. Index `0` is the
initial state.

When the state of the prefix ending at position `e` is created, its suffix
link is the state of the longest suffix of that prefix which already
occurred *ending before* `e`. The length of that link is recorded per
position: every suffix ending at `e` up to that length is a repeat of an
earlier occurrence, every longer one is new. Repeat removal only needs these
lengths, which keeps the automaton linear in memory even on periodic text.
!*/
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use twox_hash::XxHash64;

type Transitions = HashMap<char, usize, BuildHasherDefault<XxHash64>>;

#[derive(Debug, Default, Clone)]
struct State {
    len: usize,
    link: Option<usize>,
    next: Transitions,
}

/// Online suffix automaton (one per document).
#[derive(Debug, Clone)]
pub struct SuffixAutomaton {
    states: Vec<State>,
    last: usize,
    // (end position, length of the longest suffix seen earlier)
    repeats: Vec<(usize, usize)>,
}

impl Default for SuffixAutomaton {
    fn default() -> Self {
        Self {
            states: vec![State::default()],
            last: 0,
            repeats: Vec::new(),
        }
    }
}

impl SuffixAutomaton {
    /// Build the automaton of the whole sequence.
    pub fn build(text: &[char]) -> Self {
        let mut sam = Self::default();
        for (pos, c) in text.iter().enumerate() {
            sam.extend(*c, pos);
        }
        sam
    }

    /// Append `c`, found at position `pos` of the source text.
    pub fn extend(&mut self, c: char, pos: usize) {
        let cur = self.states.len();
        self.states.push(State {
            len: self.states[self.last].len + 1,
            link: None,
            next: Transitions::default(),
        });

        let mut p = Some(self.last);
        while let Some(pi) = p {
            if self.states[pi].next.contains_key(&c) {
                break;
            }
            self.states[pi].next.insert(c, cur);
            p = self.states[pi].link;
        }

        let repeated = match p {
            None => {
                self.states[cur].link = Some(0);
                0
            }
            Some(pi) => {
                let q = self.states[pi].next[&c];
                if self.states[pi].len + 1 == self.states[q].len {
                    self.states[cur].link = Some(q);
                } else {
                    let clone = self.states.len();
                    let cloned = State {
                        len: self.states[pi].len + 1,
                        link: self.states[q].link,
                        next: self.states[q].next.clone(),
                    };
                    self.states.push(cloned);

                    let mut p = Some(pi);
                    while let Some(pj) = p {
                        if self.states[pj].next.get(&c) != Some(&q) {
                            break;
                        }
                        self.states[pj].next.insert(c, clone);
                        p = self.states[pj].link;
                    }
                    self.states[q].link = Some(clone);
                    self.states[cur].link = Some(clone);
                }
                self.states[pi].len + 1
            }
        };
        self.repeats.push((pos, repeated));
        self.last = cur;
    }

    /// Length of the longest substring ending at each position that already
    /// ended at an earlier position, in text order.
    pub fn repeat_lengths(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.repeats.iter().copied()
    }

    /// Every occurrence of a substring of length `>= min_len` that is not its
    /// first occurrence, as half-open char ranges.
    ///
    /// Occurrences ending at the same position are nested, so only the longest
    /// one is returned. The union of the ranges is the union of all such
    /// occurrences.
    pub fn repeated_occurrences(&self, min_len: usize) -> Vec<(usize, usize)> {
        self.repeat_lengths()
            .filter(|(_, len)| *len >= min_len.max(1))
            .map(|(end, len)| (end + 1 - len, end + 1))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.len() == 1
    }
}
