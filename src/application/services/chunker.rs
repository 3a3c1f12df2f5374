use std::sync::Arc;

use regex::Regex;

use crate::application::ports::Tokenizer;
use crate::application::ports::tokenizer::{ceil_boundary, floor_boundary};

/// Boundary strength; lower is preferred as a cut point.
const FORM_FEED: u8 = 0;
const HARD_CUT: u8 = 5;

/// Separators in preference order. Each match stays attached to the text
/// before it, together with any whitespace that follows.
const SEPARATORS: [&str; 5] = [
    r"\x0c\s*",
    r"\n[ \t]*\n\s*",
    r"\n\s*",
    r"[.!?]+\s+|。\s*",
    r"\s+",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_tokens: 64,
            max_tokens: 512,
            overlap_tokens: 76,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub content: String,
    pub token_count: usize,
    /// Leading bytes of `content` repeated from the previous chunk.
    pub overlap_bytes: usize,
}

impl TextChunk {
    /// The part of the chunk not shared with its predecessor.
    pub fn fresh_text(&self) -> &str {
        &self.content[self.overlap_bytes..]
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    tokens: usize,
    /// Strength of the boundary at `end`.
    strength: u8,
}

pub struct Chunker {
    tokenizer: Arc<dyn Tokenizer>,
    config: ChunkerConfig,
    separators: Vec<Regex>,
}

impl Chunker {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, config: ChunkerConfig) -> Result<Self, regex::Error> {
        let separators = SEPARATORS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tokenizer,
            config,
            separators,
        })
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let max = self.config.max_tokens.max(1);
        let overlap = self.config.overlap_tokens.min(max - 1);
        let piece_limit = (max - overlap).max(1);
        let floor = self.config.min_tokens.max(max / 2);

        let mut pieces = Vec::new();
        self.segment(text, 0, text.len(), 0, FORM_FEED, piece_limit, &mut pieces);

        let mut chunks = Vec::new();
        let mut next = 0usize;
        let mut overlap_start = 0usize;

        while next < pieces.len() {
            let body_start = pieces[next].start;
            let overlap_tokens = if overlap_start < body_start {
                self.tokenizer.count(&text[overlap_start..body_start])
            } else {
                0
            };

            let mut last = self.choose_cut(&pieces, next, overlap_tokens, max, floor);

            let mut content_start = overlap_start;
            let mut tokens = self.tokenizer.count(&text[content_start..pieces[last].end]);
            while tokens > max && last > next {
                last -= 1;
                tokens = self.tokenizer.count(&text[content_start..pieces[last].end]);
            }
            if tokens > max && content_start < body_start {
                content_start = body_start;
                tokens = self.tokenizer.count(&text[content_start..pieces[last].end]);
            }

            while tokens < self.config.min_tokens && last + 1 < pieces.len() {
                match self.fill(text, &mut pieces, content_start, last, tokens, max) {
                    Some(filled) => {
                        last += 1;
                        tokens = filled;
                    }
                    None => break,
                }
            }

            let end = pieces[last].end;
            if !text[body_start..end].trim().is_empty() {
                chunks.push(TextChunk {
                    content: text[content_start..end].to_string(),
                    token_count: tokens,
                    overlap_bytes: body_start - content_start,
                });
            }

            next = last + 1;
            overlap_start = if overlap == 0 {
                end
            } else {
                self.overlap_start(text, content_start, end, overlap)
            };
        }

        chunks
    }

    /// Picks the last piece of the chunk starting at `first`: the whole
    /// remainder when it fits, otherwise the strongest boundary whose chunk
    /// reaches `floor` tokens.
    fn choose_cut(
        &self,
        pieces: &[Piece],
        first: usize,
        overlap_tokens: usize,
        max: usize,
        floor: usize,
    ) -> usize {
        let mut estimate = overlap_tokens;
        let mut fitting = Vec::new();
        for (index, piece) in pieces.iter().enumerate().skip(first) {
            estimate += piece.tokens;
            if index > first && estimate > max {
                break;
            }
            fitting.push((index, estimate, piece.strength));
        }

        let (last_index, _, _) = fitting[fitting.len() - 1];
        if last_index + 1 == pieces.len() {
            return last_index;
        }

        fitting
            .iter()
            .filter(|(_, estimate, _)| *estimate >= floor)
            .min_by(|a, b| a.2.cmp(&b.2).then(b.0.cmp(&a.0)))
            .map(|(index, _, _)| *index)
            .unwrap_or(last_index)
    }

    /// Tops up an undersized chunk with a prefix of the following piece,
    /// splitting that piece in two. Returns the new token count.
    fn fill(
        &self,
        text: &str,
        pieces: &mut Vec<Piece>,
        content_start: usize,
        last: usize,
        tokens: usize,
        max: usize,
    ) -> Option<usize> {
        let following = pieces[last + 1];
        let mut room = max.saturating_sub(tokens);

        while room > 0 {
            let take = self
                .tokenizer
                .prefix_len(&text[following.start..following.end], room);
            if take == 0 {
                return None;
            }

            let cut = following.start + take;
            let filled = self.tokenizer.count(&text[content_start..cut]);
            if filled <= max {
                if cut < following.end {
                    let head = Piece {
                        start: following.start,
                        end: cut,
                        tokens: self.tokenizer.count(&text[following.start..cut]),
                        strength: HARD_CUT,
                    };
                    let tail = Piece {
                        start: cut,
                        tokens: self.tokenizer.count(&text[cut..following.end]),
                        ..following
                    };
                    pieces[last + 1] = head;
                    pieces.insert(last + 2, tail);
                }
                return Some(filled);
            }
            room -= (filled - max).min(room);
        }

        None
    }

    /// Start of the trailing window of `text[lower..end]` holding at most
    /// `budget` tokens, moved forward to a word boundary.
    fn overlap_start(&self, text: &str, lower: usize, end: usize, budget: usize) -> usize {
        if self.tokenizer.count(&text[lower..end]) <= budget {
            return lower;
        }

        // `fails` never fits, `fits` always does.
        let mut fails = lower;
        let mut fits = end;
        loop {
            let mut mid = floor_boundary(text, fails + (fits - fails) / 2);
            if mid <= fails {
                mid = ceil_boundary(text, fails + 1);
            }
            if mid >= fits {
                break;
            }
            if self.tokenizer.count(&text[mid..end]) <= budget {
                fits = mid;
            } else {
                fails = mid;
            }
        }

        let preceded_by_space = text[..fits]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        if preceded_by_space {
            return fits;
        }

        let window = &text[fits..end];
        match window.find(char::is_whitespace) {
            Some(space) => {
                let after = &window[space..];
                let run = after.len() - after.trim_start().len();
                fits + space + run
            }
            None => end,
        }
    }

    /// Splits `text[start..end]` into pieces of at most `limit` tokens,
    /// trying separators from `level` down to a hard cut.
    #[allow(clippy::too_many_arguments)]
    fn segment(
        &self,
        text: &str,
        start: usize,
        end: usize,
        level: usize,
        end_strength: u8,
        limit: usize,
        out: &mut Vec<Piece>,
    ) {
        if start >= end {
            return;
        }

        let tokens = self.tokenizer.count(&text[start..end]);
        if tokens <= limit {
            out.push(Piece {
                start,
                end,
                tokens,
                strength: end_strength,
            });
            return;
        }

        let Some(separator) = self.separators.get(level) else {
            self.hard_cut(text, start, end, end_strength, limit, out);
            return;
        };

        let mut bounds = Vec::new();
        let mut part_start = start;
        for found in separator.find_iter(&text[start..end]) {
            let part_end = start + found.end();
            if part_end > part_start && part_end < end {
                bounds.push((part_start, part_end));
                part_start = part_end;
            }
        }

        if bounds.is_empty() {
            self.segment(text, start, end, level + 1, end_strength, limit, out);
            return;
        }

        let strength = level as u8;
        for (part_start, part_end) in bounds {
            self.segment(text, part_start, part_end, level + 1, strength, limit, out);
        }
        self.segment(text, part_start, end, level + 1, end_strength, limit, out);
    }

    fn hard_cut(
        &self,
        text: &str,
        mut start: usize,
        end: usize,
        end_strength: u8,
        limit: usize,
        out: &mut Vec<Piece>,
    ) {
        while start < end {
            let rest = &text[start..end];
            let mut take = self.tokenizer.prefix_len(rest, limit);
            if take == 0 {
                take = rest.chars().next().map_or(rest.len(), char::len_utf8);
            }
            let cut = start + take;
            out.push(Piece {
                start,
                end: cut,
                tokens: self.tokenizer.count(&text[start..cut]),
                strength: if cut == end { end_strength } else { HARD_CUT },
            });
            start = cut;
        }
    }
}
