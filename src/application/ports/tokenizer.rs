/// Token counting with the same encoder family as the embedding model.
pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Length in bytes of the longest prefix of `text` (on a char boundary)
    /// holding at most `max_tokens` tokens.
    fn prefix_len(&self, text: &str, max_tokens: usize) -> usize {
        if max_tokens == 0 || text.is_empty() {
            return 0;
        }
        if self.count(text) <= max_tokens {
            return text.len();
        }

        // Grow a window until it overflows, then bisect inside it.
        // Invariant: `low` fits and `high` does not.
        let mut low = 0usize;
        let mut high = floor_boundary(text, (max_tokens * 4).max(4));
        while high < text.len() && self.count(&text[..high]) <= max_tokens {
            low = high;
            high = floor_boundary(text, high.saturating_mul(2));
        }

        loop {
            let mut mid = floor_boundary(text, low + (high - low) / 2);
            if mid <= low {
                mid = ceil_boundary(text, low + 1);
            }
            if mid >= high {
                return low;
            }
            if self.count(&text[..mid]) <= max_tokens {
                low = mid;
            } else {
                high = mid;
            }
        }
    }
}

pub(crate) fn floor_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub(crate) fn ceil_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
