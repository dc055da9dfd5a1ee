//! Character tokenizer for `${...}` syntax
//!
//! A cursor over an immutable buffer, used by the expression translator to
//! split values into literal runs and expression runs.

/// Scans a string one character at a time.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    chars: Vec<char>,
    index: usize,
}

impl Tokenizer {
    /// Creates a tokenizer with the cursor at the start of `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
        }
    }

    /// Returns the character at the cursor and advances past it.
    /// Returns `None` at end of input.
    pub fn next(&mut self) -> Option<char> {
        let ch = self.chars.get(self.index).copied();
        if ch.is_some() {
            self.index += 1;
        }
        ch
    }

    /// Returns the character at the cursor without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    /// Consumes characters until `stop` is found.
    ///
    /// Returns the consumed span without `stop` and leaves the cursor just
    /// past it. Returns `None` (not an empty span) when the input ends first;
    /// the cursor is then at end of input.
    pub fn next_until(&mut self, stop: char) -> Option<String> {
        let mut span = String::new();
        loop {
            match self.next() {
                None => return None,
                Some(ch) if ch == stop => return Some(span),
                Some(ch) => span.push(ch),
            }
        }
    }

    /// Returns everything from the cursor to the end and moves the cursor to
    /// the end.
    pub fn eof(&mut self) -> String {
        let rest = self.chars[self.index.min(self.chars.len())..].iter().collect();
        self.index = self.chars.len();
        rest
    }

    /// Current cursor position, in characters.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index
    }

    /// Moves the cursor back to a position previously returned by
    /// [`Tokenizer::position`].
    pub fn rewind(&mut self, position: usize) {
        self.index = position.min(self.chars.len());
    }
}
