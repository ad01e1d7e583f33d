//! Validation of the user-supplied topic before any remote call.

use thiserror::Error;

pub const MAX_TOPIC_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("Please enter a word or summary to start the indexing search.")]
    Empty,
    #[error("Please limit your input to {max} characters.")]
    TooLong { chars: usize, max: usize },
}

/// A topic of 1..=200 characters, kept exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    /// Length is counted in `char`s. Whitespace-only input counts as empty.
    pub fn parse(raw: &str) -> Result<Self, TopicError> {
        if raw.trim().is_empty() {
            return Err(TopicError::Empty);
        }
        let chars = raw.chars().count();
        if chars > MAX_TOPIC_CHARS {
            return Err(TopicError::TooLong { chars, max: MAX_TOPIC_CHARS });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// The first `n` characters, never splitting a code point.
    pub fn preview(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}
