use crate::error::{Result, SearchError};
use std::collections::BTreeSet;

/// Split text into maximal runs of non-whitespace, left to right.
///
/// The returned iterator borrows from `text` and is consumed in a single pass;
/// no validation happens here.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split_whitespace()
}

/// A word is valid when it carries no control bytes (`0x00`..`0x1F`).
pub fn is_valid_word(word: &str) -> bool {
    !word.bytes().any(|b| b < b' ')
}

/// Immutable set of words ignored during indexing and querying.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    /// Build from any collection of words. Empty strings are dropped and
    /// duplicates merged before validation.
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if let Some(bad) = words.iter().find(|w| !is_valid_word(w)) {
            return Err(SearchError::InvalidStopWord(bad.clone()));
        }
        Ok(Self { words })
    }

    /// Build from a whitespace separated list, e.g. `"and in at"`.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.iter().map(String::as_str)
    }
}
