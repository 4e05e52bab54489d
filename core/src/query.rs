use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};

/// Parsed query. Words borrow from the raw query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
    is_stop: bool,
}

fn parse_query_word<'a>(text: &'a str, stop_words: &StopWords) -> Result<QueryWord<'a>> {
    if text.is_empty() {
        return Err(SearchError::InvalidQueryWord(text.to_string()));
    }
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() || data.starts_with('-') || !is_valid_word(data) {
        return Err(SearchError::InvalidQueryWord(text.to_string()));
    }
    Ok(QueryWord { data, is_minus, is_stop: stop_words.contains(data) })
}

/// Split a raw query into plus and minus words, dropping stop words.
///
/// With `dedup` both lists come back sorted and free of duplicates; otherwise
/// they keep query order.
pub fn parse_query<'a>(text: &'a str, stop_words: &StopWords, dedup: bool) -> Result<Query<'a>> {
    let mut query = Query::default();
    for word in split_into_words(text) {
        let word = parse_query_word(word, stop_words)?;
        if word.is_stop {
            continue;
        }
        if word.is_minus {
            query.minus_words.push(word.data);
        } else {
            query.plus_words.push(word.data);
        }
    }
    if dedup {
        for words in [&mut query.plus_words, &mut query.minus_words] {
            words.sort_unstable();
            words.dedup();
        }
    }
    Ok(query)
}
