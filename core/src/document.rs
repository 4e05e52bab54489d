use serde::{Deserialize, Serialize};
use std::fmt;

pub type DocumentId = i32;

/// Upper bound on the number of documents returned by a ranked query.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;

/// Relevance values closer than this are treated as equal when ranking.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// One row of a ranked result.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub relevance: f64,
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocumentId, relevance: f64, rating: i32) -> Self {
        Self { id, relevance, rating }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}

/// Per-document data kept alongside the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMeta {
    pub rating: i32,
    pub status: DocumentStatus,
}

/// Truncating integer mean; 0 for no ratings.
pub fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}
