use crate::document::DocumentId;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// A stop word contains control bytes.
    #[error("stop word {0:?} is invalid")]
    InvalidStopWord(String),
    /// Negative id, or an id that is already indexed.
    #[error("invalid document id {0}")]
    InvalidDocumentId(DocumentId),
    /// A document word contains control bytes.
    #[error("word {0:?} is invalid")]
    InvalidWord(String),
    /// Empty query word, bare `-`, `--word`, or control bytes.
    #[error("query word {0:?} is invalid")]
    InvalidQueryWord(String),
    #[error("query is empty")]
    EmptyQuery,
    #[error("document {0} is not indexed")]
    UnknownDocument(DocumentId),
}
