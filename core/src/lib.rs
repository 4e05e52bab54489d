//! In-process full-text search over short documents.
//!
//! Documents are indexed word by word after stop-word removal and ranked by
//! TF-IDF against plus/minus keyword queries. Ranking, matching and removal
//! run either sequentially or fanned out over a rayon pool; the parallel
//! ranking path aggregates scores through a sharded [`ConcurrentMap`].

pub mod concurrent_map;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod paginator;
pub mod process_queries;
pub mod query;
pub mod remove_duplicates;
pub mod request_queue;
pub mod search_server;
pub mod tokenizer;

pub use concurrent_map::ConcurrentMap;
pub use config::EngineConfig;
pub use document::{Document, DocumentId, DocumentStatus, MAX_RESULT_DOCUMENT_COUNT};
pub use error::{Result, SearchError};
pub use paginator::{paginate, Paginator};
pub use process_queries::{process_queries, process_queries_joined};
pub use remove_duplicates::{find_duplicates, remove_duplicates};
pub use request_queue::RequestQueue;
pub use search_server::{ExecutionPolicy, SearchServer};
pub use tokenizer::StopWords;
