//! The search engine facade.
//!
//! Ranking, matching and removal each take an [`ExecutionPolicy`]. The
//! sequential path aggregates into a plain ordered map; the parallel path fans
//! plus words and then minus words across the worker pool, aggregating through
//! a [`ConcurrentMap`].
//!
//! The engine has no internal reader/writer isolation: callers must not run
//! `add_document`/`remove_document` concurrently with queries on one instance.
//! Rust's borrow rules enforce this for plain references.

use crate::concurrent_map::ConcurrentMap;
use crate::config::EngineConfig;
use crate::document::{
    compute_average_rating, Document, DocumentId, DocumentMeta, DocumentStatus,
    MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON,
};
use crate::error::{Result, SearchError};
use crate::index::{DocumentIds, InvertedIndex};
use crate::query::{parse_query, Query};
use crate::tokenizer::{is_valid_word, split_into_words, StopWords};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    Parallel,
}

pub struct SearchServer {
    stop_words: StopWords,
    index: InvertedIndex,
    config: EngineConfig,
    pool: Option<ThreadPool>,
}

impl SearchServer {
    /// Engine with stop words given as whitespace separated text.
    pub fn new(stop_words_text: &str) -> Result<Self> {
        Ok(Self::with_config(StopWords::from_text(stop_words_text)?, EngineConfig::default()))
    }

    /// Engine with stop words from any collection of strings.
    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_config(StopWords::new(stop_words)?, EngineConfig::default()))
    }

    pub fn with_config(stop_words: StopWords, config: EngineConfig) -> Self {
        let pool = config.worker_threads.and_then(|threads| {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => Some(pool),
                Err(err) => {
                    tracing::warn!(threads, error = %err, "worker pool unavailable, using global pool");
                    None
                }
            }
        });
        Self { stop_words, index: InvertedIndex::new(), config, pool }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Run `op` on the engine's worker pool, or on the global pool if none.
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        install(self.pool.as_ref(), op)
    }

    fn split_into_words_no_stop<'a>(&self, text: &'a str) -> Result<Vec<&'a str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    /// Index a document. The text is validated completely before anything is
    /// written, so a failed add leaves the engine untouched.
    pub fn add_document(
        &mut self,
        id: DocumentId,
        text: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if id < 0 || self.index.is_live(id) {
            return Err(SearchError::InvalidDocumentId(id));
        }
        let words = self.split_into_words_no_stop(text)?;
        let meta = DocumentMeta { rating: compute_average_rating(ratings), status };
        self.index.insert(id, &words, meta);
        tracing::debug!(document_id = id, words = words.len(), "added document");
        Ok(())
    }

    pub fn remove_document(&mut self, id: DocumentId) {
        self.remove_document_with(ExecutionPolicy::Sequential, id);
    }

    /// Erase a document everywhere. Unknown ids are ignored.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, id: DocumentId) {
        let removed = match policy {
            ExecutionPolicy::Sequential => self.index.remove(id),
            ExecutionPolicy::Parallel => {
                let index = &mut self.index;
                install(self.pool.as_ref(), || index.remove_parallel(id))
            }
        };
        if removed {
            tracing::debug!(document_id = id, ?policy, "removed document");
        }
    }

    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }

    /// Live document ids in ascending order.
    pub fn document_ids(&self) -> DocumentIds<'_> {
        self.index.document_ids()
    }

    /// Word to term frequency for `id`; empty if `id` is not indexed.
    pub fn word_frequencies(&self, id: DocumentId) -> BTreeMap<&str, f64> {
        self.index.word_frequencies(id)
    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    /// Rank documents against `raw_query`, keeping those accepted by
    /// `predicate` and free of every minus word. At most
    /// [`MAX_RESULT_DOCUMENT_COUNT`] results, best first.
    pub fn find_top_documents_with<P>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = parse_query(raw_query, &self.stop_words, true)?;
        let mut documents = match policy {
            ExecutionPolicy::Sequential => self.find_all_documents(&query, &predicate),
            ExecutionPolicy::Parallel => {
                self.install(|| self.find_all_documents_parallel(&query, &predicate))
            }
        };
        let hits = documents.len();
        match policy {
            ExecutionPolicy::Sequential => sort_by_rank(&mut documents),
            ExecutionPolicy::Parallel => self.install(|| par_sort_by_rank(&mut documents)),
        }
        documents.truncate(MAX_RESULT_DOCUMENT_COUNT);
        tracing::debug!(?policy, hits, returned = documents.len(), "ranked query");
        Ok(documents)
    }

    fn find_all_documents<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(term) = self.index.term_id(word) else { continue };
            let Some(idf) = self.index.inverse_document_freq(term) else { continue };
            for (&id, &tf) in self.index.postings(term).iter() {
                if let Some(meta) = self.index.meta(id) {
                    if predicate(id, meta.status, meta.rating) {
                        *relevance.entry(id).or_insert(0.0) += tf * idf;
                    }
                }
            }
        }
        for word in &query.minus_words {
            let Some(term) = self.index.term_id(word) else { continue };
            for id in self.index.postings(term).keys() {
                relevance.remove(id);
            }
        }
        self.collect_documents(relevance)
    }

    fn find_all_documents_parallel<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let relevance: ConcurrentMap<DocumentId, f64> =
            ConcurrentMap::new(self.config.bucket_count());
        query.plus_words.par_iter().for_each(|word| {
            let Some(term) = self.index.term_id(word) else { return };
            let Some(idf) = self.index.inverse_document_freq(term) else { return };
            for (&id, &tf) in self.index.postings(term).iter() {
                if let Some(meta) = self.index.meta(id) {
                    if predicate(id, meta.status, meta.rating) {
                        relevance.add_or_update(id, tf * idf);
                    }
                }
            }
        });
        // Exclusion starts only after every plus word has been aggregated.
        query.minus_words.par_iter().for_each(|word| {
            let Some(term) = self.index.term_id(word) else { return };
            for id in self.index.postings(term).keys() {
                relevance.erase(*id);
            }
        });
        tracing::trace!(buckets = relevance.bucket_count(), "merging accumulator");
        self.collect_documents(relevance.into_map())
    }

    fn collect_documents(&self, relevance: BTreeMap<DocumentId, f64>) -> Vec<Document> {
        relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.index.meta(id).map(|meta| Document::new(id, relevance, meta.rating))
            })
            .collect()
    }

    pub fn match_document(
        &self,
        raw_query: &str,
        id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, id)
    }

    /// Plus words of `raw_query` present in document `id`, sorted and
    /// deduplicated. Any minus word present empties the list.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        if raw_query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let meta = *self.index.meta(id).ok_or(SearchError::UnknownDocument(id))?;
        let contains = |word: &str| {
            self.index.term_id(word).filter(|&term| self.index.contains(term, id))
        };

        let matched: Vec<&str> = match policy {
            ExecutionPolicy::Sequential => {
                let query = parse_query(raw_query, &self.stop_words, true)?;
                if query.minus_words.iter().any(|&w| contains(w).is_some()) {
                    return Ok((Vec::new(), meta.status));
                }
                query
                    .plus_words
                    .iter()
                    .filter_map(|&w| contains(w))
                    .map(|term| self.index.term(term))
                    .collect()
            }
            ExecutionPolicy::Parallel => {
                let query = parse_query(raw_query, &self.stop_words, false)?;
                self.install(|| {
                    if query.minus_words.par_iter().any(|&w| contains(w).is_some()) {
                        return Vec::new();
                    }
                    let mut matched: Vec<&str> = query
                        .plus_words
                        .par_iter()
                        .filter_map(|&w| contains(w))
                        .map(|term| self.index.term(term))
                        .collect();
                    matched.par_sort_unstable();
                    matched.dedup();
                    matched
                })
            }
        };
        Ok((matched, meta.status))
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocumentId;
    type IntoIter = DocumentIds<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.document_ids()
    }
}

fn install<R, F>(pool: Option<&ThreadPool>, op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

fn by_relevance(lhs: &Document, rhs: &Document) -> std::cmp::Ordering {
    rhs.relevance.total_cmp(&lhs.relevance)
}

/// Within a run of relevances closer than [`RELEVANCE_EPSILON`] to the run's
/// first entry, order by rating descending and then id ascending.
fn order_ties(documents: &mut [Document]) {
    let mut start = 0;
    while start < documents.len() {
        let mut end = start + 1;
        while end < documents.len()
            && documents[start].relevance - documents[end].relevance < RELEVANCE_EPSILON
        {
            end += 1;
        }
        documents[start..end].sort_by(|lhs, rhs| rhs.rating.cmp(&lhs.rating).then(lhs.id.cmp(&rhs.id)));
        start = end;
    }
}

fn sort_by_rank(documents: &mut [Document]) {
    documents.sort_by(by_relevance);
    order_ties(documents);
}

fn par_sort_by_rank(documents: &mut [Document]) {
    documents.par_sort_by(by_relevance);
    order_ties(documents);
}
