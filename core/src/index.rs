//! Inverted index with a per-document mirror.
//!
//! Every distinct word is stored once in the dictionary and referred to by a
//! [`TermId`] from both the posting lists and the per-document term maps.
//! Posting lists sit behind their own `RwLock` so that readers traverse them
//! concurrently while a parallel removal writes to one word's list at a time.
//!
//! A word whose last document is removed leaves the dictionary, and its slot
//! is handed to the next new word. Ids of words still indexed never change.

use crate::document::{DocumentId, DocumentMeta};
use parking_lot::{RwLock, RwLockReadGuard};
use rayon::prelude::*;
use std::collections::{btree_map, BTreeMap, HashMap};
use std::iter::Copied;
use std::sync::Arc;

pub type TermId = u32;

/// Live document ids in ascending order.
pub type DocumentIds<'a> = Copied<btree_map::Keys<'a, DocumentId, DocumentMeta>>;

/// Document id to term frequency for one word.
pub type Postings = BTreeMap<DocumentId, f64>;

#[derive(Default)]
pub struct InvertedIndex {
    dictionary: HashMap<Arc<str>, TermId>,
    terms: Vec<Arc<str>>,
    postings: Vec<RwLock<Postings>>,
    free_terms: Vec<TermId>,
    docs: BTreeMap<DocumentId, DocumentMeta>,
    doc_terms: BTreeMap<DocumentId, BTreeMap<TermId, f64>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, word: &str) -> TermId {
        if let Some(&id) = self.dictionary.get(word) {
            return id;
        }
        let word: Arc<str> = Arc::from(word);
        let id = match self.free_terms.pop() {
            Some(id) => {
                self.terms[id as usize] = Arc::clone(&word);
                id
            }
            None => {
                self.terms.push(Arc::clone(&word));
                self.postings.push(RwLock::new(Postings::new()));
                (self.terms.len() - 1) as TermId
            }
        };
        self.dictionary.insert(word, id);
        id
    }

    /// Drop `terms` that no longer have any posting and recycle their slots.
    fn release_empty(&mut self, terms: impl IntoIterator<Item = TermId>) {
        for term in terms {
            if !self.postings[term as usize].get_mut().is_empty() {
                continue;
            }
            let word = std::mem::replace(&mut self.terms[term as usize], Arc::from(""));
            self.dictionary.remove(&word);
            self.free_terms.push(term);
        }
    }

    /// Index an already filtered and validated word sequence.
    ///
    /// The caller guarantees `id` is not live. Each word's term frequency is
    /// its occurrence count over the sequence length; an empty sequence leaves
    /// the document with an empty term map.
    pub fn insert(&mut self, id: DocumentId, words: &[&str], meta: DocumentMeta) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for word in words {
            *counts.entry(*word).or_insert(0) += 1;
        }

        let mut term_freqs = BTreeMap::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for (word, count) in counts {
                let term = self.intern(word);
                let tf = count as f64 * inv_word_count;
                self.postings[term as usize].get_mut().insert(id, tf);
                term_freqs.insert(term, tf);
            }
        }

        self.doc_terms.insert(id, term_freqs);
        self.docs.insert(id, meta);
    }

    /// Erase `id` from every structure. Returns false if it was not live.
    pub fn remove(&mut self, id: DocumentId) -> bool {
        let Some(term_freqs) = self.doc_terms.remove(&id) else {
            return false;
        };
        for term in term_freqs.keys() {
            self.postings[*term as usize].get_mut().remove(&id);
        }
        self.release_empty(term_freqs.into_keys());
        self.docs.remove(&id);
        true
    }

    /// Like [`remove`](Self::remove), but the per-word erasures fan out over
    /// the current rayon pool. Metadata goes once every erasure has joined.
    pub fn remove_parallel(&mut self, id: DocumentId) -> bool {
        let Some(term_freqs) = self.doc_terms.remove(&id) else {
            return false;
        };
        let terms: Vec<TermId> = term_freqs.into_keys().collect();
        let postings = &self.postings;
        terms.par_iter().for_each(|term| {
            postings[*term as usize].write().remove(&id);
        });
        self.release_empty(terms);
        self.docs.remove(&id);
        true
    }

    pub fn term_id(&self, word: &str) -> Option<TermId> {
        self.dictionary.get(word).copied()
    }

    pub fn term(&self, term: TermId) -> &str {
        &self.terms[term as usize]
    }

    /// Shared view of one word's posting list.
    pub fn postings(&self, term: TermId) -> RwLockReadGuard<'_, Postings> {
        self.postings[term as usize].read()
    }

    /// Number of live documents containing `term`.
    pub fn document_freq(&self, term: TermId) -> usize {
        self.postings(term).len()
    }

    /// Number of distinct words currently indexed.
    pub fn term_count(&self) -> usize {
        self.dictionary.len()
    }

    /// `ln(N / df)` against the live document count. `None` when no live
    /// document contains the word.
    pub fn inverse_document_freq(&self, term: TermId) -> Option<f64> {
        let df = self.document_freq(term);
        if df == 0 {
            return None;
        }
        Some((self.docs.len() as f64 / df as f64).ln())
    }

    pub fn contains(&self, term: TermId, id: DocumentId) -> bool {
        self.doc_terms.get(&id).is_some_and(|terms| terms.contains_key(&term))
    }

    pub fn meta(&self, id: DocumentId) -> Option<&DocumentMeta> {
        self.docs.get(&id)
    }

    pub fn is_live(&self, id: DocumentId) -> bool {
        self.docs.contains_key(&id)
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    /// Live ids, ascending.
    pub fn document_ids(&self) -> DocumentIds<'_> {
        self.docs.keys().copied()
    }

    pub fn term_freqs(&self, id: DocumentId) -> Option<&BTreeMap<TermId, f64>> {
        self.doc_terms.get(&id)
    }

    /// Word to term frequency for a live document; empty for unknown ids.
    pub fn word_frequencies(&self, id: DocumentId) -> BTreeMap<&str, f64> {
        self.doc_terms
            .get(&id)
            .map(|terms| terms.iter().map(|(t, tf)| (self.term(*t), *tf)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    const META: DocumentMeta = DocumentMeta { rating: 0, status: DocumentStatus::Actual };

    #[test]
    fn term_frequency_counts_repeats() {
        let mut idx = InvertedIndex::new();
        idx.insert(0, &["rat", "pet", "rat", "rat"], META);
        let freqs = idx.word_frequencies(0);
        assert_eq!(freqs.len(), 2);
        assert!((freqs["rat"] - 0.75).abs() < 1e-12);
        assert!((freqs["pet"] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn words_are_interned_once() {
        let mut idx = InvertedIndex::new();
        idx.insert(0, &["cat", "dog"], META);
        idx.insert(1, &["cat"], META);
        let cat = idx.term_id("cat").unwrap();
        assert_eq!(idx.term(cat), "cat");
        assert_eq!(idx.document_freq(cat), 2);
        assert_eq!(idx.terms.len(), 2);
    }

    #[test]
    fn empty_document_has_empty_term_map() {
        let mut idx = InvertedIndex::new();
        idx.insert(3, &[], META);
        assert!(idx.is_live(3));
        assert!(idx.word_frequencies(3).is_empty());
        assert_eq!(idx.document_count(), 1);
    }

    #[test]
    fn remove_clears_every_structure() {
        let mut idx = InvertedIndex::new();
        idx.insert(0, &["hello", "world"], META);
        idx.insert(1, &["hello", "rust"], META);
        assert!(idx.remove(0));
        assert!(!idx.remove(0));
        assert!(!idx.is_live(0));
        assert!(idx.word_frequencies(0).is_empty());
        assert_eq!(idx.term_id("world"), None);
        assert_eq!(idx.term_count(), 2);
        let hello = idx.term_id("hello").unwrap();
        assert_eq!(idx.postings(hello).keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn parallel_remove_matches_sequential() {
        let mut seq = InvertedIndex::new();
        let mut par = InvertedIndex::new();
        for idx in [&mut seq, &mut par] {
            idx.insert(0, &["a", "b", "c", "d"], META);
            idx.insert(1, &["b", "c"], META);
        }
        assert!(seq.remove(0));
        assert!(par.remove_parallel(0));
        assert!(!par.remove_parallel(0));
        for word in ["a", "d"] {
            assert_eq!(seq.term_id(word), None);
            assert_eq!(par.term_id(word), None);
        }
        for word in ["b", "c"] {
            let (s, p) = (seq.term_id(word).unwrap(), par.term_id(word).unwrap());
            assert_eq!(*seq.postings(s), *par.postings(p));
        }
        assert_eq!(seq.document_ids().collect::<Vec<_>>(), par.document_ids().collect::<Vec<_>>());
    }

    #[test]
    fn idf_uses_live_count() {
        let mut idx = InvertedIndex::new();
        idx.insert(0, &["cat"], META);
        idx.insert(1, &["dog"], META);
        let cat = idx.term_id("cat").unwrap();
        assert!((idx.inverse_document_freq(cat).unwrap() - 2f64.ln()).abs() < 1e-12);
        idx.remove(1);
        assert!(idx.inverse_document_freq(cat).unwrap().abs() < 1e-12);
    }

    #[test]
    fn churn_does_not_grow_the_dictionary() {
        let mut idx = InvertedIndex::new();
        idx.insert(1, &["stable"], META);
        let stable = idx.term_id("stable").unwrap();
        for round in 0..1000 {
            let word = format!("fresh{round}");
            idx.insert(0, &[word.as_str(), "stable"], META);
            if round % 2 == 0 {
                assert!(idx.remove(0));
            } else {
                assert!(idx.remove_parallel(0));
            }
            assert_eq!(idx.term_id(&word), None);
        }
        assert_eq!(idx.document_count(), 1);
        assert_eq!(idx.term_count(), 1);
        assert_eq!(idx.terms.len(), 2);
        assert_eq!(idx.postings.len(), 2);
        assert_eq!(idx.term_id("stable"), Some(stable));
        assert_eq!(idx.term(stable), "stable");
    }

    #[test]
    fn released_slot_is_reused_for_a_new_word() {
        let mut idx = InvertedIndex::new();
        idx.insert(0, &["old"], META);
        let old = idx.term_id("old").unwrap();
        idx.remove(0);
        idx.insert(1, &["new"], META);
        assert_eq!(idx.term_id("new"), Some(old));
        assert_eq!(idx.term(old), "new");
        assert_eq!(idx.postings(old).keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(idx.word_frequencies(1).keys().copied().collect::<Vec<_>>(), vec!["new"]);
    }
}
