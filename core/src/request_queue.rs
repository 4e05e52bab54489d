//! Sliding window over recent find requests, counting those without results.

use crate::document::{Document, DocumentId, DocumentStatus};
use crate::error::Result;
use crate::search_server::SearchServer;
use std::collections::VecDeque;

/// Requests remembered: one per minute over a day.
pub const REQUEST_WINDOW: usize = 1440;

pub struct RequestQueue<'a> {
    server: &'a SearchServer,
    // Hit count of each request in the window, oldest first.
    requests: VecDeque<usize>,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(server: &'a SearchServer) -> Self {
        Self { server, requests: VecDeque::with_capacity(REQUEST_WINDOW + 1), no_result_requests: 0 }
    }

    pub fn add_find_request_by<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let results = self.server.find_top_documents_by(raw_query, predicate)?;
        self.record(results.len());
        Ok(results)
    }

    pub fn add_find_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.add_find_request_by(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Actual)
    }

    /// Requests in the current window that returned nothing.
    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    fn record(&mut self, hits: usize) {
        self.requests.push_back(hits);
        if hits == 0 {
            self.no_result_requests += 1;
        }
        if self.requests.len() > REQUEST_WINDOW {
            if let Some(0) = self.requests.pop_front() {
                self.no_result_requests -= 1;
            }
        }
    }
}
