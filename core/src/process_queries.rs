use crate::document::Document;
use crate::error::Result;
use crate::search_server::SearchServer;
use rayon::prelude::*;

/// Run every query against `server` in parallel. Results keep query order;
/// the first failing query's error is returned.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    server.install(|| {
        queries.par_iter().map(|query| server.find_top_documents(AsRef::<str>::as_ref(query))).collect()
    })
}

/// [`process_queries`] flattened into one sequence.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(server, queries)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;
    use crate::error::SearchError;

    fn server() -> SearchServer {
        let mut server = SearchServer::new("and with").unwrap();
        let texts = ["funny pet and nasty rat", "funny pet with curly hair", "big cat nasty hair"];
        for (id, text) in texts.iter().enumerate() {
            server.add_document(id as i32, text, DocumentStatus::Actual, &[1, 2]).unwrap();
        }
        server
    }

    #[test]
    fn results_follow_query_order() {
        let server = server();
        let queries = ["nasty rat -not", "curly", "zebra"];
        let results = process_queries(&server, &queries).unwrap();
        assert_eq!(results.len(), 3);
        for (query, result) in queries.iter().zip(&results) {
            assert_eq!(*result, server.find_top_documents(query).unwrap());
        }
        assert!(results[2].is_empty());
    }

    #[test]
    fn joined_flattens() {
        let server = server();
        let queries = vec!["curly".to_string(), "cat".to_string()];
        let joined = process_queries_joined(&server, &queries).unwrap();
        assert_eq!(joined.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn error_propagates() {
        let server = server();
        let err = process_queries(&server, &["cat", "--dog"]).unwrap_err();
        assert_eq!(err, SearchError::InvalidQueryWord("--dog".into()));
    }
}
