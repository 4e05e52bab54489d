use crate::document::DocumentId;
use crate::search_server::SearchServer;
use std::collections::{BTreeSet, HashSet};

/// Ids, ascending, whose set of distinct indexed words repeats that of a
/// lower id. Term frequencies and word order play no part.
pub fn find_duplicates(server: &SearchServer) -> Vec<DocumentId> {
    let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
    let mut duplicates = Vec::new();
    for id in server {
        let signature: BTreeSet<&str> = server.word_frequencies(id).into_keys().collect();
        if !seen.insert(signature) {
            duplicates.push(id);
        }
    }
    duplicates
}

/// Remove every duplicate found by [`find_duplicates`], keeping the lowest id
/// of each group. The whole index is scanned before the first removal.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocumentId> {
    let duplicates = find_duplicates(server);
    for &id in &duplicates {
        tracing::info!(document_id = id, "found duplicate document");
        server.remove_document(id);
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;

    #[test]
    fn keeps_lowest_id_of_each_group() {
        let mut server = SearchServer::new("and with").unwrap();
        server.add_document(1, "a b", DocumentStatus::Actual, &[1]).unwrap();
        server.add_document(2, "b a a", DocumentStatus::Actual, &[5]).unwrap();
        server.add_document(3, "a c", DocumentStatus::Actual, &[1]).unwrap();
        server.add_document(4, "a and b with", DocumentStatus::Banned, &[]).unwrap();

        assert_eq!(remove_duplicates(&mut server), vec![2, 4]);
        assert_eq!(server.document_ids().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn empty_documents_are_duplicates_of_each_other() {
        let mut server = SearchServer::new("and").unwrap();
        server.add_document(5, "and", DocumentStatus::Actual, &[]).unwrap();
        server.add_document(6, "", DocumentStatus::Actual, &[]).unwrap();
        assert_eq!(remove_duplicates(&mut server), vec![6]);
    }

    #[test]
    fn nothing_to_remove() {
        let mut server = SearchServer::new("").unwrap();
        server.add_document(0, "x", DocumentStatus::Actual, &[]).unwrap();
        server.add_document(1, "y", DocumentStatus::Actual, &[]).unwrap();
        assert!(remove_duplicates(&mut server).is_empty());
        assert_eq!(server.document_count(), 2);
    }
}
