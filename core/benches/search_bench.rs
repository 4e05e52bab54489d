use criterion::{criterion_group, criterion_main, Criterion};
use search_core::{DocumentStatus, ExecutionPolicy, SearchServer};

fn build_server() -> SearchServer {
    let words: Vec<String> = (0..2_000).map(|i| format!("w{i}")).collect();
    let mut server = SearchServer::new("and with the").unwrap();
    let mut state = 1u64;
    for id in 0..10_000 {
        let text: Vec<&str> = (0..40)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                words[(state >> 33) as usize % words.len()].as_str()
            })
            .collect();
        server.add_document(id, &text.join(" "), DocumentStatus::Actual, &[1, 2, 3]).unwrap();
    }
    server
}

fn bench_find_top_documents(c: &mut Criterion) {
    let server = build_server();
    let query: String = (0..300).map(|i| format!("w{} ", i * 5)).chain(["-w7".to_string()]).collect();
    for (name, policy) in [("find_top_seq", ExecutionPolicy::Sequential), ("find_top_par", ExecutionPolicy::Parallel)] {
        c.bench_function(name, |b| {
            b.iter(|| server.find_top_documents_with(policy, &query, |_, _, _| true).unwrap())
        });
    }
}

criterion_group!(benches, bench_find_top_documents);
criterion_main!(benches);
