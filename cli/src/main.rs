mod loader;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use search_core::{
    paginate, process_queries, remove_duplicates, Document, DocumentStatus, EngineConfig,
    ExecutionPolicy, RequestQueue, SearchServer, StopWords,
};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Index short documents and run ranked keyword queries", long_about = None)]
struct Cli {
    /// Dedicated worker threads for parallel mode (default: SEARCH_WORKER_THREADS or global pool)
    #[arg(long, global = true)]
    threads: Option<usize>,
    /// Accumulator buckets for parallel ranking (default: SEARCH_ACCUMULATOR_BUCKETS or 10)
    #[arg(long, global = true)]
    buckets: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a fixed set of documents, remove duplicates and run a sample query
    Demo,
    /// Load documents from JSON/JSONL and run queries against them
    Search {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Whitespace separated stop words
        #[arg(long, default_value = "")]
        stop_words: String,
        /// Rank with the parallel execution path
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Remove documents with identical word sets before querying
        #[arg(long, default_value_t = false)]
        dedup: bool,
        /// Results printed per page
        #[arg(long, default_value_t = 2)]
        page_size: usize,
        /// Only return documents with this status
        #[arg(long, value_enum, default_value_t = StatusArg::Actual)]
        status: StatusArg,
        /// Queries; words prefixed with '-' exclude documents
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

impl From<StatusArg> for DocumentStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Actual => DocumentStatus::Actual,
            StatusArg::Irrelevant => DocumentStatus::Irrelevant,
            StatusArg::Banned => DocumentStatus::Banned,
            StatusArg::Removed => DocumentStatus::Removed,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(threads) = cli.threads {
        config = config.with_worker_threads(threads);
    }
    if let Some(buckets) = cli.buckets {
        config = config.with_accumulator_buckets(buckets);
    }

    match cli.command {
        Commands::Demo => run_demo(config),
        Commands::Search { input, stop_words, parallel, dedup, page_size, status, queries } => {
            let policy = if parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential };
            let options = SearchOptions { policy, dedup, page_size, status: status.into() };
            run_search(config, &input, &stop_words, &queries, &options)
        }
    }
}

fn run_demo(config: EngineConfig) -> Result<()> {
    let mut server = SearchServer::with_config(StopWords::from_text("and with")?, config);
    let docs: [(i32, &str); 9] = [
        (1, "funny pet and nasty rat"),
        (2, "funny pet with curly hair"),
        (3, "funny pet with curly hair"),
        (4, "funny pet and curly hair"),
        (5, "funny funny pet and nasty nasty rat"),
        (6, "funny pet and not very nasty rat"),
        (7, "very nasty rat and not very funny pet"),
        (8, "pet with rat and rat and rat"),
        (9, "nasty rat with curly hair"),
    ];
    for (id, text) in docs {
        let ratings: &[i32] = if id == 1 { &[7, 2, 7] } else { &[1, 2] };
        server.add_document(id, text, DocumentStatus::Actual, ratings)?;
    }

    println!("Before duplicates removed: {}", server.document_count());
    remove_duplicates(&mut server);
    println!("After duplicates removed: {}", server.document_count());

    let start = Instant::now();
    let results = server.find_top_documents_with(ExecutionPolicy::Parallel, "curly nasty -not", |_, status, _| {
        status == DocumentStatus::Actual
    })?;
    tracing::info!(took_s = start.elapsed().as_secs_f64(), hits = results.len(), "demo query");
    print_pages(&results, 2);
    Ok(())
}

struct SearchOptions {
    policy: ExecutionPolicy,
    dedup: bool,
    page_size: usize,
    status: DocumentStatus,
}

fn run_search(
    config: EngineConfig,
    input: &std::path::Path,
    stop_words: &str,
    queries: &[String],
    options: &SearchOptions,
) -> Result<()> {
    let mut server = SearchServer::with_config(StopWords::from_text(stop_words)?, config);
    tracing::info!(
        stop_words = server.stop_words().len(),
        buckets = server.config().bucket_count(),
        threads = ?server.config().worker_threads,
        "engine ready"
    );
    for doc in loader::load_documents(input)? {
        server.add_document(doc.id, &doc.text, doc.status, &doc.ratings)?;
    }
    if options.dedup {
        let removed = remove_duplicates(&mut server);
        tracing::info!(removed = removed.len(), remaining = server.document_count(), "removed duplicates");
    }

    let start = Instant::now();
    let status = options.status;
    let results: Vec<Vec<Document>> = match options.policy {
        ExecutionPolicy::Sequential => {
            let mut history = RequestQueue::new(&server);
            let results = queries
                .iter()
                .map(|q| history.add_find_request_by_status(q, status))
                .collect::<search_core::Result<_>>()?;
            tracing::info!(no_result_requests = history.no_result_requests(), "request history");
            results
        }
        ExecutionPolicy::Parallel if status == DocumentStatus::Actual => process_queries(&server, queries)?,
        ExecutionPolicy::Parallel => queries
            .iter()
            .map(|q| server.find_top_documents_with(options.policy, q, move |_, s, _| s == status))
            .collect::<search_core::Result<_>>()?,
    };
    tracing::info!(took_s = start.elapsed().as_secs_f64(), queries = queries.len(), "queries ranked");

    for (query, docs) in queries.iter().zip(&results) {
        println!("Query: {query}");
        print_pages(docs, options.page_size);
    }
    Ok(())
}

fn print_pages(docs: &[Document], page_size: usize) {
    if docs.is_empty() {
        println!("  (no results)");
        return;
    }
    for page in paginate(docs, page_size.max(1)) {
        for doc in page {
            println!("  {doc}");
        }
        println!("Page break");
    }
}
