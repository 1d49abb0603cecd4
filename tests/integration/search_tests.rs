//! Integration tests for indexing and search
//!
//! Pages are written straight into a file-backed database, indexed with the
//! indexing pipeline and queried through the search engine.

use sitesearch::config::{IndexingConfig, SearchConfig};
use sitesearch::crawler::StopSignal;
use sitesearch::indexing::Indexer;
use sitesearch::morphology::{DictionaryAnalyzer, Lemmatizer};
use sitesearch::search::{SearchEngine, SearchResults};
use sitesearch::storage::{lock_storage, share, SharedStorage, SqliteStorage, Storage};
use sitesearch::SiteStatus;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

const DICTIONARY: &str = "
# form|normal form|tags
кот|кот|С мр,ед,им
кота|кот|С мр,ед,рд
коты|кот|С мр,мн,им
окно|окно|С ср,ед,им
окне|окно|С ср,ед,пр
дом|дом|С мр,ед,им
сайт|сайт|С мр,ед,им
на|на|ПРЕДЛ
";

struct Corpus {
    _dir: TempDir,
    storage: SharedStorage,
    indexer: Indexer,
    lemmatizer: Lemmatizer,
}

impl Corpus {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let storage = share(SqliteStorage::new(&dir.path().join("search.db")).unwrap());
        let lemmatizer = Lemmatizer::new(Arc::new(DictionaryAnalyzer::parse(DICTIONARY).unwrap()));
        let indexer = Indexer::new(storage.clone(), lemmatizer.clone(), &IndexingConfig::default());
        Self {
            _dir: dir,
            storage,
            indexer,
            lemmatizer,
        }
    }

    fn site(&self, url: &str, name: &str, pages: &[(&str, &str)]) -> i64 {
        let site_id = {
            let mut storage = lock_storage(&self.storage).unwrap();
            let site_id = storage.create_site(url, name, SiteStatus::Indexing).unwrap();
            for (path, body) in pages {
                let html = format!("<html><head><title>{}</title></head><body>{}</body></html>", path, body);
                storage.insert_page(site_id, path, 200, &html).unwrap();
            }
            site_id
        };
        self.indexer.index_site(site_id, &StopSignal::new()).unwrap();
        site_id
    }

    fn engine(&self, threshold: u8) -> SearchEngine {
        let config = SearchConfig {
            frequency_threshold_percent: threshold,
            default_limit: 20,
        };
        SearchEngine::new(self.storage.clone(), self.lemmatizer.clone(), config)
    }
}

fn uris(results: &SearchResults) -> HashSet<String> {
    results.data.iter().map(|item| item.uri.clone()).collect()
}

#[test]
fn test_and_semantics_across_pages() {
    let corpus = Corpus::new();
    corpus.site(
        "https://a.com",
        "A",
        &[("/p1", "<p>кот</p>"), ("/p2", "<p>кот на окне</p>"), ("/p3", "<p>окно</p>")],
    );

    let results = corpus.engine(100).search("коты окно", None, 0, None).unwrap();

    assert_eq!(results.count, 1);
    let item = &results.data[0];
    assert_eq!(item.uri, "/p2");
    assert_eq!(item.title, "/p2");
    assert_eq!(item.site, "https://a.com");
    assert_eq!(item.site_name, "A");
    assert_eq!(item.snippet, "<b>кот</b> на <b>окне</b>");
}

#[test]
fn test_more_lemmas_never_widen_results() {
    let corpus = Corpus::new();
    corpus.site(
        "https://a.com",
        "A",
        &[
            ("/1", "<p>кот дом</p>"),
            ("/2", "<p>кот</p>"),
            ("/3", "<p>кот дом окно</p>"),
            ("/4", "<p>дом</p>"),
        ],
    );
    let engine = corpus.engine(100);

    let single = uris(&engine.search("кот", None, 0, None).unwrap());
    let pair = uris(&engine.search("кот дом", None, 0, None).unwrap());
    let triple = uris(&engine.search("кот дом окно", None, 0, None).unwrap());

    assert!(pair.is_subset(&single));
    assert!(triple.is_subset(&pair));
    assert_eq!(triple, HashSet::from(["/3".to_string()]));
}

#[test]
fn test_lemma_on_every_page_is_pruned() {
    let corpus = Corpus::new();
    corpus.site(
        "https://a.com",
        "A",
        &[
            ("/1", "<p>сайт кот</p>"),
            ("/2", "<p>сайт дом</p>"),
            ("/3", "<p>сайт окно</p>"),
        ],
    );
    let engine = corpus.engine(80);

    assert_eq!(engine.search("сайт", None, 0, None).unwrap().count, 0);

    let results = engine.search("сайт дом", None, 0, None).unwrap();
    assert_eq!(uris(&results), HashSet::from(["/2".to_string()]));
}

#[test]
fn test_relevance_is_relative_to_best_page() {
    let corpus = Corpus::new();
    corpus.site(
        "https://a.com",
        "A",
        &[
            ("/one", "<p>кот</p>"),
            ("/three", "<p>кот кота коты</p>"),
            ("/two", "<p>кот кота</p>"),
        ],
    );

    let results = corpus.engine(100).search("кот", None, 0, None).unwrap();

    let ranked: Vec<(&str, f64)> = results
        .data
        .iter()
        .map(|item| (item.uri.as_str(), item.relevance))
        .collect();
    assert_eq!(ranked[0], ("/three", 1.0));
    assert_eq!(ranked[1].0, "/two");
    assert!((ranked[1].1 - 2.0 / 3.0).abs() < 1e-9);
    assert!((ranked[2].1 - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_site_scope_and_corpus_wide_search() {
    let corpus = Corpus::new();
    corpus.site("https://a.com", "A", &[("/a", "<p>кот</p>")]);
    corpus.site("https://b.com", "B", &[("/b", "<p>кот дом</p>")]);
    let engine = corpus.engine(100);

    let all = engine.search("кот", None, 0, None).unwrap();
    assert_eq!(all.count, 2);
    let sites: HashSet<String> = all.data.iter().map(|item| item.site_name.clone()).collect();
    assert_eq!(sites, HashSet::from(["A".to_string(), "B".to_string()]));

    let scoped = engine.search("кот", Some("https://b.com"), 0, None).unwrap();
    assert_eq!(scoped.count, 1);
    assert_eq!(scoped.data[0].uri, "/b");
}

#[test]
fn test_pagination() {
    let corpus = Corpus::new();
    let pages: Vec<(String, String)> = (0..7)
        .map(|i| (format!("/{}", i), "<p>кот</p>".to_string()))
        .collect();
    let refs: Vec<(&str, &str)> = pages.iter().map(|(p, b)| (p.as_str(), b.as_str())).collect();
    corpus.site("https://a.com", "A", &refs);
    let engine = corpus.engine(100);

    let first = engine.search("кот", None, 0, Some(5)).unwrap();
    let second = engine.search("кот", None, 5, Some(5)).unwrap();

    assert_eq!(first.count, 7);
    assert_eq!(first.data.len(), 5);
    assert_eq!(second.data.len(), 2);
    let mut seen = uris(&first);
    seen.extend(uris(&second));
    assert_eq!(seen.len(), 7);
}

#[test]
fn test_rank_sum_equals_lemma_counts() {
    let corpus = Corpus::new();
    let body = "<p>Коты и кот сидят на окне, окно открыто</p>";
    let site_id = corpus.site("https://a.com", "A", &[("/", body)]);

    let storage = lock_storage(&corpus.storage).unwrap();
    let page = storage.find_page_by_site_and_path(site_id, "/").unwrap().unwrap();
    let total: f64 = storage.postings_for_page(page.id).unwrap().iter().map(|p| p.rank).sum();
    let expected: u32 = corpus.indexer.page_lemmas(&page.content).values().sum();

    assert_eq!(total, f64::from(expected));
}
