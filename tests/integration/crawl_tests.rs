//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl and index cycle end-to-end.

use sitesearch::config::{
    Config, CrawlerConfig, IndexingConfig, MorphologyConfig, OutputConfig, SearchConfig,
    SiteEntry, UserAgentConfig,
};
use sitesearch::crawler::STOPPED_BY_USER;
use sitesearch::morphology::{DictionaryAnalyzer, Lemmatizer};
use sitesearch::service::{ALREADY_RUNNING, NOT_RUNNING, SITE_BEING_INDEXED};
use sitesearch::storage::{lock_storage, share, SqliteStorage, Storage};
use sitesearch::{IndexingService, ServiceResponse, SiteStatus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DICTIONARY: &str = "
кот|кот|С мр,ед,им
окно|окно|С ср,ед,им
окне|окно|С ср,ед,пр
сидит|сидеть|Г дст,нст,3л,ед
на|на|ПРЕДЛ
";

/// Creates a test configuration crawling the given root
fn create_test_config(root: &str, db_path: &str, pool_size: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_pages_open: pool_size,
            min_delay_ms: 0,
            max_delay_ms: 0,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            agent: "TestBot/1.0".to_string(),
            referrer: "https://www.google.com".to_string(),
        },
        indexing: IndexingConfig::default(),
        search: SearchConfig::default(),
        morphology: MorphologyConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        sites: vec![SiteEntry {
            url: root.to_string(),
            name: "Mock".to_string(),
        }],
    }
}

fn create_service(root: &str, dir: &TempDir, pool_size: u32) -> IndexingService {
    let db_path = dir.path().join("index.db");
    let config = create_test_config(root, &db_path.to_string_lossy(), pool_size);
    let storage = share(SqliteStorage::new(&db_path).expect("Failed to open storage"));
    let lemmatizer = Lemmatizer::new(Arc::new(
        DictionaryAnalyzer::parse(DICTIONARY).expect("Failed to parse dictionary"),
    ));
    IndexingService::new(config, storage, lemmatizer).expect("Failed to build service")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();

    // Every page is requested exactly once, however often it is linked
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title></head><body>
            <p>Кот сидит на окне</p>
            <a href="/a">A</a> <a href="/a/">A again</a> <a href="/">Home</a>
            <a href="/a#top">Anchor</a> <a href="https://elsewhere.example/">Out</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"<html><body><p>Окно</p><a href="/">Home</a><a href="/missing">Gone</a></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).insert_header("content-type", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_service(&root, &dir, 3);
    assert_eq!(service.start_indexing(), ServiceResponse::ok());
    assert!(service.is_running());

    let statuses = service.wait_for_completion().await;
    assert_eq!(statuses, vec![SiteStatus::Indexed]);
    assert!(!service.is_running());

    {
        let storage = lock_storage(service.storage()).unwrap();
        let site = storage.find_site_by_url(&root).unwrap().expect("site row");
        assert_eq!(site.status, SiteStatus::Indexed);
        assert_eq!(site.last_error, None);

        let mut paths: Vec<(String, u16)> = storage
            .list_pages(site.id)
            .unwrap()
            .into_iter()
            .map(|page| (page.path, page.code))
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                ("/".to_string(), 200),
                ("/a".to_string(), 200),
                ("/missing".to_string(), 404),
            ]
        );

        assert_eq!(storage.find_lemma(site.id, "кот").unwrap().unwrap().frequency, 1);
        assert_eq!(storage.find_lemma(site.id, "окно").unwrap().unwrap().frequency, 2);
        assert!(storage.find_lemma(site.id, "на").unwrap().is_none());
    }

    mock_server.verify().await;
}

#[tokio::test]
async fn test_reindexing_replaces_previous_site() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>кот</p>"))
        .mount(&mock_server)
        .await;

    let service = create_service(&root, &dir, 2);
    for _ in 0..2 {
        assert!(service.start_indexing().result);
        assert_eq!(service.wait_for_completion().await, vec![SiteStatus::Indexed]);
    }

    let storage = lock_storage(service.storage()).unwrap();
    assert_eq!(storage.list_sites().unwrap().len(), 1);
    assert_eq!(storage.count_pages(None).unwrap(), 1);
    let site = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(storage.find_lemma(site.id, "кот").unwrap().unwrap().frequency, 1);
}

#[tokio::test]
async fn test_unreachable_root_fails_site() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let service = create_service(&root, &dir, 2);
    assert!(service.start_indexing().result);
    assert_eq!(service.wait_for_completion().await, vec![SiteStatus::Failed]);

    let storage = lock_storage(service.storage()).unwrap();
    let site = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Failed);
    assert_eq!(
        site.last_error,
        Some(format!("root page unreachable: {} (status 500)", root))
    );
    assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 0);
}

#[tokio::test]
async fn test_root_with_wrong_content_type_fails_site() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let service = create_service(&root, &dir, 1);
    assert!(service.start_indexing().result);
    assert_eq!(service.wait_for_completion().await, vec![SiteStatus::Failed]);

    let storage = lock_storage(service.storage()).unwrap();
    let site = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(
        site.last_error,
        Some(format!("root page unreachable: {} (status 415)", root))
    );
}

#[tokio::test]
async fn test_stop_mid_crawl() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!("<p>кот</p>{}", links)))
        .mount(&mock_server)
        .await;

    // Children answer slowly so the stop lands while they are in flight
    Mock::given(method("GET"))
        .respond_with(html("<p>окно</p>").set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let service = create_service(&root, &dir, 2);
    assert!(service.start_indexing().result);
    assert_eq!(
        service.start_indexing(),
        ServiceResponse::error(ALREADY_RUNNING)
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(service.stop_indexing(), ServiceResponse::ok());

    assert_eq!(service.wait_for_completion().await, vec![SiteStatus::Failed]);
    assert!(!service.is_running());
    assert_eq!(service.stop_indexing(), ServiceResponse::error(NOT_RUNNING));

    {
        let storage = lock_storage(service.storage()).unwrap();
        let site = storage.find_site_by_url(&root).unwrap().unwrap();
        assert_eq!(site.status, SiteStatus::Failed);
        assert_eq!(site.last_error.as_deref(), Some(STOPPED_BY_USER));

        // Only the root finished before the stop; nothing after it was saved
        assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 1);
        assert_eq!(storage.count_lemmas(Some(site.id)).unwrap(), 0);
    }

    // The stop request is cleared once the last job ends
    assert!(service.start_indexing().result);
    service.stop_indexing();
    service.wait_for_completion().await;
}

#[tokio::test]
async fn test_index_single_page_replaces_previous_version() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();
    let service = create_service(&root, &dir, 2);

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html("<p>кот кот</p>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/news/", root);
    assert_eq!(service.index_page(&url).await, ServiceResponse::ok());

    mock_server.reset().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(html("<p>окно</p>"))
        .mount(&mock_server)
        .await;

    assert_eq!(service.index_page(&url).await, ServiceResponse::ok());

    let storage = lock_storage(service.storage()).unwrap();
    let site = storage.find_site_by_url(&root).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 1);
    assert!(storage.find_lemma(site.id, "кот").unwrap().is_none());
    assert_eq!(storage.find_lemma(site.id, "окно").unwrap().unwrap().frequency, 1);

    let page = storage
        .find_page_by_site_and_path(site.id, "/news")
        .unwrap()
        .unwrap();
    let ranks: f64 = storage
        .postings_for_page(page.id)
        .unwrap()
        .iter()
        .map(|p| p.rank)
        .sum();
    assert_eq!(ranks, 1.0);
}

#[tokio::test]
async fn test_index_page_refused_during_crawl_of_its_site() {
    let mock_server = MockServer::start().await;
    let root = mock_server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>кот</p><a href="/slow">Slow</a>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>окно</p>").set_delay(Duration::from_millis(800)))
        .mount(&mock_server)
        .await;

    let service = create_service(&root, &dir, 2);
    assert!(service.start_indexing().result);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        service.index_page(&root).await,
        ServiceResponse::error(SITE_BEING_INDEXED)
    );

    assert_eq!(service.wait_for_completion().await, vec![SiteStatus::Indexed]);
    {
        let storage = lock_storage(service.storage()).unwrap();
        let site = storage.find_site_by_url(&root).unwrap().unwrap();
        assert_eq!(site.last_error, None);
        assert_eq!(storage.count_pages(Some(site.id)).unwrap(), 2);
        assert_eq!(storage.find_lemma(site.id, "кот").unwrap().unwrap().frequency, 1);
    }

    // With the crawl finished the same page can be re-indexed
    assert_eq!(service.index_page(&root).await, ServiceResponse::ok());
}
