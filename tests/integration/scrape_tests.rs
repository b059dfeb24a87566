//! Integration tests for batch scraping
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! batches through the real HTTP transport, retry policies and parsers.

use std::collections::HashMap;
use sumi_harvest::config::{parse_config, Config};
use sumi_harvest::parser::ParseError;
use sumi_harvest::{
    scrape_urls, EntityWithTitle, ErrorKind, FetchError, Outcome, ParserRegistry, ScrapeError,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration from TOML with short delays for testing
fn create_test_config(toml: &str) -> Config {
    parse_config(toml).expect("Failed to parse test config")
}

/// Default retry section: five attempts, 10ms apart
const FAST_RETRY: &str = r#"
[retry]
retry-delay-ms = 10
"#;

fn product_page(id: &str, title: &str) -> String {
    format!(
        r#"<html><body><h1 class="product-title" data-id="{}"> {} </h1></body></html>"#,
        id, title
    )
}

async fn scrape(
    config: &Config,
    urls: &[String],
) -> Result<HashMap<String, Outcome<EntityWithTitle>>, ScrapeError> {
    scrape_urls(config, urls, &ParserRegistry::standard()).await
}

/// Returns a local port with nothing listening on it
fn refused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local address").port()
}

#[tokio::test]
async fn test_parses_json_and_html_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entity-widget-4f1c.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"title": "Widget", "price": 12}"#)
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product-gadget.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page("g-7", "Gadget"))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let json_url = format!("{}/entity-widget-4f1c.json", mock_server.uri());
    let html_url = format!("{}/product-gadget.html", mock_server.uri());
    let config = create_test_config(FAST_RETRY);

    let results = scrape(&config, &[json_url.clone(), html_url.clone()])
        .await
        .expect("Scrape failed");

    assert_eq!(results.len(), 2);
    assert_eq!(
        results[&json_url].as_ref().unwrap(),
        &EntityWithTitle {
            id: Some("4f1c".to_string()),
            title: Some("Widget".to_string()),
        }
    );
    assert_eq!(
        results[&html_url].as_ref().unwrap(),
        &EntityWithTitle {
            id: Some("g-7".to_string()),
            title: Some("Gadget".to_string()),
        }
    );
}

#[tokio::test]
async fn test_redirected_entity_keeps_requested_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entity-widget-4f1c.json"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/api/v2/item"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/item"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"title": "Widget"}"#)
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(FAST_RETRY);
    let url = format!("{}/entity-widget-4f1c.json", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    assert_eq!(
        results[&url].as_ref().expect("Expected redirected entity to parse"),
        &EntityWithTitle {
            id: Some("4f1c".to_string()),
            title: Some("Widget".to_string()),
        }
    );
}

#[tokio::test]
async fn test_domain_policy_retries_until_success() {
    let mock_server = MockServer::start().await;

    // Two failures, then success
    Mock::given(method("GET"))
        .and(path("/product-flaky.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product-flaky.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("f-1", "Flaky")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        r#"
[retry]
max-attempts = 1

[[domain]]
domain = "127.0.0.1"
max-attempts = 3
retry-delay-ms = 100
"#,
    );

    let url = format!("{}/product-flaky.html", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    let entity = results[&url].as_ref().expect("Expected success");
    assert_eq!(entity.title.as_deref(), Some("Flaky"));
}

#[tokio::test]
async fn test_default_policy_exhausts_five_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product-down.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(5)
        .mount(&mock_server)
        .await;

    let config = create_test_config(FAST_RETRY);
    let url = format!("{}/product-down.html", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    let error = results[&url].as_ref().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ResponseRejected);
    assert!(error.to_string().contains("status-code=500"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product-missing.html"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(FAST_RETRY);
    let url = format!("{}/product-missing.html", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    // The 404 body reaches the parser, which finds no title
    assert!(matches!(
        results[&url],
        Err(FetchError::Parse {
            source: ParseError::MissingElement(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_no_parser_fails_before_any_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("x", "X")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(FAST_RETRY);
    let urls = vec![
        format!("{}/product-ok.html", mock_server.uri()),
        format!("{}/about.txt", mock_server.uri()),
    ];

    let result = scrape(&config, &urls).await;

    match result {
        Err(ScrapeError::NoParser { url }) => assert!(url.ends_with("/about.txt")),
        other => panic!("Expected NoParser, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn test_one_domain_down_does_not_affect_another() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("ok", "Up")))
        .expect(100)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        r#"
[retry]
retry-delay-ms = 10

[[domain]]
domain = "localhost"
max-attempts = 2
"#,
    );

    let port = refused_port();
    let up: Vec<String> = (0..100)
        .map(|i| format!("{}/product-up{}.html", mock_server.uri(), i))
        .collect();
    let down: Vec<String> = (0..100)
        .map(|i| format!("http://localhost:{}/product-down{}.html", port, i))
        .collect();
    let urls: Vec<String> = up.iter().chain(down.iter()).cloned().collect();

    let results = scrape(&config, &urls).await.expect("Scrape failed");

    assert_eq!(results.len(), 200);
    for url in &up {
        assert!(results[url].is_ok(), "{} should succeed", url);
    }
    for url in &down {
        let error = results[url].as_ref().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::RetriesExceeded, "{}: {}", url, error);
    }
}

#[tokio::test]
async fn test_empty_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entity-blank-00.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(FAST_RETRY);
    let url = format!("{}/entity-blank-00.json", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    assert!(matches!(
        results[&url],
        Err(FetchError::Parse {
            source: ParseError::EmptyBody,
            ..
        })
    ));
}

#[tokio::test]
async fn test_exhaustion_can_return_last_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product-degraded.html"))
        .respond_with(ResponseTemplate::new(503).set_body_string(product_page("d-1", "Stale")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        r#"
[[domain]]
domain = "127.0.0.1"
max-attempts = 2
retry-delay-ms = 10
exceeded-behavior = "return-last-response"
"#,
    );

    let url = format!("{}/product-degraded.html", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    let entity = results[&url].as_ref().expect("Expected last response to be parsed");
    assert_eq!(entity.title.as_deref(), Some("Stale"));
}

#[tokio::test]
async fn test_deadline_bounds_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product-slow.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        r#"
[retry]
max-attempts = 10
retry-delay-ms = 2000
deadline-secs = 1
"#,
    );

    let url = format!("{}/product-slow.html", mock_server.uri());
    let results = scrape(&config, &[url.clone()]).await.expect("Scrape failed");

    assert_eq!(
        results[&url].as_ref().unwrap_err().kind(),
        ErrorKind::DeadlineExceeded
    );
    assert_eq!(mock_server.received_requests().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn test_every_url_gets_an_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("n", "Item")))
        .expect(20)
        .mount(&mock_server)
        .await;

    let config = create_test_config(FAST_RETRY);
    let mut urls: Vec<String> = (0..20)
        .map(|i| format!("{}/product-item{}.html", mock_server.uri(), i))
        .collect();
    // Duplicates collapse into one entry
    urls.push(urls[0].clone());

    let results = scrape(&config, &urls).await.expect("Scrape failed");

    assert_eq!(results.len(), 20);
    assert!(results.values().all(|r| r.is_ok()));
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let config = create_test_config(FAST_RETRY);
    let results = scrape(&config, &[]).await.expect("Scrape failed");
    assert!(results.is_empty());
}
