//! Integration tests for the fetcher: redirects, retries and error recording

use seo_crawler::crawler::{Fetcher, MAX_REDIRECTS};
use seo_crawler::{CrawlConfig, FetchError};
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_fetcher(max_retries: u32) -> Fetcher {
    let mut config = CrawlConfig::new("http://127.0.0.1/");
    config.user_agent = "TestBot/1.0".to_string();
    config.timeout_secs = 5;
    config.max_retries = max_retries;
    config.retry_backoff_ms = 10;
    Fetcher::from_config(&config).unwrap()
}

async fn mount_redirect(server: &MockServer, from: &str, to: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(ResponseTemplate::new(302).insert_header("location", to))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_sets_page_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header_exists("accept"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><title>Hi</title></html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let result = create_test_fetcher(0).fetch_with_retry(&url).await;

    assert_eq!(result.page.url, url);
    assert_eq!(result.page.status_code, Some(200));
    assert_eq!(result.page.content_type.as_deref(), Some("text/html"));
    assert!(result.page.redirect_chain.is_empty());
    assert!(result.page.error.is_none());
    assert!(result.error.is_none());
    assert_eq!(result.body.as_deref(), Some("<html><title>Hi</title></html>"));
}

#[tokio::test]
async fn test_redirect_chain_is_captured() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/x", "/y").await;
    mount_redirect(&server, "/y", &format!("{}/z", server.uri())).await;
    Mock::given(method("GET"))
        .and(path("/z"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .mount(&server)
        .await;

    let result = create_test_fetcher(0)
        .fetch(&format!("{}/x", server.uri()))
        .await;

    assert_eq!(result.page.status_code, Some(200));
    assert_eq!(
        result.page.redirect_chain,
        vec![format!("{}/y", server.uri()), format!("{}/z", server.uri())]
    );
    assert_eq!(result.page.final_url(), format!("{}/z", server.uri()));
    assert_eq!(result.body.as_deref(), Some("done"));
}

#[tokio::test]
async fn test_ten_redirects_are_allowed() {
    let server = MockServer::start().await;
    for hop in 0..10 {
        mount_redirect(&server, &format!("/r{}", hop), &format!("/r{}", hop + 1)).await;
    }
    Mock::given(method("GET"))
        .and(path("/r10"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = create_test_fetcher(0)
        .fetch(&format!("{}/r0", server.uri()))
        .await;

    assert_eq!(result.page.status_code, Some(200));
    assert_eq!(result.page.redirect_chain.len(), MAX_REDIRECTS);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_eleven_redirects_is_an_error() {
    let server = MockServer::start().await;
    for hop in 0..11 {
        mount_redirect(&server, &format!("/r{}", hop), &format!("/r{}", hop + 1)).await;
    }
    Mock::given(method("GET"))
        .and(path("/r11"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = create_test_fetcher(3)
        .fetch_with_retry(&format!("{}/r0", server.uri()))
        .await;

    assert!(matches!(
        result.error,
        Some(FetchError::TooManyRedirects { hops: 11, .. })
    ));
    assert_eq!(result.page.redirect_chain.len(), MAX_REDIRECTS);
    assert!(result.page.error.as_deref().unwrap().contains("too many redirects"));
    assert!(result.body.is_none());
}

#[tokio::test]
async fn test_redirect_loop_terminates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/loop"))
        .expect(11)
        .mount(&server)
        .await;

    let result = create_test_fetcher(0)
        .fetch(&format!("{}/loop", server.uri()))
        .await;

    assert!(matches!(result.error, Some(FetchError::TooManyRedirects { .. })));
    assert_eq!(result.page.redirect_chain.len(), MAX_REDIRECTS);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let result = create_test_fetcher(3)
        .fetch_with_retry(&format!("{}/flaky", server.uri()))
        .await;

    assert_eq!(result.page.status_code, Some(503));
    assert_eq!(result.page.error.as_deref(), Some("HTTP 503"));
    assert_eq!(result.error, Some(FetchError::Status(503)));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recover"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recover"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let result = create_test_fetcher(3)
        .fetch_with_retry(&format!("{}/recover", server.uri()))
        .await;

    assert_eq!(result.page.status_code, Some(200));
    assert!(result.page.error.is_none());
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;

    let result = create_test_fetcher(3)
        .fetch_with_retry(&format!("{}/missing", server.uri()))
        .await;

    assert_eq!(result.page.status_code, Some(404));
    assert_eq!(result.page.error.as_deref(), Some("HTTP 404"));
    assert!(result.body.is_none());
}

#[tokio::test]
async fn test_timeout_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = CrawlConfig::new("http://127.0.0.1/");
    config.timeout_secs = 1;
    config.max_retries = 0;
    let fetcher = Fetcher::from_config(&config).unwrap();

    let result = fetcher.fetch_with_retry(&format!("{}/slow", server.uri())).await;

    assert_eq!(result.error, Some(FetchError::Timeout));
    assert!(result.page.status_code.is_none());
    assert_eq!(result.page.error.as_deref(), Some("request timed out"));
}
