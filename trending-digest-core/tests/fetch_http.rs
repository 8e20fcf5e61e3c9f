use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trending_digest_core::config::ListingConfig;
use trending_digest_core::contract::PageFetcher;
use trending_digest_core::error::DigestError;
use trending_digest_core::fetch::HttpPageFetcher;
use trending_digest_core::listing::fetch_listing;

const LISTING: &str = r#"<html><body>
<article class="Box-row">
  <h2><a href="/octo/cat">octo / cat</a></h2>
  <p>Cats, served over HTTP.</p>
  <span itemprop="programmingLanguage">Go</span>
  <a href="/octo/cat/stargazers">1,001</a>
  <span class="float-sm-right">77 stars today</span>
</article>
</body></html>"#;

#[tokio::test]
async fn fetches_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new().unwrap();
    let body = fetcher
        .fetch_page(&format!("{}/page", server.uri()), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn non_success_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new().unwrap();
    let err = fetcher
        .fetch_page(&format!("{}/busy", server.uri()), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, DigestError::FetchHttpError { status: 503, .. }));
}

#[tokio::test]
async fn slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new().unwrap();
    let err = fetcher
        .fetch_page(&format!("{}/slow", server.uri()), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, DigestError::FetchTimeout { .. }), "got {err}");
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let fetcher = HttpPageFetcher::new().unwrap();
    let err = fetcher
        .fetch_page("http://127.0.0.1:9/", Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DigestError::FetchTransport { .. } | DigestError::FetchTimeout { .. }),
        "got {err}"
    );
}

#[tokio::test]
async fn listing_is_fetched_with_language_and_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trending/go"))
        .and(query_param("since", "monthly"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .expect(1)
        .mount(&server)
        .await;

    let config = ListingConfig {
        base_url: format!("{}/trending", server.uri()),
        language: Some("go".into()),
        since: "monthly".parse().unwrap(),
        ..ListingConfig::default()
    };
    let fetcher = HttpPageFetcher::new().unwrap();
    let records = fetch_listing(&fetcher, &config).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "octo / cat");
    assert_eq!(records[0].url, format!("{}/octo/cat", server.uri()));
    assert_eq!(records[0].stars, "1,001");
}
