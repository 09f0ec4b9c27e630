use std::sync::Arc;

use pretty_assertions::assert_eq;
use sitebinder_engine::{filter_links, FetchSettings, LinkCollector, ReqwestFetcher, ScrapeError};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seed(raw: &str) -> Url {
    Url::parse(raw).expect("seed url")
}

#[test]
fn keeps_relative_pages_and_drops_pseudo_and_foreign_links() {
    let html = r#"<html><body>
        <a href="/a.html">a</a>
        <a href="/b.html">b</a>
        <a href="mailto:x@y">mail</a>
        <a href="https://other.test/c">foreign</a>
    </body></html>"#;

    let links = filter_links(&seed("https://example.test/"), html);
    assert_eq!(
        links,
        vec![
            "https://example.test/a.html".to_string(),
            "https://example.test/b.html".to_string(),
        ]
    );
}

#[test]
fn drops_javascript_targets() {
    let html = r#"<a href="javascript:void(0)">x</a><a href="/page">p</a>"#;
    let links = filter_links(&seed("https://example.test/"), html);
    assert_eq!(links, vec!["https://example.test/page".to_string()]);
}

#[test]
fn substring_containment_admits_absolute_same_site_links() {
    // Not path-relative, but the seed string occurs inside the target.
    let html = r#"<a href="https://example.test/docs/guide">g</a>"#;
    let links = filter_links(&seed("https://example.test/docs/"), html);
    assert_eq!(
        links,
        vec!["https://example.test/docs/guide".to_string()]
    );
}

#[test]
fn dot_heuristic_excludes_asset_and_versioned_links() {
    let html = r#"<html><body>
        <a href="/logo.png">img</a>
        <a href="/v1.2/notes">versioned</a>
        <a href="/about">about</a>
        <a href="/deep/page.html">page</a>
    </body></html>"#;

    let links = filter_links(&seed("https://example.test/"), html);
    assert_eq!(
        links,
        vec![
            "https://example.test/about".to_string(),
            "https://example.test/deep/page.html".to_string(),
        ]
    );
}

#[test]
fn deduplicates_and_sorts_lexicographically() {
    let html = r#"<html><body>
        <a href="/z.html">z</a>
        <a href="/a.html">a</a>
        <a href="/z.html">z again</a>
        <a href="/m.html">m</a>
    </body></html>"#;

    let links = filter_links(&seed("https://example.test/"), html);
    assert_eq!(
        links,
        vec![
            "https://example.test/a.html".to_string(),
            "https://example.test/m.html".to_string(),
            "https://example.test/z.html".to_string(),
        ]
    );
}

#[test]
fn no_anchors_yields_empty_set() {
    let links = filter_links(&seed("https://example.test/"), "<html><body>hi</body></html>");
    assert!(links.is_empty());
}

#[tokio::test]
async fn collector_returns_sorted_links_from_live_markup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><a href="/b.html">b</a><a href="/a.html">a</a></body></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let collector = LinkCollector::new(Arc::new(ReqwestFetcher::new(FetchSettings::default())));
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();

    let links = collector.collect(&seed).await.expect("collect ok");
    assert_eq!(
        links,
        vec![
            format!("{}/a.html", server.uri()),
            format!("{}/b.html", server.uri()),
        ]
    );
}

#[tokio::test]
async fn collector_reports_no_links_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><a href="mailto:x@y">only mail</a></body></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let collector = LinkCollector::new(Arc::new(ReqwestFetcher::new(FetchSettings::default())));
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();

    let err = collector.collect(&seed).await.unwrap_err();
    assert!(matches!(err, ScrapeError::NoLinksFound));
}

#[tokio::test]
async fn collector_propagates_seed_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let collector = LinkCollector::new(Arc::new(ReqwestFetcher::new(FetchSettings::default())));
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();

    let err = collector.collect(&seed).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Fetch(_)));
}
