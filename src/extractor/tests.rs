//! PageExtractor behavior against the in-memory browser and a local HTTP server

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use crate::config::Config;
use crate::extractor::sink::{DiagnosticLevel, MemorySink};
use crate::extractor::{ExtractedItem, PageExtractor, PipelineState};
use crate::session::{BrowserContext, BrowserOptions, MockBrowser};
use crate::Error;

const BASE_URL: &str = "https://dev.to";

const LISTING: &str = r#"
<html><body>
  <h2 class="crayons-story__title"><a href="/alice/first-post">
      First post
  </a></h2>
  <h2 class="crayons-story__title"><a href="https://example.com/second">Second post</a></h2>
  <div id="greeting">  Hello World  </div>
  <div id="wrapper"><span>Hello World</span></div>
</body></html>
"#;

/// Serve one HTTP response on a fresh port and return its URL
async fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await;

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/images/sample.jpg", addr)
}

/// A URL nobody is listening on
async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/images/sample.jpg", addr)
}

async fn extractor_with(browser: MockBrowser, config: Config) -> (PageExtractor, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let extractor = PageExtractor::from_browser(config, Arc::new(browser), sink.clone())
        .await
        .expect("extractor over mock browser");
    (extractor, sink)
}

async fn listing_extractor() -> (PageExtractor, Arc<MemorySink>) {
    let browser = MockBrowser::new(BrowserOptions::default()).with_route(BASE_URL, LISTING);
    extractor_with(browser, Config::default()).await
}

fn config_with_download_dir(dir: &std::path::Path) -> Config {
    Config {
        download_dir: dir.join("download_images"),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_initialize_logs_and_starts_initialized() {
    let (extractor, sink) = listing_extractor().await;

    assert_eq!(extractor.state(), PipelineState::Initialized);
    assert!(sink.contains(DiagnosticLevel::Info, "Browser initialized"));
}

#[tokio::test]
async fn test_initialize_failure_is_reported() {
    let browser = MockBrowser::new(BrowserOptions::default());
    browser.close().await.unwrap();

    let sink = Arc::new(MemorySink::new());
    let result = PageExtractor::from_browser(Config::default(), Arc::new(browser), sink.clone()).await;

    assert!(matches!(result, Err(Error::SessionClosed(_))));
    assert!(sink.contains(DiagnosticLevel::Error, "Error in init"));
}

#[tokio::test]
async fn test_navigate_to_base_url() {
    let (extractor, sink) = listing_extractor().await;

    let result = extractor.navigate_to_base().await.unwrap();
    assert_eq!(result.url, BASE_URL);
    assert_eq!(extractor.state(), PipelineState::Navigated);
    assert_eq!(extractor.current_url().await.unwrap(), BASE_URL);
    assert!(sink.contains(DiagnosticLevel::Info, "Navigated to https://dev.to"));
}

#[tokio::test]
async fn test_navigate_failure_is_reported_and_returned() {
    let (extractor, sink) = listing_extractor().await;

    let result = extractor.navigate("https://invalid.invalid").await;

    assert!(matches!(result, Err(Error::NavigationFailed(_))));
    assert_eq!(extractor.state(), PipelineState::Initialized);
    assert!(sink.contains(DiagnosticLevel::Error, "Error navigating to https://invalid.invalid"));
}

#[tokio::test]
async fn test_extract_items_in_document_order() {
    let (extractor, sink) = listing_extractor().await;
    extractor.navigate_to_base().await.unwrap();

    let items = extractor.extract_items(".crayons-story__title a").await.unwrap();

    assert_eq!(
        items,
        vec![
            ExtractedItem::new("First post", Some("/alice/first-post".to_string())),
            ExtractedItem::new("Second post", Some("https://example.com/second".to_string())),
        ]
    );
    assert!(sink.contains(DiagnosticLevel::Info, "Found 2 items"));
}

#[tokio::test]
async fn test_extract_items_keeps_empty_titles_and_missing_href() {
    let (extractor, _sink) = listing_extractor().await;
    extractor
        .set_content(r#"<a class="x"></a><a class="x" href="">  </a><a class="x">same</a><a class="x">same</a>"#)
        .await
        .unwrap();

    let items = extractor.extract_items("a.x").await.unwrap();

    assert_eq!(items.len(), 4);
    assert_eq!(items[0], ExtractedItem::new("", None));
    assert_eq!(items[1], ExtractedItem::new("", Some(String::new())));
    assert_eq!(items[2], items[3]);
}

#[tokio::test]
async fn test_extract_items_no_match_is_empty() {
    let (extractor, sink) = listing_extractor().await;
    extractor.navigate_to_base().await.unwrap();

    let items = extractor.extract_items(".does-not-exist").await.unwrap();
    assert!(items.is_empty());
    assert!(sink.contains(DiagnosticLevel::Info, "Found 0 items"));
}

#[tokio::test]
async fn test_extract_items_query_failure_is_error() {
    let browser = MockBrowser::new(BrowserOptions::default())
        .with_route(BASE_URL, LISTING)
        .with_failing_queries();
    let (extractor, sink) = extractor_with(browser, Config::default()).await;
    extractor.navigate_to_base().await.unwrap();

    assert_err!(extractor.extract_items(".crayons-story__title a").await);
    assert!(sink.contains(DiagnosticLevel::Error, "Error getting items"));
}

#[tokio::test]
async fn test_extract_items_invalid_selector() {
    let (extractor, _sink) = listing_extractor().await;
    extractor.navigate_to_base().await.unwrap();

    let result = extractor.extract_items("a[[").await;
    assert!(matches!(result, Err(Error::InvalidSelector(_))));
    assert!(matches!(
        extractor.extract_items("a[href=]").await,
        Err(Error::InvalidSelector(_))
    ));

    // An unclosed attribute selector is closed at end of input
    let items = extractor.extract_items("a[href").await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_extract_items_element_read_failure_fails_call() {
    let browser = MockBrowser::new(BrowserOptions::default())
        .with_route(BASE_URL, LISTING)
        .with_failing_reads();
    let (extractor, sink) = extractor_with(browser, Config::default()).await;
    extractor.navigate_to_base().await.unwrap();

    let result = extractor.extract_items(".crayons-story__title a").await;

    assert!(matches!(result, Err(Error::ElementNotFound(_))));
    assert!(sink.contains(DiagnosticLevel::Error, "Error getting text content"));
    assert!(sink.contains(DiagnosticLevel::Error, "Error getting items"));
}

#[tokio::test]
async fn test_navigating_twice_yields_same_items() {
    let (extractor, _sink) = listing_extractor().await;

    extractor.navigate_to_base().await.unwrap();
    let first = extractor.extract_items(".crayons-story__title a").await.unwrap();
    extractor.navigate_to_base().await.unwrap();
    let second = extractor.extract_items(".crayons-story__title a").await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_element_reads() {
    let (extractor, _sink) = listing_extractor().await;
    extractor
        .set_content(
            r#"<div id="greeting">  Hello World  </div>
               <div id="wrapper"><span>Hello World</span></div>
               <a id="link" href="https://example.com">Example</a>"#,
        )
        .await
        .unwrap();

    let greeting = extractor.find_element("#greeting").await.unwrap().unwrap();
    assert_eq!(extractor.text_content(greeting.as_ref()).await.unwrap(), "Hello World");

    let wrapper = extractor.find_element("#wrapper").await.unwrap().unwrap();
    assert_eq!(
        extractor.html_content(wrapper.as_ref()).await.unwrap(),
        "<span>Hello World</span>"
    );

    let link = extractor.find_element("#link").await.unwrap().unwrap();
    assert_eq!(
        extractor.attribute(link.as_ref(), "href").await.unwrap().as_deref(),
        Some("https://example.com")
    );
    assert_eq!(extractor.attribute(link.as_ref(), "title").await.unwrap(), None);
}

#[tokio::test]
async fn test_element_reads_after_close() {
    let (extractor, sink) = listing_extractor().await;
    extractor
        .set_content(r#"<a id="link" href="/x">Link</a>"#)
        .await
        .unwrap();
    let link = extractor.find_element("#link").await.unwrap().unwrap();

    extractor.close().await.unwrap();

    assert!(matches!(
        extractor.text_content(link.as_ref()).await,
        Err(Error::SessionClosed(_))
    ));
    assert!(matches!(
        extractor.html_content(link.as_ref()).await,
        Err(Error::SessionClosed(_))
    ));
    assert!(matches!(
        extractor.attribute(link.as_ref(), "href").await,
        Err(Error::SessionClosed(_))
    ));
    assert!(sink.contains(DiagnosticLevel::Error, "text_content called after close"));
}

#[tokio::test]
async fn test_download_resource_writes_file() {
    let temp = tempfile::tempdir().unwrap();
    let browser = MockBrowser::new(BrowserOptions::default());
    let (extractor, sink) = extractor_with(browser, config_with_download_dir(temp.path())).await;

    let url = serve_once("200 OK", b"\xFF\xD8\xFF\xE0fake-jpeg-body").await;
    let path = extractor.download_resource(&url, "test").await.unwrap();

    assert!(path.ends_with("test.jpg"));
    let written = tokio::fs::read(&path).await.unwrap();
    assert_eq!(written, b"\xFF\xD8\xFF\xE0fake-jpeg-body");
    assert!(sink.contains(DiagnosticLevel::Info, "Downloaded"));
}

#[tokio::test]
async fn test_download_resource_replaces_existing_file() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_with_download_dir(temp.path());
    std::fs::create_dir_all(&config.download_dir).unwrap();
    std::fs::write(config.download_dir.join("test.jpg"), b"stale").unwrap();

    let (extractor, _sink) = extractor_with(MockBrowser::new(BrowserOptions::default()), config).await;

    let url = serve_once("200 OK", b"fresh").await;
    let path = assert_ok!(extractor.download_resource(&url, "test").await);
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"fresh");
}

#[tokio::test]
async fn test_download_resource_http_status_error() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_with_download_dir(temp.path());
    let download_dir = config.download_dir.clone();
    let (extractor, sink) = extractor_with(MockBrowser::new(BrowserOptions::default()), config).await;

    let url = serve_once("404 Not Found", b"missing").await;
    let result = extractor.download_resource(&url, "test").await;

    match result {
        Err(Error::HttpStatus { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected HTTP status error, got {:?}", other),
    }
    assert!(!download_dir.exists());
    assert!(sink.contains(DiagnosticLevel::Error, "Error fetching image from"));
}

#[tokio::test]
async fn test_download_resource_unreachable() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_with_download_dir(temp.path());
    let download_dir = config.download_dir.clone();
    let (extractor, _sink) = extractor_with(MockBrowser::new(BrowserOptions::default()), config).await;

    let url = refused_url().await;
    let result = extractor.download_resource(&url, "test").await;

    assert!(matches!(result, Err(Error::Http(_))));
    assert!(!download_dir.exists());
}

#[tokio::test]
async fn test_close_is_idempotent_and_final() {
    let (extractor, sink) = listing_extractor().await;
    extractor.navigate_to_base().await.unwrap();

    extractor.close().await.unwrap();
    extractor.close().await.unwrap();
    assert_eq!(extractor.state(), PipelineState::Closed);
    assert_eq!(sink.messages(DiagnosticLevel::Info).iter().filter(|m| *m == "Browser closed").count(), 1);

    assert!(matches!(
        extractor.extract_items(".crayons-story__title a").await,
        Err(Error::SessionClosed(_))
    ));
    assert!(matches!(
        extractor.navigate(BASE_URL).await,
        Err(Error::SessionClosed(_))
    ));
}

#[tokio::test]
async fn test_drop_without_close_warns() {
    let (extractor, sink) = listing_extractor().await;
    drop(extractor);
    assert!(sink.contains(DiagnosticLevel::Warn, "dropped without close()"));

    let (extractor, sink) = listing_extractor().await;
    extractor.close().await.unwrap();
    drop(extractor);
    assert!(sink.messages(DiagnosticLevel::Warn).is_empty());
}
