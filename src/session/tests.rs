//! Integration tests for session management
//!
//! Browser, page, and element lifecycle across the CDP-backed and in-memory implementations.

use std::sync::Arc;
use tokio::time::{timeout, Duration};

use crate::cdp::mock::MockCdpBrowser;
use crate::session::browser::BrowserContextImpl;
use crate::session::mock::MockBrowser;
use crate::session::traits::{
    BrowserContext, BrowserOptions, EvaluationResult, NavigationOptions, PageOptions,
};
use crate::Error;

const LISTING: &str = r#"
<html><body>
  <div class="crayons-story__title"><a href="/first">  First post  </a></div>
  <div class="crayons-story__title"><a href="/second">Second post</a></div>
</body></html>
"#;

fn cdp_backed_browser() -> BrowserContextImpl {
    BrowserContextImpl::new(BrowserOptions::default(), Arc::new(MockCdpBrowser::new()))
}

#[tokio::test]
async fn test_browser_lifecycle() {
    let browser = cdp_backed_browser();
    assert!(browser.is_active());

    let page = browser
        .create_page(PageOptions::default())
        .await
        .expect("Failed to create page");
    assert_eq!(page.browser_id(), browser.id());

    browser.close().await.expect("Failed to close browser");
    assert!(!browser.is_active());
    assert!(!page.is_active());
}

#[tokio::test]
async fn test_page_navigation() {
    let browser = cdp_backed_browser();
    let page = browser
        .create_page(PageOptions::default())
        .await
        .expect("Failed to create page");

    let result = timeout(
        Duration::from_secs(5),
        page.navigate("https://example.com", NavigationOptions::default()),
    )
    .await
    .expect("Navigation did not settle")
    .expect("Navigation failed");

    assert_eq!(result.url, "https://example.com");
    assert!(result.is_loaded);
    assert_eq!(page.url().await.expect("Failed to read URL"), "https://example.com");
}

#[tokio::test]
async fn test_page_content() {
    let browser = cdp_backed_browser();
    let page = browser
        .create_page(PageOptions::default())
        .await
        .expect("Failed to create page");

    page.set_content("<html><body><p>Hello</p></body></html>")
        .await
        .expect("Failed to set content");

    let content = page.get_content().await.expect("Failed to get content");
    assert!(content.contains("<p>Hello</p>"));
}

#[tokio::test]
async fn test_page_evaluate() {
    let browser = cdp_backed_browser();
    let page = browser
        .create_page(PageOptions::default())
        .await
        .expect("Failed to create page");

    let result = page.evaluate("document.title", false).await.expect("Evaluate failed");
    assert!(matches!(result, EvaluationResult::String(_)));
}

#[tokio::test]
async fn test_navigation_timeout_is_adjustable() {
    let browser = cdp_backed_browser();
    let page = browser
        .create_page(PageOptions {
            navigation_timeout_ms: 5_000,
            ..Default::default()
        })
        .await
        .expect("Failed to create page");

    assert_eq!(page.default_navigation_timeout(), 5_000);
    page.set_default_navigation_timeout(60_000);
    assert_eq!(page.default_navigation_timeout(), 60_000);
}

#[tokio::test]
async fn test_multiple_pages_per_browser() {
    let browser = cdp_backed_browser();

    let first = browser.create_page(PageOptions::default()).await.unwrap();
    let second = browser.create_page(PageOptions::default()).await.unwrap();
    assert_ne!(first.id(), second.id());

    let pages = browser.get_pages().await.unwrap();
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_concurrent_pages() {
    let browser = Arc::new(MockBrowser::new(BrowserOptions::default()).with_route("https://example.com", LISTING));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let browser = Arc::clone(&browser);
        handles.push(tokio::spawn(async move {
            let page = browser.create_page(PageOptions::default()).await?;
            page.navigate("https://example.com", NavigationOptions::default()).await?;
            let links = page.query_selector_all(".crayons-story__title a").await?;
            Ok::<usize, Error>(links.len())
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 2);
    }
    assert_eq!(browser.page_count().await, 4);
}

#[tokio::test]
async fn test_element_reads_in_document_order() {
    let browser = MockBrowser::new(BrowserOptions::default()).with_route("https://example.com", LISTING);
    let page = browser.create_page(PageOptions::default()).await.unwrap();
    page.navigate("https://example.com", NavigationOptions::default())
        .await
        .unwrap();

    let links = page.query_selector_all(".crayons-story__title a").await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].text_content().await.unwrap(), "  First post  ");
    assert_eq!(links[1].get_attribute("href").await.unwrap().as_deref(), Some("/second"));

    let first = page
        .query_selector(".crayons-story__title")
        .await
        .unwrap()
        .expect("first title block");
    assert!(first.inner_html().await.unwrap().contains(r#"href="/first""#));
}

#[tokio::test]
async fn test_cascade_closing() {
    let browser = MockBrowser::new(BrowserOptions::default());
    let pages = vec![
        browser.create_page(PageOptions::default()).await.unwrap(),
        browser.create_page(PageOptions::default()).await.unwrap(),
    ];

    browser.close().await.unwrap();

    for page in pages {
        assert!(!page.is_active());
        let result = page.query_selector_all("a").await;
        assert!(matches!(result, Err(Error::SessionClosed(_))));
    }
    assert!(matches!(
        browser.create_page(PageOptions::default()).await,
        Err(Error::SessionClosed(_))
    ));
}

#[tokio::test]
async fn test_isolation_between_browsers() {
    let first = MockBrowser::new(BrowserOptions::default()).with_route("https://example.com", LISTING);
    let second = MockBrowser::new(BrowserOptions::default());

    let page_one = first.create_page(PageOptions::default()).await.unwrap();
    let page_two = second.create_page(PageOptions::default()).await.unwrap();

    assert!(page_one
        .navigate("https://example.com", NavigationOptions::default())
        .await
        .is_ok());
    assert!(matches!(
        page_two
            .navigate("https://example.com", NavigationOptions::default())
            .await,
        Err(Error::NavigationFailed(_))
    ));
}
