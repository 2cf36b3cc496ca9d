//! # Chrome DevTools Protocol (CDP) layer
//!
//! WebSocket plumbing for driving a Chromium page over the DevTools Protocol.
//!
//! ## Modules
//! - `traits`: connection, client and browser abstractions
//! - `types`: wire types for the commands and events in use
//! - `connection`: WebSocket connection with a single reader task
//! - `client`: typed page-level operations
//! - `browser`: browser-level operations over the DevTools HTTP endpoint
//! - `launcher`: local Chromium process management
//! - `mock`: in-memory implementations for tests
//!
//! ## Example
//! ```rust,no_run
//! use page_crawler::cdp::{CdpBrowser, CdpBrowserImpl, CdpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = CdpBrowserImpl::new("ws://localhost:9222");
//! let target = browser.create_target("about:blank").await?;
//! let client = browser.create_client(&target).await?;
//!
//! let result = client.navigate("https://example.com").await?;
//! println!("Navigation started in frame {}", result.frame_id);
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod types;
pub mod connection;
pub mod client;
pub mod browser;
pub mod launcher;
pub mod mock;

pub use traits::{
    BrowserVersion, CdpBrowser, CdpClient, CdpConnection, CdpError, CdpEvent, CdpResponse,
    EvaluationResult, NavigationResult,
};

pub use browser::CdpBrowserImpl;
pub use client::CdpClientImpl;
pub use connection::CdpWebSocketConnection;
pub use launcher::{ChromeProcess, LaunchOptions};

pub use mock::{MockCdpBrowser, MockCdpClient, MockCdpConnection};
