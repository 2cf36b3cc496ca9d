//! Configuration management for Page-Crawler

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Default address the crawler opens when none is given
pub const DEFAULT_BASE_URL: &str = "https://dev.to";

/// Default navigation timeout in milliseconds
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 60_000;

/// Crawler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address used when navigating without an explicit URL
    pub base_url: String,

    /// CSS selector used by the pipeline to extract items
    pub item_selector: String,

    /// Image to download during the pipeline run
    pub image_url: Option<String>,

    /// File stem for the downloaded image (`<name>.jpg`)
    pub image_name: Option<String>,

    /// Directory downloaded images are written to
    pub download_dir: PathBuf,

    /// Run the browser without a window
    pub headless: bool,

    /// Viewport width in CSS pixels
    pub viewport_width: u32,

    /// Viewport height in CSS pixels
    pub viewport_height: u32,

    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,

    /// How long to wait for a launched browser to expose its DevTools endpoint
    pub launch_timeout_ms: u64,

    /// Chrome executable path
    pub chrome_path: Option<PathBuf>,

    /// Existing CDP endpoint to connect to instead of launching a browser
    pub cdp_endpoint: Option<String>,

    /// Arguments passed to the launched browser
    pub browser_args: Vec<String>,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            item_selector: ".crayons-story__title a".to_string(),
            image_url: None,
            image_name: None,
            download_dir: PathBuf::from("./download_images"),
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            launch_timeout_ms: 20_000,
            chrome_path: None,
            cdp_endpoint: None,
            browser_args: vec![
                "--lang=ja,en-US,en".to_string(),
                "--no-sandbox".to_string(),
                "--disable-setuid-sandbox".to_string(),
            ],
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `CRAWLER_CONFIG` (if set), then apply environment overrides
    pub fn load() -> Result<Self> {
        let base = match env::var("CRAWLER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Config::default(),
        };

        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Config::default().with_env_overrides()
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(base_url) = env::var("CRAWLER_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(selector) = env::var("CRAWLER_SELECTOR") {
            self.item_selector = selector;
        }

        if let Ok(image_url) = env::var("CRAWLER_IMAGE_URL") {
            self.image_url = Some(image_url);
        }

        if let Ok(image_name) = env::var("CRAWLER_IMAGE_NAME") {
            self.image_name = Some(image_name);
        }

        if let Ok(dir) = env::var("CRAWLER_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }

        if let Ok(headless) = env::var("CRAWLER_HEADLESS") {
            self.headless = headless
                .parse()
                .map_err(|_| Error::configuration("Invalid CRAWLER_HEADLESS"))?;
        }

        if let Ok(timeout) = env::var("CRAWLER_NAVIGATION_TIMEOUT") {
            self.navigation_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid CRAWLER_NAVIGATION_TIMEOUT"))?;
        }

        if let Ok(timeout) = env::var("CRAWLER_LAUNCH_TIMEOUT") {
            self.launch_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid CRAWLER_LAUNCH_TIMEOUT"))?;
        }

        if let Ok(chrome_path) = env::var("CRAWLER_CHROME_PATH") {
            self.chrome_path = Some(PathBuf::from(chrome_path));
        }

        if let Ok(endpoint) = env::var("CRAWLER_CDP_ENDPOINT") {
            self.cdp_endpoint = Some(endpoint);
        }

        if let Ok(log_level) = env::var("CRAWLER_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(self)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::configuration("Viewport dimensions must be non-zero"));
        }

        if self.navigation_timeout_ms == 0 {
            return Err(Error::configuration("Navigation timeout must be non-zero"));
        }

        if self.item_selector.trim().is_empty() {
            return Err(Error::configuration("Item selector must not be empty"));
        }

        if self.image_url.is_some() != self.image_name.is_some() {
            return Err(Error::configuration(
                "image_url and image_name must be set together",
            ));
        }

        Ok(())
    }

    /// The image to download, when both URL and name are configured
    pub fn image_download(&self) -> Option<(&str, &str)> {
        match (&self.image_url, &self.image_name) {
            (Some(url), Some(name)) => Some((url.as_str(), name.as_str())),
            _ => None,
        }
    }
}
