//! Image download over HTTP
//!
//! The body is fetched in full before anything touches the file system, so a
//! failed request leaves no directory or file behind.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension given to every downloaded file
pub const IMAGE_EXTENSION: &str = "jpg";

/// Fetches a URL and stores the body as `<dir>/<name>.jpg`
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: reqwest::Client,
    dir: PathBuf,
}

impl ImageDownloader {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            client: reqwest::Client::new(),
            dir: dir.into(),
        }
    }

    /// Directory files are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a download named `name` is written to
    pub fn target_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, IMAGE_EXTENSION))
    }

    /// GET `url` and write the body to `target_path(name)`, replacing any existing file
    pub async fn download(&self, url: &str, name: &str) -> Result<PathBuf> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.target_path(name);
        tokio::fs::write(&path, &body).await?;

        debug!("Wrote {} bytes to {}", body.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path() {
        let downloader = ImageDownloader::new("./download_images");
        assert_eq!(
            downloader.target_path("test"),
            PathBuf::from("./download_images/test.jpg")
        );
        assert_eq!(downloader.dir(), Path::new("./download_images"));
    }
}
