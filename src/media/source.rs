use std::fmt;
use std::path::PathBuf;

use reqwest::{Client, Url};
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::{AssetError, FetchError, MemeError, Result};
use crate::retry::RetryPolicy;

/// Where the background image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An http(s) URL, downloaded and also handed to the detector as-is
    Url(String),
    /// A local file, sent to the detector as raw bytes
    Path(PathBuf),
}

impl ImageSource {
    /// Interpret a CLI argument: http(s) URLs are remote, anything without a scheme is a path
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FetchError::InvalidUri { uri: input.to_string() }.into());
        }

        if input.contains("://") {
            return Self::remote(input);
        }

        Ok(Self::Path(PathBuf::from(input)))
    }

    /// Accept only http(s) URLs; used where local paths must not be reachable
    pub fn remote(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = Url::parse(input)
            .map_err(|_| FetchError::InvalidUri { uri: input.to_string() })?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(Self::Url(url.to_string())),
            _ => Err(FetchError::InvalidUri { uri: input.to_string() }.into()),
        }
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Path(_) => None,
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads background image bytes from disk or over HTTP, with a timeout and size cap
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    config: FetchConfig,
    retry: RetryPolicy,
}

impl ImageFetcher {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        let retry = RetryPolicy::new(
            config.max_retries,
            std::time::Duration::from_millis(config.retry_backoff_ms),
        );
        Self { client, config, retry }
    }

    pub async fn load(&self, source: &ImageSource) -> Result<Vec<u8>> {
        match source {
            ImageSource::Url(url) => {
                self.retry
                    .run("image download", || self.download(url))
                    .await
            }
            ImageSource::Path(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|_| AssetError::NotFound { path: path.display().to_string() })?;
                self.check_size(&source.to_string(), bytes.len() as u64)?;
                Ok(bytes)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Downloading {}", url);

        let mut response = self.client
            .get(url)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                uri: url.to_string(),
                status: status.as_u16(),
            }.into());
        }

        if let Some(length) = response.content_length() {
            self.check_size(url, length)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.request_error(url, e))? {
            bytes.extend_from_slice(&chunk);
            self.check_size(url, bytes.len() as u64)?;
        }

        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    fn check_size(&self, uri: &str, size: u64) -> Result<()> {
        if size > self.config.max_image_bytes {
            return Err(FetchError::TooLarge {
                uri: uri.to_string(),
                limit: self.config.max_image_bytes,
            }.into());
        }
        Ok(())
    }

    fn request_error(&self, url: &str, error: reqwest::Error) -> MemeError {
        if error.is_timeout() {
            MemeError::Timeout {
                operation: format!("downloading {}", url),
                seconds: self.config.timeout_secs,
            }
        } else {
            FetchError::RequestFailed {
                uri: url.to_string(),
                reason: error.to_string(),
            }.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            ImageSource::parse("https://example.com/face.jpg").unwrap(),
            ImageSource::Url("https://example.com/face.jpg".to_string())
        );
        assert_eq!(
            ImageSource::parse("photos/face.jpg").unwrap(),
            ImageSource::Path(PathBuf::from("photos/face.jpg"))
        );
        assert!(ImageSource::parse("gs://bucket/face.jpg").is_err());
        assert!(ImageSource::parse("   ").is_err());
    }

    #[test]
    fn test_remote_rejects_paths() {
        assert!(ImageSource::remote("/etc/passwd").is_err());
        assert!(ImageSource::remote("file:///etc/passwd").is_err());
        assert!(ImageSource::remote("not a url").is_err());
        assert!(ImageSource::remote("http://example.com/a.png").is_ok());
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("face.bin");
        std::fs::write(&path, b"abc").unwrap();

        let fetcher = ImageFetcher::new(Client::new(), FetchConfig::default());
        let bytes = fetcher.load(&ImageSource::Path(path)).await.unwrap();
        assert_eq!(bytes, b"abc");
    }

    #[tokio::test]
    async fn test_local_file_size_cap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let config = FetchConfig { max_image_bytes: 16, ..FetchConfig::default() };
        let fetcher = ImageFetcher::new(Client::new(), config);
        let result = fetcher.load(&ImageSource::Path(path)).await;
        assert!(matches!(result, Err(MemeError::Fetch(FetchError::TooLarge { .. }))));
    }

    #[tokio::test]
    async fn test_stalled_download_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let config = FetchConfig { timeout_secs: 1, max_retries: 0, ..FetchConfig::default() };
        let fetcher = ImageFetcher::new(Client::new(), config);
        let source = ImageSource::remote(&format!("http://{}/face.png", addr)).unwrap();

        let result = fetcher.load(&source).await;
        assert!(matches!(result, Err(MemeError::Timeout { seconds: 1, .. })));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let fetcher = ImageFetcher::new(Client::new(), FetchConfig::default());
        let result = fetcher.load(&ImageSource::Path(PathBuf::from("/nonexistent/face.jpg"))).await;
        assert!(matches!(result, Err(MemeError::Asset(AssetError::NotFound { .. }))));
    }
}
