//! Manifest transport.

use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::error::{MtbError, MtbResult};
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Reads manifest documents from disk or over HTTP.
#[derive(Debug, Clone)]
pub struct ManifestFetcher {
    http: Client,
}

/// How a manifest location is read.
enum Transport {
    File(PathBuf),
    Http(Url),
    Unsupported(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ManifestFetcher {
    /// Create a fetcher whose HTTP requests time out after `timeout`.
    pub fn new(timeout: Duration) -> MtbResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Create a fetcher with the default timeout.
    pub fn with_default_timeout() -> MtbResult<Self> {
        Self::new(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Fetch one document.
    ///
    /// Returns `None` for schemes that cannot be read. HTTP is attempted once.
    pub async fn fetch(&self, uri: &str) -> MtbResult<Option<String>> {
        match transport(uri) {
            Transport::File(path) => {
                tracing::debug!("Reading manifest {}", path.display());
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| fetch_error(uri, e.to_string()))?;
                Ok(Some(text))
            }
            Transport::Http(url) => {
                tracing::debug!("Downloading manifest {}", url);
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| fetch_error(uri, e.to_string()))?;

                if !response.status().is_success() {
                    return Err(fetch_error(uri, format!("HTTP {}", response.status())));
                }

                let text = response
                    .text()
                    .await
                    .map_err(|e| fetch_error(uri, e.to_string()))?;
                Ok(Some(text))
            }
            Transport::Unsupported(scheme) => {
                tracing::debug!("Unsupported manifest scheme '{}' in {}", scheme, uri);
                Ok(None)
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn transport(uri: &str) -> Transport {
    match Url::parse(uri) {
        // Single letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => match url.scheme() {
            "http" | "https" => Transport::Http(url),
            "file" => match url.to_file_path() {
                Ok(path) => Transport::File(path),
                Err(()) => Transport::Unsupported("file".into()),
            },
            other => Transport::Unsupported(other.to_string()),
        },
        _ => Transport::File(PathBuf::from(uri)),
    }
}

fn fetch_error(uri: &str, reason: String) -> MtbError {
    MtbError::ManifestFetch {
        uri: uri.to_string(),
        reason,
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
