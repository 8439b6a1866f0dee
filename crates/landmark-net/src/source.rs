//! Resource Sources
//!
//! Whole-document retrieval from a location string. A location is
//! either an `http(s)://` URL, a `file://` URL, or a filesystem path
//! (relative paths resolve against the fetcher's base directory).

use crate::client::{HttpClient, HttpClientConfig, HttpError};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Retrieval errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{location}: status {status}")]
    Status { location: String, status: u16 },

    #[error("{location}: {source}")]
    Http {
        location: String,
        #[source]
        source: HttpError,
    },

    #[error("{location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("{0}: not found")]
    NotFound(String),
}

/// Something that can read a whole document from a location
pub trait ResourceFetcher {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// Parsed form of a location string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Http(String),
    File(PathBuf),
}

impl Location {
    pub fn parse(location: &str) -> Result<Self, FetchError> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidLocation(location.to_string()));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(Location::Http(trimmed.to_string()));
        }

        if trimmed.starts_with("file://") {
            let url =
                Url::parse(trimmed).map_err(|_| FetchError::InvalidLocation(location.to_string()))?;
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::InvalidLocation(location.to_string()))?;
            return Ok(Location::File(path));
        }

        Ok(Location::File(PathBuf::from(trimmed)))
    }
}

/// Default fetcher: HTTP(S) through [`HttpClient`], everything else
/// from the filesystem
#[derive(Clone)]
pub struct SourceFetcher {
    http: HttpClient,
    base_dir: PathBuf,
}

impl SourceFetcher {
    pub fn new(config: HttpClientConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: HttpClient::new(config),
            base_dir: base_dir.into(),
        }
    }

    /// Relative paths resolve against the current directory
    pub fn with_defaults() -> Self {
        Self::new(HttpClientConfig::default(), ".")
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ResourceFetcher for SourceFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        match Location::parse(location)? {
            Location::Http(url) => {
                let response = self.http.get(&url).await.map_err(|source| FetchError::Http {
                    location: location.to_string(),
                    source,
                })?;
                if !response.is_success() {
                    return Err(FetchError::Status {
                        location: location.to_string(),
                        status: response.status.as_u16(),
                    });
                }
                debug!(
                    "Fetched {} ({} bytes, {})",
                    location,
                    response.body.len(),
                    response.content_type().unwrap_or("unknown type")
                );
                Ok(response.body)
            }
            Location::File(path) => {
                let path = self.resolve(path);
                let body = tokio::fs::read(&path).await.map_err(|source| FetchError::Io {
                    location: location.to_string(),
                    source,
                })?;
                debug!("Read {} ({} bytes)", path.display(), body.len());
                Ok(body)
            }
        }
    }
}

/// In-memory documents keyed by location
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Result<Vec<u8>, u16>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `location`
    pub fn insert(&mut self, location: &str, body: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.insert(location.to_string(), Ok(body.into()));
        self
    }

    /// Answer `location` with a non-success status
    pub fn insert_status(&mut self, location: &str, status: u16) -> &mut Self {
        self.entries.insert(location.to_string(), Err(status));
        self
    }
}

impl ResourceFetcher for MemoryFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        match self.entries.get(location) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                location: location.to_string(),
                status: *status,
            }),
            None => Err(FetchError::NotFound(location.to_string())),
        }
    }
}
