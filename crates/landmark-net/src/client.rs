//! HTTP Client
//!
//! Uses hyper with tokio for plain HTTP/1.1 GET requests.
//! HTTPS goes through rustls with the webpki root store. Redirects are
//! followed up to a configured hop count.

use http_body_util::{BodyExt, Empty, Limited};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, CONTENT_TYPE, HOST, LOCATION, USER_AGENT};
use hyper::{Method, Request, StatusCode};
use rustls::ClientConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};
use url::Url;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Body read error: {0}")]
    BodyError(String),

    #[error("Too many redirects ({0})")]
    TooManyRedirects(usize),
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User-Agent string
    pub user_agent: String,
    /// Maximum response body size
    pub max_body_size: usize,
    /// Redirects followed before giving up
    pub max_redirects: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("athens-map/{}", env!("CARGO_PKG_VERSION")),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            max_redirects: 10,
        }
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct Response {
    /// Final URL after redirects
    pub url: Url,
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
    /// Total download time
    pub total_time: Duration,
}

impl Response {
    /// Check if response was successful (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get Content-Type header
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }
}

/// Minimal HTTP client
#[derive(Clone)]
pub struct HttpClient {
    config: HttpClientConfig,
    tls: TlsConnector,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: HttpClientConfig) -> Self {
        info!(
            "HTTP client initialized (max body: {} bytes)",
            config.max_body_size
        );

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            config,
            tls: TlsConnector::from(Arc::new(tls_config)),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(HttpClientConfig::default())
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Perform a GET request, following redirects, and read the whole
    /// body of the final response
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let start = Instant::now();
        let mut current = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        let mut redirects = 0;

        loop {
            let response = self.exchange(&current).await?;
            let status = response.status();

            if is_redirect(status) {
                let target = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(|location| current.join(location));
                if let Some(target) = target {
                    if redirects >= self.config.max_redirects {
                        return Err(HttpError::TooManyRedirects(redirects));
                    }
                    let next = target.map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
                    debug!("HTTP {} {} -> {}", status.as_u16(), current, next);
                    redirects += 1;
                    current = next;
                    continue;
                }
            }

            let headers = response.headers().clone();
            let collected = Limited::new(response.into_body(), self.config.max_body_size)
                .collect()
                .await
                .map_err(|e| HttpError::BodyError(e.to_string()))?;
            let body = collected.to_bytes().to_vec();
            let total_time = start.elapsed();

            debug!(
                "HTTP GET {} -> {} ({} bytes, {} redirects, {:?})",
                current,
                status,
                body.len(),
                redirects,
                total_time
            );

            return Ok(Response {
                url: current,
                status,
                headers,
                body,
                total_time,
            });
        }
    }

    /// One request/response exchange, body not yet read
    async fn exchange(&self, url: &Url) -> Result<hyper::Response<hyper::body::Incoming>, HttpError> {
        let is_https = match url.scheme() {
            "https" => true,
            "http" => false,
            other => return Err(HttpError::InvalidUrl(format!("unsupported scheme: {}", other))),
        };
        let host = url
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| HttpError::InvalidUrl("No port for URL".to_string()))?;

        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let host_header = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };

        let request = Request::builder()
            .method(Method::GET)
            .uri(target)
            .header(HOST, host_header)
            .header(USER_AGENT, &self.config.user_agent)
            .body(Empty::<Bytes>::new())
            .map_err(|e| HttpError::HttpError(e.to_string()))?;

        let stream = tokio::net::TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| HttpError::ConnectionFailed(e.to_string()))?;

        if is_https {
            let server_name = rustls::pki_types::ServerName::try_from(host)
                .map_err(|_| HttpError::TlsError("Invalid server name".to_string()))?;
            let tls_stream = self
                .tls
                .connect(server_name, stream)
                .await
                .map_err(|e| HttpError::TlsError(e.to_string()))?;
            send(tls_stream, request).await
        } else {
            send(stream, request).await
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// Run one HTTP/1.1 exchange over an established stream
async fn send<S>(
    stream: S,
    request: Request<Empty<Bytes>>,
) -> Result<hyper::Response<hyper::body::Incoming>, HttpError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| HttpError::HttpError(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            warn!("Connection error: {}", e);
        }
    });

    sender
        .send_request(request)
        .await
        .map_err(|e| HttpError::HttpError(e.to_string()))
}
