//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the spider, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - HEAD probes to learn status, headers and Content-Type
//! - GET requests for HTML pages on allowed hosts
//! - Body truncation at the content ceiling
//! - Transport error classification

use crate::config::Config;
use crate::state::TransportOutcome;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

/// Maximum redirect hops followed inside the transport
const MAX_REDIRECTS: usize = 10;

/// Everything the spider needs to know about one fetch attempt
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Status line or classified transport failure
    pub outcome: TransportOutcome,

    /// URL the transport ended on after redirects, if a response arrived
    pub final_url: Option<String>,

    /// Response headers, keys lowercased
    pub headers: Vec<(String, String)>,

    /// Header bytes plus body bytes (Content-Length when no body was read)
    pub bytes: u64,

    /// Wall time of the whole attempt
    pub elapsed_ms: u64,

    /// Decoded body, present only for full fetches of HTML pages
    pub body: Option<String>,
}

impl FetchResponse {
    /// A response for an attempt that never got a status line
    pub fn failure(outcome: TransportOutcome, elapsed_ms: u64) -> Self {
        Self {
            outcome,
            final_url: None,
            headers: Vec::new(),
            bytes: 0,
            elapsed_ms,
            body: None,
        }
    }
}

/// Source of page fetches
///
/// The coordinator is generic over this trait so traversal can be driven by
/// something other than the network.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetches `url`
    ///
    /// A HEAD probe is always made. When `allow_body` is true and the probe
    /// reports an HTML content type, the page body is fetched as well.
    async fn fetch(&self, url: &str, allow_body: bool) -> FetchResponse;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The spider configuration (user agent and per-URL timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use depspider::config::Config;
/// use depspider::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.agent.clone())
        .timeout(Duration::from_secs(config.crawler.url_timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a reqwest error to a transport outcome
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | Deadline exceeded | `TimedOut` |
/// | DNS, refused, reset, TLS handshake | `ConnectFailed` |
/// | Anything else | `Failed` |
pub fn classify_transport_error(error: &reqwest::Error) -> TransportOutcome {
    if error.is_timeout() {
        TransportOutcome::TimedOut(error.to_string())
    } else if error.is_connect() {
        TransportOutcome::ConnectFailed(error.to_string())
    } else {
        TransportOutcome::Failed(error.to_string())
    }
}

/// Returns true if the headers announce an HTML document
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.to_ascii_lowercase();
            v.contains("text/html") || v.contains("application/xhtml")
        })
        .unwrap_or(false)
}

/// Approximate on-the-wire size of a header block
fn header_bytes(headers: &HeaderMap) -> u64 {
    headers
        .iter()
        .map(|(name, value)| (name.as_str().len() + value.as_bytes().len() + 4) as u64)
        .sum()
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Fetcher backed by a reqwest client
pub struct HttpFetcher {
    client: Client,
    max_content_size: usize,
    /// Deadline for the whole attempt: probe, fallback GET and body
    url_timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the spider configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            max_content_size: usize::try_from(config.crawler.max_content_size)
                .unwrap_or(usize::MAX),
            url_timeout: Duration::from_secs(config.crawler.url_timeout),
        })
    }

    /// Sends the HEAD probe, retrying as GET when the server rejects HEAD
    async fn probe(&self, url: &str) -> Result<(Response, bool), reqwest::Error> {
        let response = self.client.head(url).send().await?;
        match response.status() {
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                debug!("HEAD rejected with {} for {}, retrying as GET", response.status(), url);
                let response = self.client.get(url).send().await?;
                Ok((response, true))
            }
            _ => Ok((response, false)),
        }
    }

    /// Reads the body up to the content ceiling
    ///
    /// Anything past the ceiling is discarded; truncation is not an error.
    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>, reqwest::Error> {
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = self.max_content_size.saturating_sub(body.len());
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, allow_body: bool) -> FetchResponse {
        let started = Instant::now();

        let attempt = self.attempt(url, allow_body, started);
        match tokio::time::timeout(self.url_timeout, attempt).await {
            Ok(response) => response,
            Err(_) => {
                debug!("No complete response from {} within {:?}", url, self.url_timeout);
                FetchResponse::failure(
                    TransportOutcome::TimedOut(format!(
                        "deadline of {}s exceeded",
                        self.url_timeout.as_secs()
                    )),
                    elapsed_ms(started),
                )
            }
        }
    }
}

impl HttpFetcher {
    /// Probe, optional GET and body read for one URL
    async fn attempt(&self, url: &str, allow_body: bool, started: Instant) -> FetchResponse {
        let (probe, is_get) = match self.probe(url).await {
            Ok(probe) => probe,
            Err(e) => {
                return FetchResponse::failure(classify_transport_error(&e), elapsed_ms(started))
            }
        };

        let wants_body = allow_body && probe.status().is_success() && is_html(probe.headers());

        let response = if !wants_body || is_get {
            probe
        } else {
            match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    return FetchResponse::failure(
                        classify_transport_error(&e),
                        elapsed_ms(started),
                    )
                }
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());
        let mut bytes = header_bytes(response.headers());

        let body = if wants_body && is_html(response.headers()) {
            match self.read_body(response).await {
                Ok(raw) => {
                    bytes += raw.len() as u64;
                    Some(String::from_utf8_lossy(&raw).into_owned())
                }
                Err(e) => {
                    return FetchResponse::failure(
                        classify_transport_error(&e),
                        elapsed_ms(started),
                    )
                }
            }
        } else {
            bytes += content_length(response.headers());
            None
        };

        FetchResponse {
            outcome: TransportOutcome::Status(status),
            final_url: Some(final_url),
            headers,
            bytes,
            elapsed_ms: elapsed_ms(started),
            body,
        }
    }
}
