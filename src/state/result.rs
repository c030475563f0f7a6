//! Fetch result classification
//!
//! This module turns a raw transport outcome into the closed set of result
//! kinds the rest of the spider reasons about, and maps those kinds to the
//! numeric codes stored in the `url_fetch.result` column.

use std::fmt;

/// What the transport reported for a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// The server answered with a status line
    Status(u16),

    /// DNS failure, refused or reset connection, TLS handshake failure
    ConnectFailed(String),

    /// The per-URL deadline expired
    TimedOut(String),

    /// Any other transport failure (body decode, protocol violation, ...)
    Failed(String),
}

/// Classified result of fetching a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    /// 1xx/2xx/3xx response
    Ok(u16),

    /// 4xx/5xx response
    ClientOrServerError(u16),

    /// No status available: DNS, connect, refused
    ConnectionError,

    /// Deadline exceeded, or a transport failure that is not a connect error
    Timeout,

    /// Known only through a reference; never attempted
    NotFetched,
}

impl ResultKind {
    /// Classifies a transport outcome. Pure, no I/O.
    pub fn classify(outcome: &TransportOutcome) -> Self {
        match outcome {
            TransportOutcome::Status(code) if *code >= 400 => Self::ClientOrServerError(*code),
            TransportOutcome::Status(code) => Self::Ok(*code),
            TransportOutcome::ConnectFailed(_) => Self::ConnectionError,
            TransportOutcome::TimedOut(_) | TransportOutcome::Failed(_) => Self::Timeout,
        }
    }

    /// Returns true for every kind except `Ok` and `NotFetched`
    pub fn is_error(&self) -> bool {
        match self {
            Self::Ok(_) | Self::NotFetched => false,
            Self::ClientOrServerError(_) | Self::ConnectionError | Self::Timeout => true,
        }
    }

    /// Returns true for connection errors and timeouts
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::Timeout)
    }

    /// Numeric encoding stored in `url_fetch.result`
    ///
    /// HTTP status for responses, `-1` connection error, `-2` timeout or
    /// other transport failure, `0` not attempted.
    pub fn code(&self) -> i64 {
        match self {
            Self::Ok(code) | Self::ClientOrServerError(code) => i64::from(*code),
            Self::ConnectionError => -1,
            Self::Timeout => -2,
            Self::NotFetched => 0,
        }
    }

    /// Decodes a stored result code
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::NotFetched,
            -1 => Self::ConnectionError,
            c if c < 0 => Self::Timeout,
            c if c >= 400 => Self::ClientOrServerError(u16::try_from(c).unwrap_or(u16::MAX)),
            c => Self::Ok(u16::try_from(c).unwrap_or(0)),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(code) | Self::ClientOrServerError(code) => write!(f, "{}", code),
            Self::ConnectionError => write!(f, "ERR connect"),
            Self::Timeout => write!(f, "ERR timeout"),
            Self::NotFetched => write!(f, "not fetched"),
        }
    }
}

/// Immutable record of one fetch, owned by one URL node in one run
#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub kind: ResultKind,

    /// Unix timestamp (seconds) the fetch started
    pub started_at: i64,

    /// Wall time spent on the fetch
    pub elapsed_ms: u64,

    /// Header bytes plus body bytes (or Content-Length when no body was read)
    pub bytes: u64,

    /// Response headers, keys lowercased
    pub headers: Vec<(String, String)>,
}
