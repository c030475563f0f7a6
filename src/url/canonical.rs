use std::fmt;
use url::Url;

/// Schemes the spider is willing to fetch
const SPIDER_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Canonical identity of a URL: its decomposed 6-tuple
///
/// Two raw strings that decompose to the same tuple are the same URL as far
/// as the registry and the `url` table are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalId {
    pub scheme: String,
    /// Network location: `host` or `host:port`
    pub host: String,
    pub path: String,
    pub params: String,
    pub query: String,
    pub fragment: String,
}

impl CanonicalId {
    /// Builds an identity for a string the URL parser rejected
    ///
    /// The raw text is kept verbatim as the path; scheme and host are empty so
    /// the scheme filter skips it.
    fn opaque(raw: &str) -> Self {
        Self {
            scheme: String::new(),
            host: String::new(),
            path: raw.to_string(),
            params: String::new(),
            query: String::new(),
            fragment: String::new(),
        }
    }

    /// Host name without port, lowercased
    pub fn hostname(&self) -> String {
        let host = match self.host.rsplit_once(':') {
            // IPv6 literals keep their brackets; only strip a trailing port
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => self.host.as_str(),
        };
        host.to_lowercase()
    }

    /// `scheme://host`, the key reports cluster nodes by
    pub fn origin(&self) -> String {
        if self.scheme.is_empty() {
            self.host.clone()
        } else {
            format!("{}://{}", self.scheme, self.host)
        }
    }

    /// Everything after the host: path, params, query and fragment
    pub fn path_and_rest(&self) -> String {
        let mut out = self.path.clone();
        if !self.params.is_empty() {
            out.push(';');
            out.push_str(&self.params);
        }
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }

    /// Returns true if the scheme is one the spider fetches
    pub fn is_spiderable(&self) -> bool {
        SPIDER_SCHEMES.contains(&self.scheme.to_lowercase().as_str())
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scheme.is_empty() {
            return write!(f, "{}", self.path_and_rest());
        }
        if self.host.is_empty() {
            // cannot-be-a-base URLs such as mailto:
            return write!(f, "{}:{}", self.scheme, self.path_and_rest());
        }
        write!(f, "{}{}", self.origin(), self.path_and_rest())
    }
}

/// Decomposes a raw URL string into its canonical identity
///
/// This never fails: strings the parser rejects become opaque identities
/// whose path is the raw text.
///
/// # Examples
///
/// ```
/// use depspider::url::canonicalize;
///
/// let a = canonicalize("HTTP://Example.COM");
/// let b = canonicalize("http://example.com/");
/// assert_eq!(a, b);
/// assert_eq!(a.path, "/");
/// ```
pub fn canonicalize(raw: &str) -> CanonicalId {
    let url = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(_) => return CanonicalId::opaque(raw),
    };

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    // Params live on the last path segment only: /a/b;type=x
    let (path, params) = split_params(url.path());

    CanonicalId {
        scheme: url.scheme().to_string(),
        host,
        path,
        params,
        query: url.query().unwrap_or_default().to_string(),
        fragment: url.fragment().unwrap_or_default().to_string(),
    }
}

fn split_params(path: &str) -> (String, String) {
    let last_slash = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[last_slash..].find(';') {
        Some(i) => {
            let split = last_slash + i;
            (path[..split].to_string(), path[split + 1..].to_string())
        }
        None => (path.to_string(), String::new()),
    }
}
