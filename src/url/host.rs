use std::collections::BTreeSet;

/// The allow-host set of a run
///
/// A host is allowed when its lowercased name ends with any entry. This is a
/// plain suffix match: `example.com` also admits `blog.example.com` and
/// `evil-example.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostMask {
    hosts: BTreeSet<String>,
}

impl HostMask {
    /// Builds the mask from the root host plus any extra entries
    ///
    /// # Examples
    ///
    /// ```
    /// use depspider::url::HostMask;
    ///
    /// let mask = HostMask::new("Example.com", ["cdn.other.net"]);
    /// assert!(mask.allows("www.example.com"));
    /// assert!(mask.allows("CDN.OTHER.NET"));
    /// assert!(!mask.allows("other.net"));
    /// ```
    pub fn new<I, S>(root_host: &str, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hosts: BTreeSet<String> = extra
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        if !root_host.is_empty() {
            hosts.insert(root_host.to_lowercase());
        }
        Self { hosts }
    }

    pub fn allows(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.hosts.iter().any(|entry| host.ends_with(entry.as_str()))
    }

    /// Sorted, comma-separated entries as stored in `spider_run.hosts_allowed`
    pub fn to_db_string(&self) -> String {
        self.hosts.iter().cloned().collect::<Vec<_>>().join(",")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}
