//! HTML reference extraction
//!
//! This module scans a fetched page for the tag/attribute pairs the spider
//! monitors and sorts each reference into a link or a typed dependency:
//!
//! | Selector | Reference |
//! |----------|-----------|
//! | `a[href]` | link |
//! | `link[href]` | stylesheet |
//! | `img[src]` | image |
//! | `style[src]` | stylesheet |
//! | `script[src]` | script |
//! | `embed[src]` | embed |
//! | `frame[src]` | frame |
//! | `iframe[src]` | subframe |
//!
//! Scheme filtering is not done here; `mailto:` and friends are recorded
//! like anything else and skipped later by the scheduler.

use crate::state::{DependencyKind, ReferenceKind, References, ReferencesBuilder};
use scraper::{Html, Selector};
use tracing::warn;
use url::Url;

/// Monitored tags, the attribute read from each, and what it references
const MONITORED: [(&str, &str, ReferenceKind); 8] = [
    ("a[href]", "href", ReferenceKind::Link),
    ("link[href]", "href", ReferenceKind::Dependency(DependencyKind::Stylesheet)),
    ("img[src]", "src", ReferenceKind::Dependency(DependencyKind::Image)),
    ("style[src]", "src", ReferenceKind::Dependency(DependencyKind::Stylesheet)),
    ("script[src]", "src", ReferenceKind::Dependency(DependencyKind::Script)),
    ("embed[src]", "src", ReferenceKind::Dependency(DependencyKind::Embed)),
    ("frame[src]", "src", ReferenceKind::Dependency(DependencyKind::Frame)),
    ("iframe[src]", "src", ReferenceKind::Dependency(DependencyKind::Subframe)),
];

/// Extracts every monitored reference from a page
///
/// # Arguments
///
/// * `html` - The page body
/// * `base` - URL relative references are resolved against (the final URL
///   of the fetch)
///
/// # Returns
///
/// An immutable snapshot of the page's references. Duplicates within a
/// category collapse; the first occurrence keeps its position.
///
/// # Example
///
/// ```
/// use depspider::crawler::extract_references;
///
/// let html = r#"<a href="/p1">p1</a><img src="logo.png">"#;
/// let refs = extract_references(html, "http://example.com/index.html");
/// assert_eq!(refs.links(), ["http://example.com/p1"]);
/// assert_eq!(refs.len(), 2);
/// ```
pub fn extract_references(html: &str, base: &str) -> References {
    let document = Html::parse_document(html);
    let base_url = Url::parse(base).ok();
    let mut builder = ReferencesBuilder::new();

    for (selector, attribute, kind) in MONITORED {
        let selector = match Selector::parse(selector) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Skipping selector {}: {:?}", selector, e);
                continue;
            }
        };

        for element in document.select(&selector) {
            if let Some(target) = element
                .value()
                .attr(attribute)
                .and_then(|value| resolve_reference(value, base_url.as_ref()))
            {
                builder.insert(kind, target);
            }
        }
    }

    builder.finish()
}

/// Resolves one attribute value
///
/// The parser has already decoded character references in `value`, so it is
/// used as-is. Returns `None` for empty values. A value that cannot be
/// resolved is kept verbatim so it still shows up as an (opaque) reference.
fn resolve_reference(value: &str, base: Option<&Url>) -> Option<String> {
    let value = value.trim();

    if value.is_empty() {
        return None;
    }

    let resolved = match base {
        Some(base) => base
            .join(value)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| value.to_string()),
        None => value.to_string(),
    };

    Some(resolved)
}
