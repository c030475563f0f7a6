use crate::state::result::FetchRecord;
use crate::url::CanonicalId;
use std::collections::HashSet;
use std::fmt;

/// Index of a node inside a [`crate::url::UrlRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Embedded resources a page needs to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Stylesheet,
    Script,
    Image,
    Embed,
    Frame,
    Subframe,
}

impl DependencyKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Stylesheet => "stylesheet",
            Self::Script => "script",
            Self::Image => "image",
            Self::Embed => "embed",
            Self::Frame => "frame",
            Self::Subframe => "subframe",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Which of a node's seven reference sets a target belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Link,
    Dependency(DependencyKind),
}

impl ReferenceKind {
    /// Iteration order used whenever all references are walked
    pub const ALL: [ReferenceKind; 7] = [
        ReferenceKind::Link,
        ReferenceKind::Dependency(DependencyKind::Stylesheet),
        ReferenceKind::Dependency(DependencyKind::Script),
        ReferenceKind::Dependency(DependencyKind::Image),
        ReferenceKind::Dependency(DependencyKind::Embed),
        ReferenceKind::Dependency(DependencyKind::Frame),
        ReferenceKind::Dependency(DependencyKind::Subframe),
    ];

    fn slot(&self) -> usize {
        match self {
            Self::Link => 0,
            Self::Dependency(DependencyKind::Stylesheet) => 1,
            Self::Dependency(DependencyKind::Script) => 2,
            Self::Dependency(DependencyKind::Image) => 3,
            Self::Dependency(DependencyKind::Embed) => 4,
            Self::Dependency(DependencyKind::Frame) => 5,
            Self::Dependency(DependencyKind::Subframe) => 6,
        }
    }
}

/// Collects references while a page is scanned
///
/// Each set keeps first-seen order and drops duplicates. Call
/// [`ReferencesBuilder::finish`] once to get the immutable snapshot.
#[derive(Debug, Default)]
pub struct ReferencesBuilder {
    sets: [Vec<String>; 7],
    seen: [HashSet<String>; 7],
}

impl ReferencesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target; returns false if it was already in that set
    pub fn insert(&mut self, kind: ReferenceKind, target: String) -> bool {
        let slot = kind.slot();
        if !self.seen[slot].insert(target.clone()) {
            return false;
        }
        self.sets[slot].push(target);
        true
    }

    pub fn finish(self) -> References {
        References {
            sets: self.sets.map(Vec::into_boxed_slice),
        }
    }
}

/// Finalized outbound references of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    sets: [Box<[String]>; 7],
}

impl References {
    pub fn get(&self, kind: ReferenceKind) -> &[String] {
        &self.sets[kind.slot()]
    }

    /// Navigational links
    pub fn links(&self) -> &[String] {
        self.get(ReferenceKind::Link)
    }

    /// Every dependency target with its category
    pub fn dependencies(&self) -> impl Iterator<Item = (DependencyKind, &str)> {
        self.all().filter_map(|(kind, target)| match kind {
            ReferenceKind::Dependency(dep) => Some((dep, target)),
            ReferenceKind::Link => None,
        })
    }

    /// Links followed by dependencies, in category order
    pub fn all(&self) -> impl Iterator<Item = (ReferenceKind, &str)> {
        ReferenceKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |t| (kind, t.as_str())))
    }

    pub fn len(&self) -> usize {
        self.sets.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A URL known to the current crawl
#[derive(Debug, Clone)]
pub struct UrlNode {
    /// The string the URL was first discovered as
    pub url: String,

    pub id: CanonicalId,

    /// How many hops from the root it was first discovered at
    pub depth: u32,

    /// First page that referenced it; informational only
    pub parent: Option<NodeId>,

    /// Absent until the URL is dequeued and fetched
    pub fetch: Option<FetchRecord>,

    references: References,

    /// Cached `url.id` once the node has been written to storage
    pub db_id: Option<i64>,
}

impl UrlNode {
    pub fn new(url: String, id: CanonicalId, depth: u32, parent: Option<NodeId>) -> Self {
        Self {
            url,
            id,
            depth,
            parent,
            fetch: None,
            references: References::default(),
            db_id: None,
        }
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    /// Replaces the reference sets; a second extraction overwrites the first
    pub fn set_references(&mut self, references: References) {
        self.references = references;
    }

    pub fn is_fetched(&self) -> bool {
        self.fetch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::canonicalize;

    #[test]
    fn test_builder_collapses_duplicates() {
        let mut builder = ReferencesBuilder::new();
        assert!(builder.insert(ReferenceKind::Link, "http://a.test/x".into()));
        assert!(!builder.insert(ReferenceKind::Link, "http://a.test/x".into()));
        assert!(builder.insert(
            ReferenceKind::Dependency(DependencyKind::Image),
            "http://a.test/x".into()
        ));

        let refs = builder.finish();
        assert_eq!(refs.links(), ["http://a.test/x".to_string()]);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_all_walks_categories_in_order() {
        let mut builder = ReferencesBuilder::new();
        builder.insert(
            ReferenceKind::Dependency(DependencyKind::Script),
            "s.js".into(),
        );
        builder.insert(ReferenceKind::Link, "b".into());
        builder.insert(ReferenceKind::Link, "a".into());
        builder.insert(
            ReferenceKind::Dependency(DependencyKind::Stylesheet),
            "c.css".into(),
        );

        let refs = builder.finish();
        let order: Vec<&str> = refs.all().map(|(_, t)| t).collect();
        assert_eq!(order, vec!["b", "a", "c.css", "s.js"]);
    }

    #[test]
    fn test_dependencies_excludes_links() {
        let mut builder = ReferencesBuilder::new();
        builder.insert(ReferenceKind::Link, "page".into());
        builder.insert(
            ReferenceKind::Dependency(DependencyKind::Subframe),
            "frame.html".into(),
        );

        let refs = builder.finish();
        let deps: Vec<_> = refs.dependencies().collect();
        assert_eq!(deps, vec![(DependencyKind::Subframe, "frame.html")]);
    }

    #[test]
    fn test_set_references_overwrites() {
        let mut node = UrlNode::new(
            "http://a.test/".into(),
            canonicalize("http://a.test/"),
            0,
            None,
        );

        let mut first = ReferencesBuilder::new();
        first.insert(ReferenceKind::Link, "one".into());
        node.set_references(first.finish());

        let mut second = ReferencesBuilder::new();
        second.insert(ReferenceKind::Link, "two".into());
        node.set_references(second.finish());

        assert_eq!(node.references().links(), ["two".to_string()]);
    }
}
