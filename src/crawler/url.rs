//! URL canonicalization, domain filtering and per-session deduplication
//!
//! Every candidate the frontier considers goes through three checks in this
//! module: a scheme check, the domain allow-list and the visited set.

use std::collections::HashSet;
use url::Url;

/// Canonical string form of a URL used as the dedup key
///
/// The `url` crate already lower-cases scheme and host, drops default ports
/// and resolves dot segments. The fragment is removed on top of that since it
/// never changes what the server returns.
///
/// # Examples
///
/// ```
/// use sitestream::crawler::url::canonicalize;
/// use url::Url;
///
/// let a = Url::parse("HTTPS://Example.com:443/a/./b#top").unwrap();
/// let b = Url::parse("https://example.com/a/b").unwrap();
/// assert_eq!(canonicalize(&a), canonicalize(&b));
/// ```
pub fn canonicalize(url: &Url) -> String {
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    canonical.into()
}

/// Whether the URL can be fetched at all
pub fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
}

/// Exact-hostname allow-list
///
/// An empty filter allows every host. Matching is exact: `example.com` does
/// not admit `www.example.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFilter {
    hosts: HashSet<String>,
}

impl DomainFilter {
    /// Build a filter from caller-supplied host names
    ///
    /// Names are trimmed and ASCII lower-cased so they compare equal to the
    /// host of a parsed [`Url`]. Blank entries are ignored.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self { hosts }
    }

    /// Filter that admits every host
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Check whether a URL's host is admitted
    ///
    /// # Examples
    ///
    /// ```
    /// use sitestream::crawler::url::DomainFilter;
    /// use url::Url;
    ///
    /// let filter = DomainFilter::new(["example.com"]);
    /// assert!(filter.allows(&Url::parse("https://example.com/docs").unwrap()));
    /// assert!(!filter.allows(&Url::parse("https://other.com/").unwrap()));
    /// ```
    pub fn allows(&self, url: &Url) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        url.host_str()
            .map(|host| self.hosts.contains(host))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Set of canonical URLs already accepted in one session
///
/// Not shared between sessions and never locked: a session is driven by a
/// single task.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-insert; returns `true` if the URL was not seen before
    pub fn insert(&mut self, url: &Url) -> bool {
        self.seen.insert(canonicalize(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(&canonicalize(url))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
