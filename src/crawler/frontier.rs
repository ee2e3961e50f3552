//! Depth-first traversal driver
//!
//! The frontier admits candidates (depth bound, domain allow-list, scheme,
//! visited set), fetches them one at a time, emits each page before any of
//! its children, and descends into children in markup order before moving on
//! to the next sibling.
//!
//! The walk uses an explicit stack of `(depth, remaining children)` frames
//! instead of recursion, so live state is bounded by depth times branching
//! factor and never by the call stack.

use url::Url;

use super::error::{CrawlError, FetchError};
use super::fetcher::PageFetcher;
use super::links::LinkExtractor;
use super::session::{CrawlScope, SessionOutcome};
use super::stream::{AbortReason, PageSink, StreamSink};
use super::url::{is_crawlable, VisitedSet};
use crate::models::FrontierEntry;

/// Remaining children of one expanded page
struct Frame {
    depth: u32,
    children: std::vec::IntoIter<Url>,
}

/// Result of expanding one admitted entry
enum Step {
    Descend(Vec<Url>),
    Abort(AbortReason),
}

/// Traversal state for one session
pub struct Frontier {
    scope: CrawlScope,
    visited: VisitedSet,
    extractor: LinkExtractor,

    /// Last page fetched, sent as referer on the next request
    referer: Option<Url>,

    /// Pages pushed to the sink so far
    pages: u64,
}

impl Frontier {
    pub fn new(scope: CrawlScope) -> Self {
        Self {
            scope,
            visited: VisitedSet::new(),
            extractor: LinkExtractor::new(),
            referer: None,
            pages: 0,
        }
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Decide whether a candidate is visited, recording it if so
    ///
    /// The seed is exempt from the domain and scheme checks; an unusable seed
    /// fails later in the fetcher instead of being skipped silently.
    pub fn admit(&mut self, entry: &FrontierEntry) -> bool {
        if entry.depth > self.scope.max_depth {
            return false;
        }

        if !entry.is_seed()
            && (!is_crawlable(&entry.url) || !self.scope.domains.allows(&entry.url))
        {
            tracing::trace!(url = %entry.url, "Skipping link outside allowed domains");
            return false;
        }

        self.visited.insert(&entry.url)
    }

    /// Walk from the seed until the frontier is exhausted or the gate closes
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Fetch` on the first transport failure. Pages
    /// pushed before the failure stay delivered.
    pub async fn run<F, S>(
        &mut self,
        fetcher: &F,
        sink: &mut StreamSink<S>,
    ) -> Result<SessionOutcome, CrawlError>
    where
        F: PageFetcher + ?Sized,
        S: PageSink,
    {
        let seed = Url::parse(&self.scope.seed).map_err(|e| {
            CrawlError::fetch(self.scope.seed.clone(), FetchError::InvalidUrl(e.to_string()))
        })?;
        let seed = FrontierEntry::new(seed, 0);

        if !self.admit(&seed) {
            return Ok(SessionOutcome::Completed);
        }

        let mut stack = match self.expand(seed, fetcher, sink).await? {
            Step::Abort(reason) => return Ok(SessionOutcome::Aborted(reason)),
            Step::Descend(children) => vec![Frame {
                depth: 0,
                children: children.into_iter(),
            }],
        };

        while let Some(frame) = stack.last_mut() {
            let Some(url) = frame.children.next() else {
                stack.pop();
                continue;
            };

            let entry = FrontierEntry::new(url, frame.depth + 1);
            if !self.admit(&entry) {
                continue;
            }

            let depth = entry.depth;
            match self.expand(entry, fetcher, sink).await? {
                Step::Abort(reason) => return Ok(SessionOutcome::Aborted(reason)),
                Step::Descend(children) if !children.is_empty() => stack.push(Frame {
                    depth,
                    children: children.into_iter(),
                }),
                Step::Descend(_) => {}
            }
        }

        Ok(SessionOutcome::Completed)
    }

    /// Fetch, emit and extract one admitted entry
    async fn expand<F, S>(
        &mut self,
        entry: FrontierEntry,
        fetcher: &F,
        sink: &mut StreamSink<S>,
    ) -> Result<Step, CrawlError>
    where
        F: PageFetcher + ?Sized,
        S: PageSink,
    {
        if let Some(reason) = sink.check() {
            return Ok(Step::Abort(reason));
        }

        let page = fetcher
            .fetch(&entry.url, self.referer.as_ref())
            .await
            .map_err(|e| CrawlError::fetch(entry.url.as_str(), e))?;

        let (result, base) = page.into_result();
        if base != entry.url && !self.visited.insert(&base) {
            tracing::debug!(
                url = %entry.url,
                target = %base,
                "redirect to visited page, skipping"
            );
            return Ok(Step::Descend(Vec::new()));
        }

        // Children of a page at the bound could never be admitted
        let children = if entry.depth < self.scope.max_depth {
            self.extractor.extract(&result.text, &base)
        } else {
            Vec::new()
        };

        tracing::info!(
            url = %result.url,
            status = result.status,
            depth = entry.depth,
            links = children.len(),
            "scraping"
        );

        self.referer = Some(base);

        if let Err(reason) = sink.push(result).await {
            return Ok(Step::Abort(reason));
        }
        self.pages += 1;

        Ok(Step::Descend(children))
    }
}
