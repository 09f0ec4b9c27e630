use std::collections::BTreeSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use url::Url;

use crate::decode::decode_html;
use crate::fetch::SeedFetcher;
use crate::types::ScrapeError;

/// Extract anchor targets from seed markup and reduce them to the canonical
/// render order: filtered, deduplicated, lexicographically sorted absolute
/// URLs.
///
/// The filter is deliberately loose and matches the shipped behavior:
///   - `mailto:` and `javascript:` targets are discarded;
///   - a target survives if the raw href is path-relative (`/` or `./`) or
///     the seed URL string occurs inside the resolved absolute target
///     (substring containment, not a host comparison);
///   - a survivor is kept only if it ends in `.html` or its absolute form
///     contains at most one `.` after stripping a trailing slash, which
///     weeds out asset links such as images and versioned paths.
pub fn filter_links(seed: &Url, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut links = BTreeSet::new();
    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.starts_with("mailto:") || href.starts_with("javascript:") {
            continue;
        }

        let Ok(resolved) = seed.join(href) else {
            continue;
        };
        let absolute = resolved.to_string();

        let path_relative = href.starts_with('/') || href.starts_with("./");
        if !path_relative && !absolute.contains(seed.as_str()) {
            continue;
        }

        if absolute.ends_with(".html")
            || absolute.trim_end_matches('/').matches('.').count() <= 1
        {
            links.insert(absolute);
        }
    }

    links.into_iter().collect()
}

/// Fetches one seed page and derives the link set to render.
pub struct LinkCollector {
    fetcher: Arc<dyn SeedFetcher>,
}

impl LinkCollector {
    pub fn new(fetcher: Arc<dyn SeedFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch the seed page, decode it, and return the canonical link set.
    /// An empty set is `NoLinksFound`, a terminal condition for the request.
    pub async fn collect(&self, seed: &Url) -> Result<Vec<String>, ScrapeError> {
        let page = self.fetcher.fetch(seed.as_str()).await?;
        let decoded = decode_html(&page.bytes, page.content_type.as_deref());
        let links = filter_links(seed, &decoded.html);
        if links.is_empty() {
            return Err(ScrapeError::NoLinksFound);
        }
        Ok(links)
    }
}
