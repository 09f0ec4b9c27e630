use std::sync::Arc;

use bytes::Bytes;
use log::info;
use url::Url;

use crate::dispatch::{plan_tasks, render_all};
use crate::fetch::SeedFetcher;
use crate::links::LinkCollector;
use crate::merge::merge_documents;
use crate::render::PageRenderer;
use crate::types::ScrapeError;

/// Merged output of one full collect → render → merge run.
#[derive(Debug)]
pub struct SiteSnapshot {
    pub pdf: Vec<u8>,
    /// Pages that rendered successfully and made it into the merge.
    pub page_count: usize,
    /// Links dispatched, including ones that failed to render.
    pub link_count: usize,
}

/// Validate a caller-supplied seed URL. Anything without an http-ish scheme
/// (including unparseable input) is rejected before any work starts.
pub fn parse_seed(raw: &str) -> Result<Url, ScrapeError> {
    let url = Url::parse(raw).map_err(|_| ScrapeError::InvalidScheme)?;
    if !url.scheme().starts_with("http") {
        return Err(ScrapeError::InvalidScheme);
    }
    Ok(url)
}

/// Run the whole pipeline for one seed URL: discover same-site links, render
/// each with at most `workers` concurrent browser processes, and merge the
/// survivors in canonical order.
///
/// This blocks until every task completes or fails; the caller's response is
/// not produced before the full pipeline finishes.
pub async fn bind_site(
    fetcher: Arc<dyn SeedFetcher>,
    renderer: &dyn PageRenderer,
    seed: &Url,
    workers: usize,
) -> Result<SiteSnapshot, ScrapeError> {
    let links = LinkCollector::new(fetcher).collect(seed).await?;
    info!("{} links qualified under {seed}", links.len());

    let link_count = links.len();
    let results = render_all(renderer, plan_tasks(&links), workers).await;

    let buffers: Vec<Bytes> = results
        .iter()
        .filter_map(|result| result.page_data().cloned())
        .collect();
    if buffers.is_empty() {
        return Err(ScrapeError::NoRenderableResults);
    }

    let page_count = buffers.len();
    let pdf = merge_documents(&buffers)?;
    info!("merged {page_count}/{link_count} pages for {seed}");

    Ok(SiteSnapshot {
        pdf,
        page_count,
        link_count,
    })
}
