//! Sitebinder engine: link discovery, page rendering, and PDF assembly.
mod decode;
mod dispatch;
mod fetch;
mod links;
mod merge;
mod render;
mod session;
mod snapshot;
mod types;

pub use decode::{decode_html, DecodedHtml};
pub use dispatch::{clamp_workers, plan_tasks, render_all, DEFAULT_WORKERS, MAX_WORKERS};
pub use fetch::{FetchSettings, FetchedPage, ReqwestFetcher, SeedFetcher};
pub use links::{filter_links, LinkCollector};
pub use merge::merge_documents;
pub use render::{ChromiumRenderer, PageRenderer, RenderSettings};
pub use session::{SessionState, SessionStore, ARTIFACT_NAME};
pub use snapshot::{bind_site, parse_seed, SiteSnapshot};
pub use types::{
    FetchError, MergeError, Ordinal, RenderFailure, RenderResult, RenderTask, ScrapeError,
    SessionError,
};
