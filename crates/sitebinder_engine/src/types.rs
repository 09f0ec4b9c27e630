use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Position of a link in the sorted link set. Fixes a task's slot in the
/// merged output independent of completion order.
pub type Ordinal = usize;

/// One unit of render work: a link and the output slot it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTask {
    pub ordinal: Ordinal,
    pub url: String,
}

/// Outcome of one render task. A failed task contributes an absence marker
/// instead of a page buffer; it never aborts its siblings.
#[derive(Debug, Clone)]
pub enum RenderResult {
    Page { ordinal: Ordinal, data: Bytes },
    Absent { ordinal: Ordinal, reason: RenderFailure },
}

impl RenderResult {
    pub fn ordinal(&self) -> Ordinal {
        match self {
            RenderResult::Page { ordinal, .. } | RenderResult::Absent { ordinal, .. } => *ordinal,
        }
    }

    pub fn page_data(&self) -> Option<&Bytes> {
        match self {
            RenderResult::Page { data, .. } => Some(data),
            RenderResult::Absent { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderFailure {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("page not ready within {0:?}")]
    ReadyTimeout(Duration),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("print to pdf failed: {0}")]
    Print(String),
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no documents to merge")]
    NoDocuments,
    #[error("document {ordinal} could not be loaded: {message}")]
    Load { ordinal: Ordinal, message: String },
    #[error("malformed page tree: {0}")]
    PageTree(String),
    #[error("failed to write merged document: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error for the collect → render → merge pipeline. The server
/// crate maps each variant to an HTTP status.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid url scheme")]
    InvalidScheme,
    #[error("failed to fetch base url: {0}")]
    Fetch(#[from] FetchError),
    #[error("no valid links found on the page")]
    NoLinksFound,
    #[error("no pages could be rendered")]
    NoRenderableResults,
    #[error("failed to merge page documents: {0}")]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
