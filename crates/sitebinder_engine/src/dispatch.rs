use futures_util::{stream, StreamExt};
use log::error;

use crate::render::PageRenderer;
use crate::types::{RenderResult, RenderTask};

/// Worker count when the caller does not supply one.
pub const DEFAULT_WORKERS: usize = 5;

/// Upper bound on caller-supplied worker counts. Each worker owns a whole
/// browser process, so an unbounded pool exhausts memory long before it
/// saturates the network.
pub const MAX_WORKERS: usize = 32;

pub fn clamp_workers(requested: usize) -> usize {
    requested.clamp(1, MAX_WORKERS)
}

/// Assign each link its ordinal. Links are expected in canonical (sorted)
/// order; the ordinal fixes the output slot from here on.
pub fn plan_tasks(links: &[String]) -> Vec<RenderTask> {
    links
        .iter()
        .enumerate()
        .map(|(ordinal, url)| RenderTask {
            ordinal,
            url: url.clone(),
        })
        .collect()
}

/// Render every task with at most `workers` in flight.
///
/// Results come back in submission order regardless of completion order: a
/// task finishing after a later-submitted one still occupies its own earlier
/// slot. A failed task yields an absence marker and never aborts siblings.
pub async fn render_all(
    renderer: &dyn PageRenderer,
    tasks: Vec<RenderTask>,
    workers: usize,
) -> Vec<RenderResult> {
    let workers = clamp_workers(workers);
    stream::iter(tasks)
        .map(|task| async move {
            match renderer.render(&task.url).await {
                Ok(data) => RenderResult::Page {
                    ordinal: task.ordinal,
                    data,
                },
                Err(reason) => {
                    error!("error rendering {}: {reason}", task.url);
                    RenderResult::Absent {
                        ordinal: task.ordinal,
                        reason,
                    }
                }
            }
        })
        .buffered(workers)
        .collect()
        .await
}
