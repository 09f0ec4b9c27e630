use std::path::Path;

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderName, HeaderValue};
use axum::response::Response;
use axum::{Form, Json};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use sitebinder_engine::{bind_site, merge_documents, parse_seed, ScrapeError, DEFAULT_WORKERS};
use tokio::fs::File;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::AppState;
use crate::stream::SessionFileStream;

const X_PAGE_COUNT: HeaderName = HeaderName::from_static("x-page-count");
const X_SESSION_ID: HeaderName = HeaderName::from_static("x-session-id");

pub async fn health() -> Json<Value> {
    Json(json!({ "message": "Backend is running" }))
}

#[derive(Debug, Deserialize)]
pub struct ScrapeForm {
    pub url: String,
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_threads() -> usize {
    DEFAULT_WORKERS
}

/// Render every qualifying link under the seed URL into one PDF and stream
/// it back. The session holding the artifact stays alive afterwards so the
/// client can re-download (and acknowledge) it via `/download-clean`; the
/// janitor reaps it if the client never does.
pub async fn scrape(
    State(state): State<AppState>,
    Form(form): Form<ScrapeForm>,
) -> Result<Response, ApiError> {
    let seed = parse_seed(&form.url)?;
    let snapshot = bind_site(
        state.fetcher.clone(),
        state.renderer.as_ref(),
        &seed,
        form.threads,
    )
    .await?;

    let session_id = state.store.create()?;
    state.store.write_artifact(session_id, &snapshot.pdf)?;
    let artifact = state.store.begin_read(session_id)?;

    let mut response = stream_artifact(&state, session_id, &artifact, false).await?;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&snapshot.page_count.to_string()) {
        headers.insert(X_PAGE_COUNT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&session_id.to_string()) {
        headers.insert(X_SESSION_ID, value);
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct DownloadCleanRequest {
    pub session_id: Option<String>,
}

/// The client's "I'm done" acknowledgment: stream the artifact one more
/// time and remove the session once the stream is fully read.
pub async fn download_clean(
    State(state): State<AppState>,
    Json(request): Json<DownloadCleanRequest>,
) -> Result<Response, ApiError> {
    let raw = request.session_id.ok_or(ApiError::MissingSessionId)?;
    let id = Uuid::parse_str(raw.trim()).map_err(|_| ApiError::SessionNotFound)?;
    let artifact = state
        .store
        .begin_read(id)
        .map_err(|_| ApiError::SessionNotFound)?;
    stream_artifact(&state, id, &artifact, true).await
}

/// Stateless pass-through: merge uploaded PDFs in submission order.
pub async fn merge_files(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut buffers: Vec<Bytes> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        buffers.push(data);
    }
    if buffers.is_empty() {
        return Err(ApiError::BadRequest("no files uploaded".to_string()));
    }

    let merged = merge_documents(&buffers).map_err(ScrapeError::Merge)?;
    let len = merged.len() as u64;
    Ok(attachment_response(
        Body::from(merged),
        "merged.pdf",
        Some(len),
    ))
}

async fn stream_artifact(
    state: &AppState,
    id: Uuid,
    artifact: &Path,
    clean_on_complete: bool,
) -> Result<Response, ApiError> {
    let file = match File::open(artifact).await {
        Ok(file) => file,
        Err(err) => {
            state.store.finish_read(id, false);
            return Err(ApiError::Internal(err.to_string()));
        }
    };
    let len = file.metadata().await.ok().map(|meta| meta.len());
    let stream = SessionFileStream::new(file, state.store.clone(), id, clean_on_complete);
    Ok(attachment_response(
        Body::from_stream(stream),
        "scraped_output.pdf",
        len,
    ))
}

fn attachment_response(body: Body, filename: &str, len: Option<u64>) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    if let Some(len) = len {
        if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
            headers.insert(header::CONTENT_LENGTH, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
