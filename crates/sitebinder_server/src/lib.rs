//! Sitebinder server: the HTTP surface over the engine pipeline.
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
mod stream;

pub use http::{build_router, AppState};
