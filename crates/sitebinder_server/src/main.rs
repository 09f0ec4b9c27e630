use std::error::Error;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use engine_logging::LogDestination;
use log::{error, info};
use sitebinder_engine::{
    ChromiumRenderer, FetchSettings, RenderSettings, ReqwestFetcher, SessionStore,
};
use sitebinder_server::config::Cli;
use sitebinder_server::{build_router, AppState};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    engine_logging::initialize(if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    });

    if let Err(err) = run(cli).await {
        error!("server error: {err}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let store = Arc::new(SessionStore::new(
        cli.sessions_dir.clone(),
        Duration::from_secs(cli.session_max_age_secs),
    )?);

    let state = AppState {
        store: store.clone(),
        fetcher: Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        renderer: Arc::new(ChromiumRenderer::new(RenderSettings::default())),
    };

    let janitor = spawn_janitor(store, Duration::from_secs(cli.sweep_interval_secs));

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    info!("listening on {}", cli.bind);
    let result = axum::serve(listener, build_router(state)).await;

    janitor.abort();
    let _ = janitor.await;

    result.map_err(Into::into)
}

/// Backstop for sessions whose clients never acknowledge: sweep anything
/// older than the store's max age on a fixed interval.
fn spawn_janitor(store: Arc<SessionStore>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // skip the immediate first tick
        loop {
            ticker.tick().await;
            let removed = store.sweep();
            if removed > 0 {
                info!("janitor removed {removed} expired sessions");
            }
        }
    })
}
