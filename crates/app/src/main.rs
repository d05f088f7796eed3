use clap::Parser;
use pdf_index_core::{
    DefaultExtractor, DocumentIndex, IngestionPipeline, QueryGateway, SearchIndexStore,
    WorkingStorage,
};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;

#[derive(Parser)]
#[command(name = "pdf-index-api", version)]
struct Cli {
    /// Search service base URL
    #[arg(long, env = "SEARCH_ENDPOINT")]
    search_endpoint: String,

    /// Search index name
    #[arg(long, env = "SEARCH_INDEX_NAME", default_value = "documents-index")]
    index_name: String,

    /// Admin key for the search service
    #[arg(long, env = "SEARCH_ADMIN_KEY")]
    admin_key: Option<String>,

    /// Directory where uploads are staged before indexing
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Hours a staged upload is retained before the sweep removes it
    #[arg(long, env = "UPLOAD_RETENTION_HOURS", default_value = "24")]
    upload_retention_hours: u64,

    /// HTTP listen port
    #[arg(long, env = "SERVER_PORT", default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.admin_key.is_none() {
        warn!("no admin key configured; calls to the search service are unauthenticated");
    }

    let index = Arc::new(
        SearchIndexStore::connect(&cli.search_endpoint, &cli.index_name, cli.admin_key.clone())
            .await?,
    );
    info!(
        endpoint = %cli.search_endpoint,
        index = %cli.index_name,
        semantic = index.supports_semantic_mode(),
        "connected to search service"
    );

    let storage = WorkingStorage::new(&cli.upload_dir);
    storage.init().await?;
    spawn_sweeper(
        storage.clone(),
        Duration::from_secs(cli.upload_retention_hours * 3_600),
    );

    let service = Arc::new(api::AppService {
        pipeline: IngestionPipeline::new(index.clone(), Arc::new(DefaultExtractor), storage),
        gateway: QueryGateway::new(index),
    });

    let app = api::create_router(service);
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, cli.port)).await?;
    info!("listening on http://0.0.0.0:{}", cli.port);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Staged uploads are a cache, not a transactional participant: an upsert
/// failure after staging leaves the file behind, and this sweep reclaims it.
fn spawn_sweeper(storage: WorkingStorage, retention: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(3_600));
        loop {
            ticker.tick().await;
            match storage.sweep_older_than(retention).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "swept expired staged uploads"),
                Err(error) => warn!(error = %error, "staging sweep failed"),
            }
        }
    });
}
