use sbsquares::store::relay::{DocumentStore, serve};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = env::var("SBSQ_STORE_BIND").unwrap_or_else(|_| "0.0.0.0:8788".to_string());
    let persist_path = env::var("SBSQ_STORE_FILE").ok().map(PathBuf::from);

    let store = Arc::new(DocumentStore::load(persist_path.clone())?);
    let listener = TcpListener::bind(&addr).await?;

    eprintln!("store relay listening on {addr}");
    if let Some(path) = persist_path {
        eprintln!("persisting game document to {}", path.display());
    }

    serve(listener, store).await
}
