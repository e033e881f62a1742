use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use folio_mock_server::{router, MockServer, Seed};
use tokio::sync::Mutex;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

fn load_server() -> anyhow::Result<MockServer> {
    let path = match std::env::var("FOLIO_MOCK_SEED") {
        Ok(path) => path,
        Err(_) => return Ok(MockServer::new()),
    };
    let data = std::fs::read(&path).with_context(|| format!("reading seed file {path:?}"))?;
    let seed: Seed =
        serde_json::from_slice(&data).with_context(|| format!("parsing seed file {path:?}"))?;
    tracing::info!(
        articles = seed.articles.len(),
        comments = seed.comments.len(),
        "loaded seed"
    );
    MockServer::from_seed(seed).with_context(|| format!("loading seed file {path:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("FOLIO_MOCK_ADDR").unwrap_or_else(|_| String::from(DEFAULT_ADDR));
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("parsing FOLIO_MOCK_ADDR {addr:?}"))?;
    let app = router(Arc::new(Mutex::new(load_server()?)));

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
