mod api;
mod config;
mod error;
mod main_lib;
mod worker;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing();

    let (state, backfill_worker, queue_rx) = build_state(&config)?;

    // Start the background backfill consumer
    worker::spawn_backfill_consumer(state.clone(), backfill_worker, queue_rx);

    let router = api::app_router(state);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
