use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use jupiterbot_backend::server::router::router;
use jupiterbot_backend::state::AppState;
use jupiterbot_backend::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;
    logging::init(&state.paths);

    // Surface configuration problems once at startup; turns keep failing
    // with a configuration error until reconfigured.
    if let Err(err) = state.config.load() {
        tracing::warn!("configuration incomplete: {}", err);
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(0);
    let bind_addr = format!("127.0.0.1:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("JUPITERBOT_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
