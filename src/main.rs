use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commit_digest::config::Config;
use commit_digest::server::{AppState, build_router};
use commit_digest::store::{AppendClient, ProjectionClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commit_digest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("configuration must be valid");

    let appender =
        AppendClient::new(config.store.clone()).expect("append client must construct");
    let reader =
        ProjectionClient::new(config.store.clone()).expect("projection client must construct");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, appender, reader);
    let app = build_router(state).layer(TraceLayer::new_for_http());

    tracing::info!(addr = %bind_addr, "listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
