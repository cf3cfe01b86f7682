use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rota_api::jwt::JwtAuthService;
use rota_api::registry::ConnectionRegistry;
use rota_api::relay::FanoutRelay;
use rota_api::{router, AppState};
use rota_common::Config;
use rota_core::ChoreService;
use rota_store::{PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("rota_api=info".parse()?)
                .add_directive("rota_core=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let pg = PgStore::connect(&config.database_url).await?;
    pg.ensure_schema().await?;
    let store: Arc<dyn Store> = Arc::new(pg);

    let registry = Arc::new(ConnectionRegistry::new());
    let relay = FanoutRelay::new(store.clone(), registry.clone());
    let relay_task = relay.spawn().await?;

    let state = Arc::new(AppState {
        service: ChoreService::new(store),
        registry,
        auth: Arc::new(JwtAuthService::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
        )),
    });

    let app = router(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("rota API starting on {addr}");
    info!("realtime endpoint at ws://{addr}/ws");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    relay_task.abort();
    Ok(())
}
