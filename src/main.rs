#[tokio::main]
async fn main() {
    use axum::Router;
    use axum::http::HeaderValue;
    use secret_poll::core::config::Config;
    use secret_poll::core::polling::{PollingState, polling_router};
    use tower_http::cors::{Any, CorsLayer};

    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load application config from environment variables
    let config = Config::from_env();

    // The original frontend is served from a different origin, so CORS is
    // either pinned to the configured origin or left permissive.
    let cors = match config.cors_origin.as_deref() {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .expect("CORS_ORIGIN must be a valid header value");
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let state = PollingState::new();

    // REST API + WebSocket event stream, all under /api
    let app = Router::new()
        .nest("/api", polling_router(state))
        .layer(cors);

    tracing::info!("listening on http://{}", &config.bind_addr);
    tracing::info!("REST API: http://{}/api", &config.bind_addr);
    tracing::info!("WebSocket: ws://{}/api/ws/{{room_id}}", &config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
