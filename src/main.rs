// Next2Go Racing v0.1
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod clock;
mod config;
mod domain;
mod errors;
mod routes;
mod services;

use clock::{SharedClock, SystemClock};
use config::AppConfig;
use routes::AppState;
use services::aggregator::RaceAggregator;
use services::next_races::NextRacesUseCase;
use services::racing_api::RacingApiClient;
use services::store::RaceStore;

/// Side effects buffered per SSE hub before slow clients start lagging.
const SIDE_EFFECT_HUB_CAPACITY: usize = 32;

/// Next2Go Racing API: OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Next2Go Racing API",
        version = "0.1.0",
        description = "Next-to-go racing board. Aggregates upcoming races from the \
            racing API across categories, drops races once they are more than a \
            minute past their advertised start, and keeps live countdowns that \
            refresh every second.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Races", description = "Race board state, intents and events"),
    ),
    paths(
        routes::health::health_check,
        routes::races::get_race_board,
        routes::races::post_intent,
        routes::events::side_effect_stream,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            services::store::RaceUiState,
            services::store::RaceIntent,
            services::store::RaceSideEffect,
            domain::models::RaceDisplayModel,
            domain::models::CategoryId,
            domain::models::CategoryColor,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "next2go_racing=debug,tower_http=debug".into());
    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Racing API client and the fetch pipeline
    let api_client = RacingApiClient::new(&config.racing_api_url, config.http_timeout)
        .expect("Failed to build HTTP client");
    let clock: SharedClock = Arc::new(SystemClock);
    let use_case = NextRacesUseCase::new(RaceAggregator::new(Arc::new(api_client)), clock.clone());

    // Start the race board session (initial load + timers)
    let (store, side_effects_rx) = RaceStore::spawn(use_case, clock, config.store_settings());
    tracing::info!(
        "Race board started: {} races, refresh every {:?}, tick every {:?}",
        config.race_count,
        config.refresh_interval,
        config.countdown_tick
    );

    let (side_effects, _) = broadcast::channel(SIDE_EFFECT_HUB_CAPACITY);
    tokio::spawn(routes::events::forward_side_effects(
        side_effects_rx,
        side_effects.clone(),
    ));

    let app_state = AppState {
        store: store.handle(),
        side_effects,
    };

    // CORS: intents are the only POST
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/races", get(routes::races::get_race_board))
        .route("/api/v1/intents", post(routes::races::post_intent))
        .route("/api/v1/events", get(routes::events::side_effect_stream))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server terminated unexpectedly");

    // Session ends with the server: stop timers and drop in-flight fetches
    store.shutdown().await;
    tracing::info!("Shut down cleanly");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
