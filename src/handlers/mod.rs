// handlers/mod.rs - route table and shared state
//
// Public:    GET /, GET /health
// Protected: /api/tree-nursery/* (bearer JWT)

pub mod nursery;
pub mod system;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::ledger::NurseryLedger;
use crate::middleware::jwt_auth_middleware;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub ledger: NurseryLedger,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(ledger: NurseryLedger, config: AppConfig) -> Self {
        Self {
            ledger,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);
    let body_limit = state.config.api.max_request_size_bytes;
    let request_logging = state.config.api.enable_request_logging;

    let app = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Protected
        .nest("/api/tree-nursery", nursery_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state);

    if request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn nursery_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(nursery::view))
        .route("/register", post(nursery::register))
        .route("/update/:id", put(nursery::update))
        .route(
            "/:id",
            get(nursery::view_one).put(nursery::update).delete(nursery::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
