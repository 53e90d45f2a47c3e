//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::common::GridLayout;
use crate::domains::rotation::{RotationEngine, RotationScheduler, StatsReporter};
use crate::domains::squares::SquareStore;
use crate::kernel::StreamHub;
use crate::server::middleware::admin_auth_middleware;
use crate::server::routes::{
    cancel_purchase_handler, confirm_purchase_handler, create_purchase_handler, health_handler,
    page_handler, shuffle_handler, shuffle_stats_handler, stream_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SquareStore>,
    pub layout: GridLayout,
    pub scheduler: Arc<RotationScheduler>,
    pub stats: StatsReporter,
    pub stream_hub: StreamHub,
}

impl AppState {
    /// Wire the engine, scheduler and stats reporter around one store.
    pub fn new(store: Arc<dyn SquareStore>, layout: GridLayout, interval: Duration) -> Self {
        let stream_hub = StreamHub::new();
        let engine = RotationEngine::new(store.clone(), layout).with_stream_hub(stream_hub.clone());
        Self::from_parts(store, Arc::new(engine), stream_hub, interval)
    }

    /// Build state around an existing engine (the engine should publish on `stream_hub`).
    pub fn from_parts(
        store: Arc<dyn SquareStore>,
        engine: Arc<RotationEngine>,
        stream_hub: StreamHub,
        interval: Duration,
    ) -> Self {
        let layout = *engine.layout();
        Self {
            stats: StatsReporter::new(store.clone(), interval),
            scheduler: Arc::new(RotationScheduler::new(engine, interval)),
            store,
            layout,
            stream_hub,
        }
    }
}

/// Build the Axum application router
///
/// Public routes serve grid readers; admin routes (rotation control and the
/// payment glue) sit behind the admin bearer credential.
pub fn build_app(state: AppState, admin_api_key: Option<String>) -> Router {
    let admin_api_key: Option<Arc<str>> = admin_api_key.map(Arc::from);

    // CORS configuration - grid readers may live on another origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let admin = Router::new()
        .route("/shuffle", post(shuffle_handler))
        .route("/shuffle/stats", get(shuffle_stats_handler))
        .route("/purchases", post(create_purchase_handler))
        .route("/purchases/:id/confirm", post(confirm_purchase_handler))
        .route("/purchases/:id/cancel", post(cancel_purchase_handler))
        .route_layer(middleware::from_fn(move |req, next| {
            admin_auth_middleware(admin_api_key.clone(), req, next)
        }))
        // SSE is long-lived, so only admin calls get a request timeout
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Grid readers
        .route("/squares/pages/:page", get(page_handler))
        .route("/squares/stream", get(stream_handler))
        .merge(admin)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
