//! # HTTP Server
//!
//! Read-only JSON endpoints over the table registry, built on axum.

mod routes;

use crate::table::TableRegistry;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use routes::TableList;

/// State shared by every handler. The registry is never written after startup,
/// so handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TableRegistry>,
}

impl AppState {
    pub fn new(registry: TableRegistry) -> Self {
        AppState { registry: Arc::new(registry) }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::liveness))
        .route("/health/live", get(routes::liveness))
        .route("/list_tables", get(routes::list_tables))
        .route("/get_table_details/:table_name", get(routes::table_details))
        .route("/row_sum/:table_name/:row_name", get(routes::row_sum))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
