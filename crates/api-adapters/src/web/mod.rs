//! # axum surface
//!
//! Route table, shared state and request extractors. Every handler gets an
//! explicit [`domains::Session`] through [`extract::CurrentSession`] and
//! passes it down to the services.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::{AppState, BoardStore, PortalOptions, Ports};

/// Builds the portal's router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let pages = Router::new()
        .route("/", get(handlers::pages::index))
        .route("/category/{slug}", get(handlers::pages::category))
        .route("/requests", get(handlers::pages::requests));

    let api = Router::new()
        .route("/category/{slug}", get(handlers::catalog::page))
        .route("/search", get(handlers::catalog::search))
        .route("/requests", post(handlers::requests::submit))
        .route("/requests/board", get(handlers::requests::board))
        .route("/requests/quota", get(handlers::requests::quota))
        .route("/requests/notice/ack", post(handlers::requests::acknowledge))
        .route("/requests/section/{status}/more", post(handlers::requests::load_more))
        .route("/requests/{id}/vote", post(handlers::requests::vote))
        .route(
            "/visitors",
            get(handlers::visitors::stats).post(handlers::visitors::record),
        )
        .route(
            "/admin/apps",
            post(handlers::admin::create)
                .layer(DefaultBodyLimit::max(handlers::admin::UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/admin/apps/{id}",
            get(handlers::admin::get).put(handlers::admin::edit),
        );

    Router::new()
        .merge(pages)
        .nest("/api", api)
        .route("/metrics", get(handlers::ops::metrics))
        .route("/healthz", get(handlers::ops::healthz))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
