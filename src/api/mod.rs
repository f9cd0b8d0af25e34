mod error;
mod handlers;
mod models;

use axum::{
    http::{header, HeaderValue},
    routing::post,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::AppState;

pub use error::AskError;
pub use handlers::{ask, method_not_allowed, not_found, preflight};
pub use models::{ChatRequest, ChatResponse};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Routes `/ask` and stamps the cross-origin headers onto every response,
/// fallbacks included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/ask",
            post(ask).options(preflight).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static(ALLOW_ORIGIN),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(ALLOW_METHODS),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static(ALLOW_HEADERS),
                )),
        )
        .with_state(state)
}
