pub mod health;
pub mod me;

use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    AppState,
    middleware::{require_authenticated, resolve_identity_middleware, session_middleware},
};

/// Build the HTTP application.
///
/// Layers run outermost first: tracing, body limit, cookies, session
/// loading, identity resolution. Guards are attached per route.
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new().route(
        "/me",
        get(me::me).route_layer(from_fn_with_state(state.clone(), require_authenticated)),
    );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1)
        .layer(from_fn_with_state(state.clone(), resolve_identity_middleware))
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
