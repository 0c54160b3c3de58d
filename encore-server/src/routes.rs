use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use shared::config::Config;
use utoipa::OpenApi;

use crate::{
    app_state::AppState,
    handlers::{presence, streaming, support, typing},
    middleware::{
        admin_auth::require_admin_token,
        request_context::{RequestIdState, assign_request_id},
    },
    openapi::ApiDoc,
    server::create_cors_layer,
    tracer,
};

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

async fn healthz() -> impl IntoResponse {
    metrics::counter!("health_checks_total", "endpoint" => "healthz", "status" => "ok")
        .increment(1);
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

async fn metrics_endpoint(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        handle.render(),
    )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Assembles the full application router.
#[must_use]
pub fn router(
    state: Arc<AppState>,
    config: Arc<Config>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let admin = support::admin_routes()
        .merge(streaming::routes())
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&config),
            require_admin_token,
        ));

    let api = admin
        .merge(support::public_routes())
        .merge(typing::routes())
        .merge(presence::routes());

    let request_id_state = RequestIdState::from_config(&config);

    Router::new()
        .merge(api)
        .route("/healthz", get(healthz))
        .route("/api/openapi.json", get(openapi_json))
        .with_state(state)
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(metrics_handle))
        .layer(tracer::create_trace_layer())
        .layer(axum_middleware::from_fn_with_state(
            request_id_state,
            assign_request_id,
        ))
        .layer(create_cors_layer())
        .layer(Extension(config))
}
