use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use shared::config::Config;
use tracing::debug;

use crate::http::error::ApiError;

/// Header carrying the shared secret on `/api/admin` requests.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Guards the admin surface with a config-driven shared secret. With no
/// token configured the guard is a pass-through (local development).
pub async fn require_admin_token(
    State(config): State<Arc<Config>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = config.server.admin_token.as_deref() {
        let provided = request
            .headers()
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if provided != Some(expected) {
            debug!(path = %request.uri().path(), "rejected admin request");
            metrics::counter!("admin_auth_rejections_total").increment(1);
            return Err(ApiError::unauthorized("missing or invalid admin token"));
        }
    }

    Ok(next.run(request).await)
}
