use std::str::FromStr;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use shared::config::Config;
use uuid::Uuid;

use crate::http::error::{ApiError, AppResult};

/// Per-request context propagated through extensions for span enrichment.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub request_id: String,
}

#[derive(Clone)]
pub struct RequestIdState {
    header: HeaderName,
}

impl RequestIdState {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let header = HeaderName::from_str(&config.server.request_id_header)
            .unwrap_or_else(|_| HeaderName::from_static("x-request-id"));
        Self { header }
    }
}

/// Assigns (or propagates) a request id and reflects it on the response.
pub async fn assign_request_id(
    State(state): State<RequestIdState>,
    mut request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let header_name = state.header.clone();
    let current = extract_request_id(request.headers(), &header_name);

    let request_id = current.unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    request.headers_mut().insert(
        header_name.clone(),
        HeaderValue::from_str(&request_id)
            .map_err(|_| ApiError::internal_server_error("failed to encode request id"))?,
    );

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header_name,
        HeaderValue::from_str(&request_id)
            .map_err(|_| ApiError::internal_server_error("failed to encode request id"))?,
    );

    Ok(response)
}

/// Longest inbound request id honored before we mint our own.
const MAX_REQUEST_ID_LEN: usize = 128;

fn extract_request_id(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_request_id_trims_and_rejects_empty() {
        let header = HeaderName::from_static("x-request-id");
        let mut headers = HeaderMap::new();

        headers.insert(&header, HeaderValue::from_static("  abc-123  "));
        assert_eq!(
            extract_request_id(&headers, &header).as_deref(),
            Some("abc-123")
        );

        headers.insert(&header, HeaderValue::from_static("   "));
        assert_eq!(extract_request_id(&headers, &header), None);
    }

    #[test]
    fn test_extract_request_id_rejects_oversized_values() {
        let header = HeaderName::from_static("x-request-id");
        let mut headers = HeaderMap::new();
        let oversized = "a".repeat(MAX_REQUEST_ID_LEN + 1);

        headers.insert(&header, HeaderValue::from_str(&oversized).unwrap());
        assert_eq!(extract_request_id(&headers, &header), None);
    }
}
