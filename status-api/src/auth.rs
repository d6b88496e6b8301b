use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::errors::{Error, Result};
use crate::rest::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` header does not match the configured key.
///
/// When no key is configured every request passes.
pub async fn require_api_key(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response> {
    check_api_key(state.api_key.as_deref(), &headers)?;
    Ok(next.run(request).await)
}

fn check_api_key(expected: Option<&str>, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .ok_or(Error::Unauthorized("missing API key header"))?;

    if provided.as_bytes() != expected.as_bytes() {
        warn!("Rejected request with invalid API key");
        return Err(Error::Unauthorized("invalid API key"));
    }
    Ok(())
}
