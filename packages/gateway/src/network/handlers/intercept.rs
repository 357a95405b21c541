//! The interceptor: claims matching inbound requests and runs the
//! auth → decode → select → dispatch → synthesize pipeline.
//!
//! Matched requests are POSTs to the root path or to any path containing
//! the configured keyword. The root path is an explicit route; everything
//! else reaches [`intercept_fallback`], which either claims the request or
//! returns 404. Once claimed, a request always receives exactly one
//! synthesized JSON response — failures never escape as raw transport
//! errors.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::AppState;
use crate::network::config::InterceptConfig;
use crate::network::relay::DispatchError;
use crate::network::respond::{relayed, InterceptError};

/// Header carrying the caller's credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Checks the presented `x-api-key` against the configured credential set.
///
/// Comparison is constant-time per candidate key; an empty key set rejects
/// everything.
#[must_use]
pub fn authorize(headers: &HeaderMap, api_keys: &[String]) -> bool {
    let Some(presented) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    api_keys
        .iter()
        .any(|key| bool::from(key.as_bytes().ct_eq(presented.as_bytes())))
}

/// Whether the interceptor claims this request.
fn claims(method: &Method, path: &str, config: &InterceptConfig) -> bool {
    *method == Method::POST && (path == "/" || path.contains(&config.path_keyword))
}

/// Handles one claimed submission.
///
/// Linear per-request sequence; each stage short-circuits into a
/// synthesized response. The correlation id and pending entry are only
/// allocated inside `RelayTable::dispatch`, after auth, decode, and
/// endpoint selection have all succeeded.
pub async fn intercept_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();
    counter!("sentinel_intercepted_total").increment(1);

    if !authorize(&headers, &state.config.intercept.api_keys) {
        counter!("sentinel_intercept_rejected_total", "reason" => "unauthorized").increment(1);
        return InterceptError::Unauthorized.into_response();
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            counter!("sentinel_intercept_rejected_total", "reason" => "bad_payload").increment(1);
            debug!(%err, "submission body failed to decode");
            return InterceptError::BadPayload.into_response();
        }
    };

    let Some(endpoint) = state.endpoints.select_reachable() else {
        counter!("sentinel_intercept_rejected_total", "reason" => "offline").increment(1);
        return InterceptError::Offline.into_response();
    };

    match state
        .relay
        .dispatch(
            &endpoint,
            payload,
            state.config.relay.dispatch_deadline,
            state.config.connection.send_timeout,
        )
        .await
    {
        Ok(reply) => relayed(reply),
        Err(DispatchError::DeadlineElapsed(_)) => InterceptError::TimedOut.into_response(),
        // The endpoint went away between selection and delivery
        Err(DispatchError::EndpointGone) => InterceptError::Offline.into_response(),
    }
}

/// Router fallback implementing the keyword path match.
///
/// Claims POSTs whose path contains the configured keyword (e.g.
/// `/api/honeypot`, `/v2/honeypot-submit`); all other unrouted traffic gets
/// a plain 404.
pub async fn intercept_fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if claims(&method, uri.path(), &state.config.intercept) {
        intercept_handler(State(state), headers, body).await
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
