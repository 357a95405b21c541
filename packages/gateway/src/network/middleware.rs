//! Transport-level middleware stack.
//!
//! Tower layers applied to every HTTP request, outermost first. Interception
//! semantics (auth, decode, relay) live in the handlers, not here; this
//! stack only covers request ids, tracing, compression, CORS, and a
//! whole-request timeout ceiling above the relay's own deadline.

use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::GatewayConfig;

/// The composed Tower layer stack produced by [`build_http_layers`].
///
/// Spelled out so the builder function keeps a readable signature; each
/// layer wraps the next, outermost first.
type HttpLayers = tower::layer::util::Stack<
    PropagateRequestIdLayer,
    tower::layer::util::Stack<
        TimeoutLayer,
        tower::layer::util::Stack<
            CorsLayer,
            tower::layer::util::Stack<
                CompressionLayer,
                tower::layer::util::Stack<
                    TraceLayer<
                        tower_http::classify::SharedClassifier<
                            tower_http::classify::ServerErrorsAsFailures,
                        >,
                    >,
                    tower::layer::util::Stack<
                        SetRequestIdLayer<MakeRequestUuid>,
                        tower::layer::util::Identity,
                    >,
                >,
            >,
        >,
    >,
>;

/// Builds the HTTP middleware stack from the gateway configuration.
///
/// Ordering, outermost to innermost: request-id assignment, tracing,
/// compression, CORS, request timeout, request-id propagation. The timeout
/// here is a transport ceiling; the relay deadline in
/// `RelayConfig::dispatch_deadline` fires first and produces the 504.
#[must_use]
pub fn build_http_layers(config: &GatewayConfig) -> HttpLayers {
    let x_request_id = HeaderName::from_static("x-request-id");

    let cors = build_cors_layer(&config.cors_origins);

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            MakeRequestUuid,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .into_inner()
}

/// CORS layer from the configured origin list; `"*"` allows any origin.
///
/// The original gateway shipped wide-open CORS with `x-api-key` as an
/// allowed header, so `Any` headers and GET/POST methods are kept.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn builds_with_default_config() {
        let config = GatewayConfig::default();
        let _layers = build_http_layers(&config);
    }

    #[test]
    fn builds_with_explicit_origins() {
        let origins = vec![
            "http://localhost:5173".to_string(),
            "https://sentinel.example".to_string(),
        ];
        let _cors = build_cors_layer(&origins);
    }

    #[test]
    fn builds_with_wildcard_origin() {
        let _cors = build_cors_layer(&["*".to_string()]);
    }

    #[test]
    fn builds_with_custom_timeout() {
        let config = GatewayConfig {
            request_timeout: Duration::from_secs(5),
            ..GatewayConfig::default()
        };
        let _layers = build_http_layers(&config);
    }
}
