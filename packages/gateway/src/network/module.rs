//! Gateway module with deferred startup lifecycle.
//!
//! `new()` allocates the shared state (endpoint registry, relay table,
//! shutdown controller), `start()` binds the TCP listener, and `serve()`
//! accepts traffic until the shutdown future resolves, then drains attached
//! endpoints and waits for in-flight intercepts.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::GatewayConfig;
use super::endpoint::{EndpointRegistry, OutboundFrame};
use super::handlers::{
    health_handler, intercept_fallback, intercept_handler, liveness_handler, readiness_handler,
    ws_attach_handler, AppState,
};
use super::middleware::build_http_layers;
use super::relay::RelayTable;
use super::shutdown::ShutdownController;

/// How long shutdown waits for in-flight intercepts before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the full HTTP/WebSocket server lifecycle.
pub struct GatewayModule {
    config: GatewayConfig,
    listener: Option<TcpListener>,
    endpoints: Arc<EndpointRegistry>,
    relay: Arc<RelayTable>,
    shutdown: Arc<ShutdownController>,
}

impl GatewayModule {
    /// Creates the module without binding any port.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            listener: None,
            endpoints: Arc::new(EndpointRegistry::new()),
            relay: Arc::new(RelayTable::new()),
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    /// Shared reference to the endpoint registry.
    #[must_use]
    pub fn endpoints(&self) -> Arc<EndpointRegistry> {
        Arc::clone(&self.endpoints)
    }

    /// Shared reference to the relay table.
    #[must_use]
    pub fn relay(&self) -> Arc<RelayTable> {
        Arc::clone(&self.relay)
    }

    /// Shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health`, `/health/live`, `/health/ready` — probes
    /// - `GET /ws` — authenticated endpoint attachment
    /// - `POST /` — intercepted submission (root match)
    /// - fallback — keyword path match for intercepted submissions, 404 otherwise
    #[must_use]
    pub fn build_router(&self) -> Router {
        let state = AppState {
            endpoints: Arc::clone(&self.endpoints),
            relay: Arc::clone(&self.relay),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };
        Self::router_with_state(state, &self.config)
    }

    fn router_with_state(state: AppState, config: &GatewayConfig) -> Router {
        let layers = build_http_layers(config);

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/ws", get(ws_attach_handler))
            .route("/", post(intercept_handler))
            .fallback(intercept_fallback)
            .layer(layers)
            .with_state(state)
    }

    /// Binds the TCP listener, returning the actual bound port (relevant
    /// when the configured port is 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!("gateway listening on {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains endpoints and
    /// in-flight intercepts.
    ///
    /// # Errors
    ///
    /// Returns an error on a fatal I/O failure.
    ///
    /// # Panics
    ///
    /// Panics if `start()` was not called first.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .expect("start() must be called before serve()");

        let state = AppState {
            endpoints: Arc::clone(&self.endpoints),
            relay: Arc::clone(&self.relay),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };
        let router = Self::router_with_state(state, &self.config);

        self.shutdown.set_ready();

        if let Some(ref tls_config) = self.config.tls {
            serve_tls(
                listener,
                router,
                tls_config,
                self.endpoints,
                self.shutdown,
                shutdown,
            )
            .await
        } else {
            serve_plain(listener, router, self.endpoints, self.shutdown, shutdown).await
        }
    }
}

/// Serves plain HTTP/WS with axum's built-in server.
async fn serve_plain(
    listener: TcpListener,
    router: Router,
    endpoints: Arc<EndpointRegistry>,
    shutdown_ctrl: Arc<ShutdownController>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    drain_endpoints(&endpoints, &shutdown_ctrl).await;
    Ok(())
}

/// Serves TLS with `axum-server`/rustls, reusing the pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls_config: &super::config::TlsConfig,
    endpoints: Arc<EndpointRegistry>,
    shutdown_ctrl: Arc<ShutdownController>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!("serving TLS on {addr}");

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    drain_endpoints(&endpoints, &shutdown_ctrl).await;
    Ok(())
}

/// Closes attached endpoints and waits for in-flight intercepts to finish.
async fn drain_endpoints(endpoints: &EndpointRegistry, shutdown_ctrl: &ShutdownController) {
    shutdown_ctrl.trigger_shutdown();

    let handles = endpoints.drain_all();
    if !handles.is_empty() {
        info!("detaching {} endpoint(s)", handles.len());
        for handle in &handles {
            let _ = handle.try_send(OutboundFrame::Close(Some(
                "gateway shutting down".to_string(),
            )));
        }
    }

    if shutdown_ctrl.wait_for_drain(DRAIN_TIMEOUT).await {
        info!("drained cleanly");
    } else {
        warn!("drain timeout expired with intercepts still in flight");
    }
}
