//! Gateway configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the gateway server.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
    /// Interception rules: credentials and matched paths.
    pub intercept: InterceptConfig,
    /// Relay dispatch settings.
    pub relay: RelayConfig,
    /// Per-endpoint connection settings.
    pub connection: ConnectionConfig,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Transport-level ceiling on any single HTTP request.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            tls: None,
            intercept: InterceptConfig::default(),
            relay: RelayConfig::default(),
            connection: ConnectionConfig::default(),
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Which requests the gateway claims and which credentials unlock them.
#[derive(Debug, Clone)]
pub struct InterceptConfig {
    /// Valid `x-api-key` values. A request must present exactly one of these.
    pub api_keys: Vec<String>,
    /// Mutating requests to `/` or any path containing this keyword are
    /// claimed by the interceptor.
    pub path_keyword: String,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            path_keyword: "honeypot".to_string(),
        }
    }
}

/// Relay dispatch settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum time to wait for an attached endpoint to answer one
    /// dispatched submission before synthesizing a 504.
    pub dispatch_deadline: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            dispatch_deadline: Duration::from_secs(30),
        }
    }
}

/// TLS certificate configuration.
///
/// No `Default` impl because certificate paths have no sensible defaults.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file.
    pub cert_path: PathBuf,
    /// Path to the TLS private key file.
    pub key_path: PathBuf,
}

/// Per-endpoint connection settings controlling backpressure.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Bounded mpsc capacity for frames queued toward one endpoint.
    pub outbound_channel_capacity: usize,
    /// Maximum time to wait when the outbound channel is full.
    pub send_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            outbound_channel_capacity: 64,
            send_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 0);
        assert!(config.tls.is_none());
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn intercept_config_defaults_to_no_keys() {
        let config = InterceptConfig::default();
        // Empty key set means every request is rejected until keys are configured
        assert!(config.api_keys.is_empty());
        assert_eq!(config.path_keyword, "honeypot");
    }

    #[test]
    fn relay_deadline_default() {
        assert_eq!(
            RelayConfig::default().dispatch_deadline,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.outbound_channel_capacity, 64);
        assert_eq!(config.send_timeout, Duration::from_secs(5));
    }
}
