//! Sentinel gateway binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sentinel_gateway::network::config::{GatewayConfig, InterceptConfig, RelayConfig, TlsConfig};
use sentinel_gateway::GatewayModule;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Interception & relay gateway for Sentinel honeypot traffic.
#[derive(Debug, Parser)]
#[command(name = "sentinel-gateway", version, about)]
struct Args {
    /// Bind address.
    #[arg(long, env = "SENTINEL_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 for OS-assigned).
    #[arg(long, env = "SENTINEL_PORT", default_value_t = 3000)]
    port: u16,

    /// Valid x-api-key credentials (comma separated).
    #[arg(
        long = "api-key",
        env = "SENTINEL_API_KEYS",
        value_delimiter = ',',
        required = true
    )]
    api_keys: Vec<String>,

    /// Keyword claiming any POST path that contains it.
    #[arg(long, env = "SENTINEL_PATH_KEYWORD", default_value = "honeypot")]
    path_keyword: String,

    /// Seconds to wait for an endpoint reply before answering 504.
    #[arg(long, env = "SENTINEL_DISPATCH_DEADLINE_SECS", default_value_t = 30)]
    dispatch_deadline_secs: u64,

    /// Allowed CORS origins ("*" for any, comma separated).
    #[arg(long, env = "SENTINEL_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    cors_origins: Vec<String>,

    /// TLS certificate path (PEM). Enables TLS together with --tls-key.
    #[arg(long, env = "SENTINEL_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// TLS private key path (PEM).
    #[arg(long, env = "SENTINEL_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "SENTINEL_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> GatewayConfig {
        GatewayConfig {
            host: self.host,
            port: self.port,
            tls: self.tls_cert.zip(self.tls_key).map(|(cert, key)| TlsConfig {
                cert_path: cert,
                key_path: key,
            }),
            intercept: InterceptConfig {
                api_keys: self.api_keys,
                path_keyword: self.path_keyword,
            },
            relay: RelayConfig {
                dispatch_deadline: Duration::from_secs(self.dispatch_deadline_secs),
            },
            cors_origins: self.cors_origins,
            ..GatewayConfig::default()
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sentinel_gateway=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let config = args.into_config();
    info!(
        keys = config.intercept.api_keys.len(),
        keyword = %config.intercept.path_keyword,
        deadline = ?config.relay.dispatch_deadline,
        tls = config.tls.is_some(),
        "starting sentinel gateway"
    );

    let mut module = GatewayModule::new(config);
    module.start().await?;

    module
        .serve(async {
            // Serve until interrupted
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received, shutting down");
        })
        .await
}
