// # ddi-webhookd - external-dns webhook daemon
//
// This daemon is a thin integration layer: all zone matching and record
// reconciliation lives in ddi-core, all API traffic in ddi-provider-yamu.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the record store and reconciler
// 4. Serving the webhook and health endpoints until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DDI API
// - `YAMU_HOST`: Base address of the DDI API (required)
// - `YAMU_API_USER`: API user (required)
// - `YAMU_API_KEY`: API key (required)
// - `YAMU_OPENAPI_TIMEOUT`: Request timeout in seconds (default 60)
// - `YAMU_DDI_SKIP_TLS_VERIFY`: Skip TLS verification (default true)
// - `VIEW`: Management view (default "default")
// - `DEFAULT_TTL`: TTL for endpoints without one, 0 = inherit (default 0)
//
// ### Domain Filter
// - `DOMAIN_FILTER`: Comma-separated zones to manage
// - `EXCLUDE_DOMAIN_FILTER`: Comma-separated zones to leave alone
// - `REGEXP_DOMAIN_FILTER`: Inclusion regex (replaces the lists when set)
// - `REGEXP_DOMAIN_FILTER_EXCLUSION`: Exclusion regex
//
// ### Server
// - `SERVER_HOST`: Webhook bind address (default localhost)
// - `SERVER_PORT`: Webhook port (default 8888)
// - `HEALTH_PORT`: Health port, bound on all interfaces (default 8080)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export YAMU_HOST=https://ddi.example.net
// export YAMU_API_USER=external-dns
// export YAMU_API_KEY=your_key
// export DOMAIN_FILTER=example.com,example.org
//
// ddi-webhookd
// ```

mod webhook;

use anyhow::{Context, Result};
use ddi_core::traits::RecordStoreFactory;
use ddi_core::{DdiConfig, DomainFilterConfig, Reconciler, ReconcilerConfig};
use ddi_provider_yamu::YamuFactory;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Time allowed for in-flight requests to finish after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WebhookExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WebhookExitCode> for ExitCode {
    fn from(code: WebhookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    ddi: DdiConfig,
    domain_filter: DomainFilterConfig,
    server_host: String,
    server_port: u16,
    health_port: u16,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", name, name))
        };

        let mut ddi = DdiConfig::new(
            required("YAMU_HOST")?,
            required("YAMU_API_USER")?,
            required("YAMU_API_KEY")?,
        );
        ddi.timeout_secs = parse_or(&lookup, "YAMU_OPENAPI_TIMEOUT", ddi.timeout_secs)?;
        ddi.skip_tls_verify = match lookup("YAMU_DDI_SKIP_TLS_VERIFY") {
            Some(value) => parse_bool("YAMU_DDI_SKIP_TLS_VERIFY", &value)?,
            None => ddi.skip_tls_verify,
        };
        if let Some(view) = lookup("VIEW").filter(|v| !v.is_empty()) {
            ddi.view = view;
        }
        ddi.default_ttl = parse_or(&lookup, "DEFAULT_TTL", 0)?;

        let domain_filter = DomainFilterConfig {
            include: parse_list(lookup("DOMAIN_FILTER")),
            exclude: parse_list(lookup("EXCLUDE_DOMAIN_FILTER")),
            regex_include: lookup("REGEXP_DOMAIN_FILTER").filter(|v| !v.is_empty()),
            regex_exclude: lookup("REGEXP_DOMAIN_FILTER_EXCLUSION").filter(|v| !v.is_empty()),
        };

        Ok(Self {
            ddi,
            domain_filter,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "localhost".to_string()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8888)?,
            health_port: parse_or(&lookup, "HEALTH_PORT", 8080)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This checks the DDI connection settings, compiles the domain
    /// filter and rejects unusable server settings and log levels.
    fn validate(&self) -> Result<()> {
        self.ddi.validate()?;
        self.domain_filter.build()?;

        if self.server_host.is_empty() {
            anyhow::bail!("SERVER_HOST cannot be empty");
        }
        if self.server_port == 0 || self.health_port == 0 {
            anyhow::bail!("SERVER_PORT and HEALTH_PORT must be between 1 and 65535");
        }
        if self.server_port == self.health_port {
            anyhow::bail!(
                "SERVER_PORT and HEALTH_PORT must differ. Got: {} for both",
                self.server_port
            );
        }

        self.level()?;
        Ok(())
    }

    /// Maximum log level from `LOG_LEVEL`
    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, value, e)),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => anyhow::bail!("{} must be a boolean. Got: {}", name, other),
    }
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return WebhookExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WebhookExitCode::ConfigError.into();
    }

    info!("Starting ddi-webhookd {}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebhookExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let reconciler = match build_reconciler(&config) {
            Ok(reconciler) => reconciler,
            Err(e) => {
                error!("Failed to initialize provider: {:#}", e);
                return WebhookExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(config, reconciler).await {
            error!("Daemon error: {:#}", e);
            WebhookExitCode::RuntimeError
        } else {
            WebhookExitCode::CleanShutdown
        }
    })
    .into()
}

/// Build the reconciler over the Yamu record store
fn build_reconciler(config: &Config) -> Result<Reconciler> {
    let filter = config.domain_filter.build()?;
    info!("creating ddi provider with {}", filter.describe());

    let reconciler_config = ReconcilerConfig::default().with_default_ttl(config.ddi.default_ttl);
    let store = YamuFactory
        .create(&config.ddi, &reconciler_config.source)
        .context("Failed to create Yamu record store")?;
    info!(config = ?config.ddi, "record store ready");

    Ok(Reconciler::new(store, filter, reconciler_config))
}

/// Run both servers until a shutdown signal arrives
async fn run_daemon(config: Config, reconciler: Reconciler) -> Result<()> {
    let webhook_listener = TcpListener::bind((config.server_host.as_str(), config.server_port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server_host, config.server_port))?;
    let health_listener = TcpListener::bind(("0.0.0.0", config.health_port))
        .await
        .with_context(|| format!("Failed to bind health port {}", config.health_port))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let servers = async {
        tokio::try_join!(
            webhook::serve(
                webhook_listener,
                webhook::router(Arc::new(reconciler)),
                stopped(shutdown_rx.clone()),
            ),
            webhook::serve(
                health_listener,
                webhook::health_router(),
                stopped(shutdown_rx.clone()),
            ),
        )
    };
    tokio::pin!(servers);

    tokio::select! {
        result = &mut servers => {
            result?;
            anyhow::bail!("Servers stopped without a shutdown signal");
        }
        signal = wait_for_shutdown() => {
            info!("Received shutdown signal: {}", signal?);
        }
    }

    info!("Shutting down daemon");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut servers).await {
        Ok(result) => {
            result?;
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_TIMEOUT)),
    }
}

/// Resolves once shutdown has been requested
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
