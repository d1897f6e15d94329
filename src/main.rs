//! SDS Placement
//!
//! Runs pool discovery for the backends enabled on this host and serves the
//! provisioning REST API.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sds_placement::model::{DockType, DEFAULT_PROFILE_NAME};
use sds_placement::{
    discovery_and_report, ApiServer, ApiServerConfig, ControllerConfig, DiscovererDeps,
    DiscovererRegistry, DiscoveryContext, DriverFactory, DriverRegistry, Error, MemoryStore,
    Metrics, PersistenceClientRef, ProfileSpec, ProvisionController, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// SDS Placement - pool discovery and placement for block and file storage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file; built-in defaults when omitted
    #[arg(long, env = "SDS_CONFIG")]
    config: Option<PathBuf>,

    /// REST API bind address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
    api_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Discovery interval in seconds, overrides the configuration file
    #[arg(long, env = "DISCOVERY_INTERVAL")]
    discovery_interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting SDS Placement");
    info!("  Version: {}", sds_placement::VERSION);
    info!("  REST API: {}", args.api_addr);
    info!("  Metrics: {}", args.metrics_addr);

    let mut config = match &args.config {
        Some(path) => ControllerConfig::load(path)?,
        None => {
            info!("No configuration file given, using built-in defaults");
            ControllerConfig::default()
        }
    };
    if let Some(secs) = args.discovery_interval_secs {
        if secs == 0 {
            return Err(Error::Configuration(
                "discovery interval must be at least one second".into(),
            ));
        }
        config.discovery.interval_secs = secs;
    }
    let config = Arc::new(config);

    let store: PersistenceClientRef = Arc::new(MemoryStore::new());
    seed_default_profile(&store).await?;

    let drivers = Arc::new(DriverRegistry::from_config(&DriverFactory::default(), &config));
    let metrics = Arc::new(Metrics::new()?);

    // Discovery
    let stop = CancellationToken::new();
    let (errors_tx, mut errors_rx) = mpsc::channel::<Error>(16);

    let discoverer = DiscovererRegistry::default().create(
        DockType::Provisioner,
        DiscovererDeps {
            config: config.clone(),
            drivers: drivers.clone(),
            store: store.clone(),
        },
    )?;
    let ctx = DiscoveryContext {
        stop: stop.clone(),
        errors: errors_tx,
        interval: config.discovery.interval(),
        metrics: metrics.clone(),
    };
    tokio::spawn(async move {
        if let Err(e) = discovery_and_report(discoverer, ctx).await {
            error!(error = %e, "Discovery loop ended");
        }
    });
    tokio::spawn(async move {
        while let Some(e) = errors_rx.recv().await {
            warn!(error = %e, action = ?e.action(), "Discovery report error");
        }
    });

    // Metrics server
    let metrics_addr = args.metrics_addr.clone();
    let server_metrics = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr, server_metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    // API server
    let controller = ProvisionController::new(store, drivers, metrics);
    let api_config = ApiServerConfig {
        rest_addr: args.api_addr.parse().map_err(|e| {
            Error::Configuration(format!("Invalid REST API address: {}", e))
        })?,
    };
    let api_server = Arc::new(ApiServer::new(api_config, controller));

    let signal_server = api_server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_server.shutdown();
        }
    });

    let result = api_server.run().await;
    stop.cancel();

    info!("Shutdown complete");
    result
}

/// Create the tenant default profile unless one exists
async fn seed_default_profile(store: &PersistenceClientRef) -> Result<()> {
    match store.get_default_profile().await {
        Ok(profile) => {
            info!(profile = %profile.id, "Default profile present");
            Ok(())
        }
        Err(Error::ResourceNotFound { .. }) => {
            let mut profile = ProfileSpec::new(DEFAULT_PROFILE_NAME);
            profile.description = "Default policy profile".to_string();
            let profile = store.create_profile(profile).await?;
            info!(profile = %profile.id, "Seeded default profile");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "tower=warn", "axum=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str, metrics: Arc<Metrics>) -> Result<()> {
    use hyper::header::{HeaderValue, CONTENT_TYPE};
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Response, Server, StatusCode};

    fn reply(status: StatusCode, content_type: &str, body: Vec<u8>) -> Response<Body> {
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        if let Ok(value) = HeaderValue::from_str(content_type) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }

    let make_svc = make_service_fn(move |_conn| {
        let metrics = metrics.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req: Request<Body>| {
                let metrics = metrics.clone();
                async move {
                    let response = match req.uri().path() {
                        "/metrics" => match metrics.encode() {
                            Ok((content_type, buffer)) => {
                                reply(StatusCode::OK, &content_type, buffer)
                            }
                            Err(e) => reply(
                                StatusCode::INTERNAL_SERVER_ERROR,
                                "text/plain",
                                e.to_string().into_bytes(),
                            ),
                        },
                        "/healthz" | "/livez" => {
                            reply(StatusCode::OK, "text/plain", b"ok".to_vec())
                        }
                        _ => reply(StatusCode::NOT_FOUND, "text/plain", b"not found".to_vec()),
                    };
                    Ok::<_, std::convert::Infallible>(response)
                }
            }))
        }
    });

    let addr: SocketAddr = addr.parse().map_err(|e| {
        Error::Internal(format!("Invalid metrics server address: {}", e))
    })?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
