//! container-state-exporter
//!
//! Prometheus exporter for container lifecycle state with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod health_stats;
mod metrics;
mod startup_checks;
mod state;

use axum::{routing::get, Router};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use container_state_exporter::{
    CachedCollector, ContainerRuntime, DockerRuntime, RuntimeSnapshotSource,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_test};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_LOG_LEVEL,
};
use handlers::{health_handler, liveness_handler, metrics_handler, root_handler};
use state::AppState;

type DockerSource = RuntimeSnapshotSource<DockerRuntime>;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(level: LogLevel) {
    let log_level = match level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    };

    let Some(log_level) = log_level else {
        return;
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {:?}", level);
}

/// Loads configuration, exits with code 1 if it is invalid, then starts
/// logging at the configured level.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    // log_level was checked by validation
    setup_logging(config.log_level().unwrap_or(DEFAULT_LOG_LEVEL));
    match &config.loaded_from {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => debug!("No configuration file found, using defaults"),
    }
    Ok(config)
}

/// Resolves once SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;

        return match command {
            Commands::Check => command_check(&config).await,
            Commands::Test {
                iterations,
                verbose,
                print_metrics,
            } => command_test(*iterations, *verbose, *print_metrics, &config).await,
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    let config = load_validated_config(&args)?;

    info!("Starting container-state-exporter {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = startup_checks::validate_requirements(config.docker_host.as_deref()) {
        error!("❌ Startup validation failed: {}", e);
        std::process::exit(1);
    }

    // Fail fast on boot if the runtime is unreachable
    let runtime = match DockerRuntime::connect(
        config.docker_host.as_deref(),
        config.runtime_timeout(),
        config.all_containers.unwrap_or(true),
    ) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("❌ Failed to create docker client: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.ping().await {
        error!("❌ Container runtime not reachable: {}", e);
        std::process::exit(1);
    }
    info!("✅ Container runtime reachable");

    let options = config.collector_options();
    debug!(
        "Snapshot cache: ttl={:?}, fetch timeout={:?}, serve stale on error={}",
        options.ttl, options.fetch_timeout, options.serve_stale_on_error
    );
    let collector = CachedCollector::new(RuntimeSnapshotSource::new(runtime), options);

    let state = Arc::new(AppState::new(collector, config.clone())?);

    // Configure HTTP server routes
    let addr = config.listen_addr()?;

    let mut app = Router::new()
        .route("/", get(root_handler::<DockerSource>))
        .route("/metrics", get(metrics_handler::<DockerSource>))
        .route("/-/healthy", get(liveness_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler::<DockerSource>));
    }

    let app = app.with_state(state);

    if config.enable_tls.unwrap_or(false) {
        let (Some(cert_path), Some(key_path)) =
            (config.tls_cert_path.as_ref(), config.tls_key_path.as_ref())
        else {
            return Err("TLS enabled without tls_cert_path and tls_key_path".into());
        };

        info!("Loading TLS certificate from: {}", cert_path);
        info!("Loading TLS private key from: {}", key_path);

        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .map_err(|e| {
                error!("Failed to load TLS configuration: {}", e);
                e
            })?;

        info!("container-state-exporter listening on https://{}", addr);

        let server = axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service());

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!("Server error: {}", e);
                    return Err(e.into());
                }
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received, exiting...");
            }
        }
    } else {
        let listener = TcpListener::bind(addr).await?;
        info!("container-state-exporter listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("Server error: {}", e);
                e
            })?;
    }

    info!("container-state-exporter stopped gracefully");
    Ok(())
}
