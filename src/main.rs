//! WP Doctor diagnostics API entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wp_doctor::api::{create_router, AppState, NAMESPACE};
use wp_doctor::auth::authenticator_from_config;
use wp_doctor::client::DoctorClient;
use wp_doctor::config::Config;
use wp_doctor::host::WordPressHost;
use wp_doctor::metrics;
use wp_doctor::utils::shutdown_signal;

/// Read-only diagnostics API for WordPress hosts.
#[derive(Parser, Debug)]
#[command(name = "wp-doctor")]
#[command(about = "Read-only diagnostics API for WordPress hosts")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides WPDOCTOR_PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the diagnostics API (default).
    Serve {
        /// HTTP server port (overrides WPDOCTOR_PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Call /system-info on a remote site and print a summary.
    Ping {
        /// The site's wp-json base URL, e.g. https://example.com/wp-json.
        #[arg(long)]
        url: String,

        /// Basic auth user.
        #[arg(long, env = "WPDOCTOR_PING_USER")]
        user: String,

        /// Application password.
        #[arg(long, env = "WPDOCTOR_PING_PASSWORD", hide_env_values = true)]
        password: String,

        /// Request timeout in seconds.
        #[arg(long, default_value = "15")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging; a config error is reported again by the command
    let preload = Config::load().ok();
    let filter = if args.verbose {
        EnvFilter::new("wp_doctor=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(preload.as_ref().map_or("info", |c| c.rust_log.as_str()))
        })
    };
    let json_logs = preload.as_ref().is_some_and(Config::json_logs);

    if json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Ping {
            url,
            user,
            password,
            timeout,
        }) => cmd_ping(&url, user, password, timeout).await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("WP DOCTOR - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Check credentials
    print!("Checking API credentials... ");
    match authenticator_from_config(&config) {
        Ok(_) if config.api_user.is_none() => {
            println!("NONE");
            println!("  WARNING: no API user configured, every request will get 401");
        }
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Credential configuration invalid"));
        }
    }

    // Check installation
    print!("Checking WordPress installation... ");
    let version_php = config.wp_abspath.join("wp-includes").join("version.php");
    if version_php.is_file() {
        println!("OK");
    } else {
        println!("NOT FOUND");
        println!("  WARNING: {} missing, wordpress_version will be empty", version_php.display());
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  ABSPATH: {}", config.wp_abspath.display());
    println!("  Content Dir: {}", config.content_dir().display());
    println!("  Plugin Dir: {}", config.plugin_dir().display());
    for (i, path) in config.log_candidates().iter().enumerate() {
        println!("  Log Candidate {}: {}", i + 1, path.display());
    }
    println!(
        "  Database: {}",
        if config.database_url.is_some() { "Configured" } else { "Not configured" }
    );
    println!("  Table Prefix: {}", config.table_prefix);
    println!("  PHP Binary: {}", config.php_binary);
    println!("  API Role: {}", config.api_role);
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Call a remote site's system-info endpoint.
async fn cmd_ping(url: &str, user: String, password: String, timeout: u64) -> anyhow::Result<()> {
    let client = DoctorClient::new(url, Some((user, password)), Duration::from_secs(timeout))?;

    match client.system_info().await {
        Ok(info) => {
            println!(
                "OK system-info: WP={} PHP={} OS={}",
                info.wordpress_version, info.php_version, info.server_os
            );
            Ok(())
        }
        Err(e) => {
            println!("API Error: {}", e);
            Err(anyhow::anyhow!("Ping failed"))
        }
    }
}

/// Serve the diagnostics API until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    let authenticator = authenticator_from_config(&config)?;
    if config.api_user.is_none() {
        warn!("No API user configured; all diagnostics requests will be rejected");
    }

    let wordpress = WordPressHost::from_config(&config)?;

    // Initialize metrics
    let mut app_state = AppState::new(wordpress.host(), authenticator);
    match metrics::install_recorder() {
        Ok(handle) => {
            metrics::init_metrics();
            app_state = app_state.with_prometheus(handle);
        }
        Err(e) => warn!("Prometheus recorder unavailable: {}", e),
    }

    // Start HTTP server
    let port = port_override.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!("Diagnostics available under {}", NAMESPACE);

    let router = create_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = wordpress.shutdown().await {
        warn!("Error closing database pool: {}", e);
    }
    info!("Server stopped");

    Ok(())
}
