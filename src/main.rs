//! dbpair - Primary/Replica Database Connectivity Demo
//!
//! Serves the demo pages, or runs a single read/write/status operation from
//! the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dbpair::api::{AppState, HttpServer};
use dbpair::config::DbPairConfig;
use dbpair::connection::{ConnectionInfo, DirectorySource};
use dbpair::executor::MySqlConnector;
use dbpair::network::SystemResolver;

/// dbpair - Primary/Replica Database Connectivity Demo
#[derive(Parser)]
#[command(name = "dbpair")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dbpair.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Show connection info and replication status
    Status,

    /// Read all values from the replica
    Read,

    /// Write a value to the primary
    Write {
        /// Value to store (truncated to 200 characters)
        value: String,
    },

    /// Initialize a new configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "dbpair.toml")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = DbPairConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, &config.logging.format);

    match cli.command {
        Commands::Serve { listen } => run_serve(config, listen).await,
        Commands::Status => run_status(&config).await,
        Commands::Read => run_read(&config).await,
        Commands::Write { value } => run_write(&config, &value).await,
        Commands::Init { output } => run_init(&output),
        Commands::Validate => run_validate(&cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn server_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".into())
}

fn load_connection_info(config: &DbPairConfig) -> dbpair::Result<ConnectionInfo> {
    ConnectionInfo::load(&DirectorySource::new(&config.source.path))
}

/// Start the HTTP server
async fn run_serve(mut config: DbPairConfig, listen: Option<String>) -> anyhow::Result<()> {
    if let Some(listen) = listen {
        config.server.bind_address = listen;
    }

    tracing::info!("Starting dbpair...");
    tracing::info!("Reading connection keys from {:?}", config.source.path);
    tracing::info!("Database port: {}", config.database.port);

    let state = AppState {
        server_hostname: server_hostname(),
        source: Arc::new(DirectorySource::new(&config.source.path)),
        connector: Arc::new(MySqlConnector::new(config.database.port)),
        resolver: Arc::new(SystemResolver),
    };

    let server = HttpServer::new(config.server.clone(), state);
    server.start().await?;

    tracing::info!("dbpair stopped");
    Ok(())
}

/// Show connection info and replication status
async fn run_status(config: &DbPairConfig) -> anyhow::Result<()> {
    let info = load_connection_info(config)?;
    let status = info.replication_status(&SystemResolver).await;

    println!("dbpair status");
    println!("=============");
    println!("Server:      {}", server_hostname());
    println!("Username:    {}", info.username());
    println!("Primary:     {} - {}", info.primary_host(), status.primary);
    println!("Replica:     {} - {}", info.replica_host(), status.replica);
    println!("Replicating: {}", status.replicating);

    Ok(())
}

/// Read all values from the replica
async fn run_read(config: &DbPairConfig) -> anyhow::Result<()> {
    let info = load_connection_info(config)?;
    let connector = MySqlConnector::new(config.database.port);

    let values = info.replica().read_values(&connector).await?;
    if values.is_empty() {
        println!("No data yet");
    }
    for (i, value) in values.iter().enumerate() {
        println!("{:>4}. {}", i + 1, value);
    }

    Ok(())
}

/// Write a value to the primary
async fn run_write(config: &DbPairConfig, value: &str) -> anyhow::Result<()> {
    let info = load_connection_info(config)?;
    let connector = MySqlConnector::new(config.database.port);

    info.primary().insert_value(&connector, value).await?;
    println!("Stored value on {}", info.primary_host());

    Ok(())
}

/// Initialize a new configuration file
fn run_init(output: &Path) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("Configuration file already exists: {:?}", output);
    }

    let content = DbPairConfig::default().to_toml()?;
    std::fs::write(output, content)
        .with_context(|| format!("Failed to write {:?}", output))?;

    println!("Created configuration file: {:?}", output);
    println!();
    println!("Next steps:");
    println!("  1. Put mysql-username, mysql-password, mysql-master and mysql-slave");
    println!("     files in the [source] path");
    println!("  2. Start the server: dbpair serve");

    Ok(())
}

/// Validate configuration file
fn run_validate(config_path: &Path) -> anyhow::Result<()> {
    let config = DbPairConfig::from_file(config_path)
        .with_context(|| format!("Invalid configuration in {:?}", config_path))?;

    println!("Configuration is valid");
    println!("  Bind address: {}", config.server.bind_address);
    println!("  Key source:   {:?}", config.source.path);
    println!("  DB port:      {}", config.database.port);

    let source = DirectorySource::new(&config.source.path);
    match ConnectionInfo::load(&source) {
        Ok(info) => println!(
            "  Connection keys present (primary {}, replica {})",
            info.primary_host(),
            info.replica_host()
        ),
        Err(e) => println!("  Warning: {}", e),
    }

    Ok(())
}
