/// gke-provisioner - GKE clusters from a single HTTP call
///
/// Accepts a small JSON request and turns it into a fully specified
/// Kubernetes Engine cluster creation call, configured from the environment.
mod config;
mod gcp;
mod gke;
mod http;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServiceConfig;
use crate::gcp::{Credentials, TokenProvider};
use crate::gke::cluster::build_create_cluster_request;
use crate::gke::operation::wait_for_operation;
use crate::gke::{CreateClusterRequest, GkeClient, GkeService};
use crate::http::HttpServer;

#[derive(Parser)]
#[command(name = "gke-provisioner")]
#[command(about = "Provision GKE clusters from a minimal request", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the create-cluster function over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        address: IpAddr,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },

    /// Create a cluster from a request file
    Create {
        /// JSON or YAML request file
        #[arg(short, long)]
        request: PathBuf,

        /// Wait for the create operation to finish
        #[arg(long)]
        wait: bool,

        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 1800)]
        timeout: u64,
    },

    /// Print the create-cluster body without calling the API
    Render {
        /// JSON or YAML request file
        #[arg(short, long)]
        request: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Show the status of a cluster
    Status {
        /// Cluster name
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gke_provisioner={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Serve { address, port } => serve(SocketAddr::new(address, port)).await,
        Commands::Create {
            ref request,
            wait,
            timeout,
        } => create_cluster(request, wait, Duration::from_secs(timeout)).await,
        Commands::Render {
            ref request,
            format,
        } => render(request, format),
        Commands::Status { ref name } => show_status(name).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Load configuration, failing fast when it is incomplete
fn load_config() -> Result<ServiceConfig> {
    let config = ServiceConfig::from_env().context("Failed to load configuration")?;
    debug!("Configuration: {}", serde_json::to_string(&config)?);
    Ok(config)
}

fn build_client(config: &ServiceConfig) -> Result<GkeClient> {
    let credentials = Credentials::from_env().context("Failed to load Google Cloud credentials")?;
    info!("Authenticating with {}", credentials.kind());

    let tokens = Arc::new(TokenProvider::new(credentials));
    GkeClient::new(config.gke_api_endpoint.clone(), tokens)
        .context("Failed to create Kubernetes Engine client")
}

/// Run the HTTP function
async fn serve(address: SocketAddr) -> Result<()> {
    let config = load_config()?;
    let client = build_client(&config)?;

    info!(
        "Provisioning clusters in project {} ({})",
        config.project_id, config.zone
    );

    let service = GkeService::new(config, Arc::new(client));
    HttpServer::new(service, address)
        .start()
        .await
        .context("HTTP server failed")
}

/// Create a cluster once from the command line
async fn create_cluster(request_path: &Path, wait: bool, timeout: Duration) -> Result<()> {
    let request = CreateClusterRequest::from_file(request_path)?;
    let config = load_config()?;
    let client = build_client(&config)?;

    let service = GkeService::new(config.clone(), Arc::new(client.clone()));
    let response = service
        .create_cluster(&request)
        .await
        .context("Failed to create cluster")?;

    info!("✓ Cluster creation dispatched: {}", request.name);

    if !wait {
        return Ok(());
    }

    let operation = response
        .operation_name()
        .context("API returned no operation to wait on")?;
    wait_for_operation(&client, &config.project_id, &config.zone, operation, timeout).await?;

    info!("✓ Cluster {} is ready", request.name);
    Ok(())
}

/// Print the body that would be submitted
fn render(request_path: &Path, format: OutputFormat) -> Result<()> {
    let request = CreateClusterRequest::from_file(request_path)?;
    request.validate()?;
    let config = load_config()?;

    let body = build_create_cluster_request(&config, &request);
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&body)?,
        OutputFormat::Yaml => serde_yaml::to_string(&body)?,
    };
    println!("{}", output);

    Ok(())
}

/// Show cluster status
async fn show_status(name: &str) -> Result<()> {
    let config = load_config()?;
    let client = build_client(&config)?;

    let cluster = client
        .get_cluster(&config.project_id, &config.zone, name)
        .await
        .with_context(|| format!("Failed to get cluster {}", name))?;

    let field = |key: &str| {
        cluster
            .get(key)
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .unwrap_or_else(|| "N/A".to_string())
    };

    info!("Cluster: {}", name);
    info!("  Status: {}", field("status"));
    info!("  Location: {}", field("location"));
    info!("  Master version: {}", field("currentMasterVersion"));
    info!("  Node count: {}", field("currentNodeCount"));
    info!("  Endpoint: {}", field("endpoint"));

    Ok(())
}
