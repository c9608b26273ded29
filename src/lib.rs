pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&config);

    if matches!(cli.command, Some(Commands::Init)) {
        return cli::cmd_init();
    }

    config.validate()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let prometheus_handle = if config.observability.metrics_enabled {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let builder = PrometheusBuilder::new();
                let handle = builder
                    .install_recorder()
                    .context("Failed to install Prometheus recorder")?;
                info!("Prometheus metrics recorder initialized");
                Some(handle)
            } else {
                None
            };

            run_server(config, prometheus_handle).await
        }

        Commands::CreateFamily {
            name,
            email,
            password,
        } => cli::cmd_create_family(&config, &name, &email, &password).await,

        Commands::Init => cli::cmd_init(),
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Hearth v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }
}
