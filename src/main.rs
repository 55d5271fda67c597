use clap::Parser;
use gitstats::{
    api::{handlers::AppState, routes},
    cache::MemoryCache,
    cli::{commands, Cli, Commands},
    config::Settings,
    metrics::Metrics,
    registry::Services,
    Error, Result,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gitstats=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    settings.validate()?;

    let metrics = Arc::new(Metrics::new()?);
    let services = Services::from_settings(&settings, Arc::new(MemoryCache::new()), metrics.clone())?;
    if services.is_empty() {
        warn!("No provider configured; set GITHUB_TOKEN or GITLAB_TOKEN");
    }

    match cli.command {
        Commands::Serve { port, host } => {
            serve(settings, services, metrics, port, host).await?;
        }
        Commands::Repos { provider, owner } => {
            commands::list_repos(&services, provider, &owner).await?;
        }
        Commands::Stats {
            provider,
            project,
            filter,
        } => {
            commands::stats(&services, provider, project.as_deref(), &filter.into()).await?;
        }
        Commands::Contributors { provider, project } => {
            commands::contributors(&services, provider, &project).await?;
        }
        Commands::Loc { url, provider } => {
            commands::lines_of_code(&services, provider, &url).await?;
        }
    }

    Ok(())
}

async fn serve(
    mut settings: Settings,
    services: Services,
    metrics: Arc<Metrics>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<()> {
    // Override settings with CLI arguments
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(host) = host {
        settings.server.host = host;
    }

    info!("Starting gitstats server");
    info!(
        "Providers: {}",
        services
            .iter()
            .map(|s| s.provider().as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        "Cache TTL: {}s (line counts {}s)",
        settings.cache.ttl_secs, settings.cache.loc_ttl_secs
    );

    let state = AppState {
        services,
        metrics,
        settings: settings.clone(),
    };

    let app = routes::create_router(state, &settings);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    println!("\n========================================");
    println!("gitstats");
    println!("========================================");
    println!("Address: http://{addr}");
    println!("\nAPI Endpoints:");
    println!("  GET  /api/:provider/repos?owner=");
    println!("  GET  /api/:provider/repo?id=");
    println!("  GET  /api/:provider/commits?id=&sha=&path=&author=&page=&per_page=");
    println!("  GET  /api/:provider/contributors?id=");
    println!("  GET  /api/:provider/stats?id=");
    println!("  GET  /api/:provider/loc?repoUrl=");
    println!("  GET  /health");
    println!("  GET  /metrics");
    println!("\nPress Ctrl+C to stop");
    println!("========================================\n");

    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
