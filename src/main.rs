use anyhow::Context;
use tracing_subscriber::util::SubscriberInitExt;

mod backoff;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod hn_api;
pub(crate) mod routes;
pub(crate) mod stories;
#[cfg(test)]
mod test_logs;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    #[arg(help = "Port to listen on, overrides PORT")]
    port: Option<u16>,

    #[arg(short, long, default_value = "false")]
    #[arg(help = "Log to console")]
    log_to_console: bool,
}

async fn serve(config: config::Config) -> anyhow::Result<()> {
    let api = hn_api::HttpHnApi::from_config(&config)?;
    let best_stories = stories::BestStories::new(
        std::sync::Arc::new(api),
        cache::TtlCache::new(config.cache_max_entries),
        config::CACHE_TTL,
    );

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(%addr, "Listening");

    axum::serve(listener, routes::router(best_stories))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error =? e, "Could not listen for shutdown signal"),
    }
}

#[tokio::main]
async fn main() {
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;

    use clap::Parser;
    let args = Args::parse();

    let mut config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    config.log_to_console |= args.log_to_console;

    let file_appender = tracing_appender::rolling::daily("./log", "best_stories.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer();
    let file_layer = file_layer
        .with_writer(non_blocking)
        .json()
        .with_filter(tracing::level_filters::LevelFilter::INFO)
        .boxed();

    let pretty_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stdout)
        .with_filter(tracing::level_filters::LevelFilter::INFO)
        .boxed();

    let registry = tracing_subscriber::registry().with(file_layer);

    if config.log_to_console {
        registry.with(pretty_layer).init();
    } else {
        registry.init();
    };

    tracing::info!(config =? config, args =? args, "Starting best stories service");

    match serve(config).await {
        Ok(()) => tracing::info!("Best stories service stopped"),
        Err(e) => {
            tracing::error!(error =? e, "Best stories service failed");
            // Flush the file writer before exiting.
            drop(guard);
            std::process::exit(1);
        }
    }
}
