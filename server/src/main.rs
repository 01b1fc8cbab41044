use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, AppConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Snapshot directory written by `indexer build`
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Raw JSON/JSONL records served when the snapshot is unusable
    #[arg(long)]
    fallback: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Records revealed per load-more
    #[arg(long, default_value_t = 12)]
    window_size: usize,
    /// Pause before answering a load-more request
    #[arg(long, default_value_t = 500)]
    load_more_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = AppConfig {
        index_dir: args.index,
        fallback: args.fallback,
        window_size: args.window_size,
        load_more_delay: Duration::from_millis(args.load_more_delay_ms),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
