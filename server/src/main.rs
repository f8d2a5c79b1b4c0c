use anyhow::Result;
use axum::Router;
use clap::Parser;
use lemmadex_core::EngineConfig;
use lemmadex_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Document directory or JSON/JSONL file
    #[arg(long, default_value = "./pages")]
    documents: PathBuf,
    /// `<id> <locator>` table
    #[arg(long)]
    locators: Option<PathBuf>,
    /// Engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let engine = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let config = ServerConfig {
        source: args.documents.clone(),
        locators: args.locators.clone(),
        engine,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = tokio::task::spawn_blocking(move || build_app(config)).await??;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
