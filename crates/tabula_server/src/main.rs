use anyhow::Result;
use clap::Parser;
use tabula_core::{TabulaConfig, init_tracing};
use tabula_server::{build_state, create_router};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tabula structured generation server", long_about = None)]
struct Args {
    /// Configuration file layered over the bundled defaults
    #[arg(short, long, env = "TABULA_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Address to bind, overriding `server.bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing().map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TabulaConfig::from_file(path)?,
        None => TabulaConfig::load()?,
    };
    config.validate()?;

    let state = build_state(&config)?;
    let app = create_router(state);

    let bind = args.bind.unwrap_or_else(|| config.server.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(address = %bind, backend = %config.storage.backend, "Starting Tabula server");

    axum::serve(listener, app).await?;
    Ok(())
}
