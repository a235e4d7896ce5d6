mod api;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use churn_core::ChurnPredictor;
use clap::Parser;
use tracing::info;

use crate::api::{create_router, AppState};

#[derive(Parser)]
#[command(name = "churn-server")]
#[command(about = "Serve churn predictions for the customer dashboard")]
struct Args {
    /// Path to the classifier artifact (.json)
    #[arg(short, long, env = "CHURN_MODEL_PATH", default_value = "models/churn_logistic.json")]
    model: PathBuf,

    /// Address to listen on
    #[arg(short, long, env = "CHURN_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Loaded once; a missing or unreadable artifact ends the process here
    let predictor = ChurnPredictor::load(&args.model)
        .with_context(|| format!("loading classifier from {}", args.model.display()))?;

    let app = create_router(AppState::new(predictor));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!(addr = %args.bind, "churn server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
