use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use finance_tracker_server::{
    AppState, app,
    assistant::{OpenAiSummarizer, TextSummarizer},
    config::Config,
    database,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let db = database::init_db(&config.data_path)
        .await
        .context("failed to initialize database")?;

    let summarizer: Option<Arc<dyn TextSummarizer>> = match &config.ai {
        Some(ai) => {
            let client = OpenAiSummarizer::new(ai).context("failed to build AI client")?;
            tracing::info!(model = %ai.model, "AI summaries enabled");
            Some(Arc::new(client) as Arc<dyn TextSummarizer>)
        }
        None => {
            tracing::info!("OPENAI_API_KEY not set, AI summaries disabled");
            None
        }
    };

    let router = app(AppState::new(db, summarizer));

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully...");
}
