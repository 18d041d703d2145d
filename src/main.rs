//! MedPredict: Disease-risk prediction service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medpredict::adapters::{FileModelStore, JsonKnowledgeBase, SanitizingMakeWriter};
use medpredict::application::{ModelLoader, PredictionService};
use medpredict::config::{LogMode, ServiceConfig};
use medpredict::http::{router, AppState};

fn load_knowledge(config: &ServiceConfig) -> JsonKnowledgeBase {
    if !config.knowledge_file.exists() {
        tracing::warn!(
            "Symptom knowledge file not found at {:?}; general predictions will reject every symptom",
            config.knowledge_file
        );
        return JsonKnowledgeBase::empty();
    }
    match JsonKnowledgeBase::load(&config.knowledge_file) {
        Ok(kb) => kb,
        Err(e) => {
            tracing::error!("{}; continuing with an empty knowledge base", e);
            JsonKnowledgeBase::empty()
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging before reading the rest of the configuration so its
    // warnings reach the log.
    let (writer, _guard) = match &LogMode::from_env() {
        LogMode::File(log_file) => {
            if let Some(parent) = log_file.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("opening log file {}", log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    let config = ServiceConfig::from_env_or_default();

    tracing::info!("Starting MedPredict...");
    tracing::info!(
        "Model directory {:?}, knowledge file {:?}, model cache {}",
        config.model_dir,
        config.knowledge_file,
        if config.cache_models { "on" } else { "off" }
    );

    let store = Arc::new(FileModelStore::new(&config.model_dir));
    let loader = ModelLoader::new(store, config.cache_models);
    for (disease, present) in loader.availability() {
        if !present {
            tracing::warn!("No artifact for {}; requests will use the fallback model", disease);
        }
    }

    let knowledge = Arc::new(load_knowledge(&config));
    let service = PredictionService::new(loader, knowledge);
    let app = router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("MedPredict shutdown complete.");
    Ok(())
}
