use financial_document_analyzer::{
    api::start_server,
    config::AppConfig,
    crew::Crew,
    llm::{gemini::GeminiClient, LanguageModel, OfflineModel},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Financial Document Analyzer - API Server");
    info!("📍 Port: {}", config.api_port);
    info!("📄 Default document: {}", config.default_document_path.display());

    let model: Arc<dyn LanguageModel> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiClient::new(key.clone(), config.gemini_model.clone())?),
        None => {
            warn!("⚠️  GEMINI_API_KEY not set, analysis tasks use the offline model");
            Arc::new(OfflineModel)
        }
    };

    let crew = Arc::new(Crew::from_config(&config, model)?);

    info!("✅ Crew initialized with {} tasks", crew.tasks().len());
    info!("📡 Starting API server...");

    start_server(crew, config.api_port).await?;

    Ok(())
}
