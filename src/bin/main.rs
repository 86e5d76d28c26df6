use financial_document_analyzer::{
    config::AppConfig,
    crew::Crew,
    llm::{gemini::GeminiClient, LanguageModel, OfflineModel},
    models::TaskStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Usage: analyzer [PDF_PATH] [QUERY...]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    let mut args = std::env::args().skip(1);
    let file_path = args.next().map(PathBuf::from);
    let query = {
        let rest: Vec<String> = args.collect();
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    };

    let model: Arc<dyn LanguageModel> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiClient::new(key.clone(), config.gemini_model.clone())?),
        None => {
            warn!("GEMINI_API_KEY not set, falling back to the offline model");
            Arc::new(OfflineModel)
        }
    };

    info!(model = model.name(), "Financial Document Analyzer starting");

    let crew = Crew::from_config(&config, model)?;

    match crew.kickoff_with(file_path, query).await {
        Ok(report) => {
            println!("\n=== ANALYSIS REPORT ===");
            println!("Run ID: {}", report.run_id);
            println!("Document: {}", report.file_path.display());
            println!("Query: {}", report.query);
            println!("Pages: {}", report.page_count);
            println!("Verdict: {}", report.verification.verdict);
            for issue in &report.verification.issues {
                println!("  - {}", issue);
            }

            for output in &report.task_outputs {
                println!("\n--- {} ({}) ---", output.kind, output.agent);
                match output.status {
                    TaskStatus::Completed => println!("{}", output.raw),
                    TaskStatus::Skipped => println!("[skipped] {}", output.raw),
                }
            }

            println!("\nReasoning Trace:");
            for (i, trace) in report.reasoning_trace.iter().enumerate() {
                println!("  {}: {}", i + 1, trace);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
