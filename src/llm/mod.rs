//! Language model seam
//!
//! Agents reason through a [`LanguageModel`]. The Gemini client talks to the
//! hosted API; [`OfflineModel`] keeps the pipeline runnable without a key.

use crate::Result;
use async_trait::async_trait;

pub mod gemini;
pub use gemini::GeminiClient;

/// Text completion backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    /// Complete `prompt` under the given system instruction
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

/// Deterministic model for development & testing.
///
/// Answers with the headings the prompt asks for, each followed by a note
/// that no model was consulted.
pub struct OfflineModel;

#[async_trait]
impl LanguageModel for OfflineModel {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, _system_prompt: &str, prompt: &str) -> Result<String> {
        let headings: Vec<&str> = prompt
            .lines()
            .skip_while(|line| line.trim() != "EXPECTED OUTPUT:")
            .skip(1)
            .take_while(|line| !line.trim().is_empty())
            .filter_map(|line| line.trim().strip_prefix("- "))
            .collect();

        if headings.is_empty() {
            return Ok("Offline model: no language model configured.".to_string());
        }

        Ok(headings
            .iter()
            .map(|h| format!("## {}\nOffline model: no language model configured.\n", h))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
