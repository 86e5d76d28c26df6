//! Tool trait and registry
//!
//! Tools are deterministic operations the crew runs before prompting an
//! agent. They read documents and prepare text; they never call the model.

use crate::document::DocumentReader;
use crate::error::AnalyzerError;
use crate::models::{ToolInput, ToolOutput, DEFAULT_DOCUMENT_PATH};
use crate::normalize::normalize_text;
use crate::Result;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub const READ_DOCUMENT_TOOL: &str = "read_financial_document";
pub const INVESTMENT_DATA_TOOL: &str = "prepare_investment_data";
pub const RISK_DATA_TOOL: &str = "prepare_risk_data";

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AnalyzerError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

fn require_text(input: &ToolInput) -> Result<&str> {
    input
        .parameters
        .get("text")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AnalyzerError::InvalidToolInput(format!(
                "Expected 'text' in tool_input for {}",
                input.tool_name
            ))
        })
}

/// Reads a PDF and returns its normalized text
pub struct FinancialDocumentTool {
    reader: DocumentReader,
}

impl FinancialDocumentTool {
    pub fn new(reader: DocumentReader) -> Self {
        Self { reader }
    }
}

#[async_trait::async_trait]
impl Tool for FinancialDocumentTool {
    fn name(&self) -> &'static str {
        READ_DOCUMENT_TOOL
    }

    fn description(&self) -> &'static str {
        "Extract and normalize the text of a PDF financial document"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;

        let path = input
            .parameters
            .get("file_path")
            .and_then(|v| v.as_str())
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_DOCUMENT_PATH);

        let document = self.reader.read_normalized(&PathBuf::from(path)).await?;

        Ok(ToolOutput {
            success: true,
            data: serde_json::to_value(&document)?,
            error: None,
        })
    }
}

/// Normalizes document text before it reaches a downstream agent
pub struct TextPreparationTool {
    tool_name: &'static str,
    tool_description: &'static str,
}

impl TextPreparationTool {
    pub fn investment() -> Self {
        Self {
            tool_name: INVESTMENT_DATA_TOOL,
            tool_description: "Prepare financial document text for investment analysis",
        }
    }

    pub fn risk() -> Self {
        Self {
            tool_name: RISK_DATA_TOOL,
            tool_description: "Prepare financial document text for risk assessment",
        }
    }
}

#[async_trait::async_trait]
impl Tool for TextPreparationTool {
    fn name(&self) -> &'static str {
        self.tool_name
    }

    fn description(&self) -> &'static str {
        self.tool_description
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let text = normalize_text(require_text(input)?);

        Ok(ToolOutput {
            success: true,
            data: json!({ "text": text }),
            error: None,
        })
    }
}

/// Create a registry with the document and preparation tools
pub fn create_default_registry(reader: DocumentReader) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(FinancialDocumentTool::new(reader)));
    registry.register(Arc::new(TextPreparationTool::investment()));
    registry.register(Arc::new(TextPreparationTool::risk()));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::testing::{FailingLoader, StaticLoader};
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn registry_with(pages: &[&str]) -> ToolRegistry {
        let reader = DocumentReader::new(Arc::new(StaticLoader::new(pages)), Duration::from_secs(5), 1);
        create_default_registry(reader)
    }

    #[test]
    fn test_default_registry_lists_tools() {
        let registry = registry_with(&[]);
        assert_eq!(
            registry.list(),
            vec![INVESTMENT_DATA_TOOL, RISK_DATA_TOOL, READ_DOCUMENT_TOOL]
        );
        assert!(registry.contains(READ_DOCUMENT_TOOL));
        assert!(registry.get("search").is_none());
    }

    #[tokio::test]
    async fn test_read_document_tool() {
        let registry = registry_with(&["Revenue:\n1000\n", "  Net   Income: 200"]);
        let tool = registry.get(READ_DOCUMENT_TOOL).unwrap();

        let output = tool
            .execute(&ToolInput {
                tool_name: READ_DOCUMENT_TOOL.to_string(),
                parameters: json!({ "file_path": "reports/q2.pdf" }),
            })
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.data["text"], "Revenue: 1000 Net Income: 200");
        assert_eq!(output.data["page_count"], 2);
        assert_eq!(output.data["path"], "reports/q2.pdf");
    }

    #[tokio::test]
    async fn test_read_document_tool_defaults_path() {
        let registry = registry_with(&["x"]);
        let tool = registry.get(READ_DOCUMENT_TOOL).unwrap();

        let output = tool
            .execute(&ToolInput {
                tool_name: READ_DOCUMENT_TOOL.to_string(),
                parameters: json!({}),
            })
            .await
            .unwrap();

        assert_eq!(output.data["path"], DEFAULT_DOCUMENT_PATH);
    }

    #[tokio::test]
    async fn test_read_document_tool_propagates_unreadable() {
        let reader = DocumentReader::new(
            Arc::new(FailingLoader {
                opens: AtomicU32::new(0),
            }),
            Duration::from_secs(1),
            1,
        );
        let tool = FinancialDocumentTool::new(reader);

        let err = tool
            .execute(&ToolInput {
                tool_name: READ_DOCUMENT_TOOL.to_string(),
                parameters: json!({ "file_path": "broken.pdf" }),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzerError::DocumentUnreadable { .. }));
    }

    #[tokio::test]
    async fn test_preparation_tool_normalizes() {
        let tool = TextPreparationTool::risk();

        let output = tool
            .execute(&ToolInput {
                tool_name: RISK_DATA_TOOL.to_string(),
                parameters: json!({ "text": "  Debt:\t\t300\n\nEquity: 900 " }),
            })
            .await
            .unwrap();

        assert_eq!(output.data["text"], "Debt: 300 Equity: 900");
    }

    #[tokio::test]
    async fn test_preparation_tool_rejects_bad_input() {
        let tool = TextPreparationTool::investment();

        let missing = tool
            .execute(&ToolInput {
                tool_name: INVESTMENT_DATA_TOOL.to_string(),
                parameters: json!({ "query": "hello" }),
            })
            .await;
        assert!(matches!(missing, Err(AnalyzerError::InvalidToolInput(_))));

        let not_object = tool
            .execute(&ToolInput {
                tool_name: INVESTMENT_DATA_TOOL.to_string(),
                parameters: json!("text"),
            })
            .await;
        assert!(matches!(not_object, Err(AnalyzerError::InvalidToolInput(_))));
    }
}
