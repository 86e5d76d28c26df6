//! Core data models for the document analyzer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

pub const DEFAULT_DOCUMENT_PATH: &str = "data/sample.pdf";
pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    FinancialAnalyst,
    Verifier,
    InvestmentAdvisor,
    RiskAssessor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Verification,
    DocumentAnalysis,
    InvestmentAnalysis,
    RiskAssessment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentVerdict {
    ValidFinancialDocument,
    NotFinancialDocument,
}

impl DocumentVerdict {
    pub const VALID: &'static str = "Valid financial document";
    pub const INVALID: &'static str = "Not a financial document";

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentVerdict::ValidFinancialDocument => Self::VALID,
            DocumentVerdict::NotFinancialDocument => Self::INVALID,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DocumentVerdict::ValidFinancialDocument)
    }
}

//
// ================= Inputs =================
//

/// Inputs supplied by the caller for a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewInputs {
    pub file_path: PathBuf,
    pub query: String,
}

impl CrewInputs {
    pub fn new(file_path: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            query: query.into(),
        }
    }

    /// Blank queries fall back to [`DEFAULT_QUERY`]
    pub fn with_defaults(file_path: Option<PathBuf>, query: Option<String>, default_path: PathBuf) -> Self {
        let query = query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        Self {
            file_path: file_path.unwrap_or(default_path),
            query,
        }
    }
}

//
// ================= Verification =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub rule_name: String,
    pub passed: bool,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVerification {
    pub verdict: DocumentVerdict,
    pub checks: Vec<VerificationCheck>,
    pub issues: Vec<String>,
    pub verified_at: DateTime<Utc>,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

//
// ================= Results =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task: String,
    pub kind: TaskKind,
    pub agent: AgentRole,
    pub status: TaskStatus,
    pub raw: String,
    #[serde(default)]
    pub schema_issues: Vec<String>,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub file_path: PathBuf,
    pub query: String,
    pub document_hash: String,
    pub page_count: usize,
    pub verification: DocumentVerification,
    pub task_outputs: Vec<TaskOutput>,
    pub reasoning_trace: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub execution_time_ms: u64,
}

impl AnalysisReport {
    pub fn output_for(&self, kind: TaskKind) -> Option<&TaskOutput> {
        self.task_outputs.iter().find(|o| o.kind == kind)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::FinancialAnalyst => "Senior Financial Analyst",
            AgentRole::Verifier => "Financial Document Verifier",
            AgentRole::InvestmentAdvisor => "Investment Advisor",
            AgentRole::RiskAssessor => "Risk Assessment Specialist",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Verification => "Verification",
            TaskKind::DocumentAnalysis => "Document Analysis",
            TaskKind::InvestmentAnalysis => "Investment Analysis",
            TaskKind::RiskAssessment => "Risk Assessment",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for DocumentVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_uses_default() {
        let inputs = CrewInputs::with_defaults(None, Some("   ".to_string()), PathBuf::from(DEFAULT_DOCUMENT_PATH));
        assert_eq!(inputs.query, DEFAULT_QUERY);
        assert_eq!(inputs.file_path, PathBuf::from("data/sample.pdf"));
    }

    #[test]
    fn test_explicit_inputs_are_kept() {
        let inputs = CrewInputs::with_defaults(
            Some(PathBuf::from("q3.pdf")),
            Some(" Is the dividend safe? ".to_string()),
            PathBuf::from(DEFAULT_DOCUMENT_PATH),
        );
        assert_eq!(inputs.query, "Is the dividend safe?");
        assert_eq!(inputs.file_path, PathBuf::from("q3.pdf"));
    }

    #[test]
    fn test_verdict_strings() {
        assert_eq!(DocumentVerdict::ValidFinancialDocument.to_string(), "Valid financial document");
        assert_eq!(DocumentVerdict::NotFinancialDocument.to_string(), "Not a financial document");
    }
}
