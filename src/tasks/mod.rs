//! Task definitions
//!
//! A task binds a description template to an agent, the inputs the template
//! may reference, the tools the crew runs first and the shape of the answer.

use crate::error::AnalyzerError;
use crate::models::{AgentRole, CrewInputs, DocumentVerdict, TaskKind, TaskOutput, TaskStatus};
use crate::tools::{INVESTMENT_DATA_TOOL, READ_DOCUMENT_TOOL, RISK_DATA_TOOL};
use crate::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex must be valid");
}

/// Caller-supplied values a description may reference
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    FilePath,
    Query,
}

impl InputField {
    pub fn placeholder(&self) -> &'static str {
        match self {
            InputField::FilePath => "file_path",
            InputField::Query => "query",
        }
    }

    fn from_placeholder(name: &str) -> Option<Self> {
        match name {
            "file_path" => Some(InputField::FilePath),
            "query" => Some(InputField::Query),
            _ => None,
        }
    }

    fn value(&self, inputs: &CrewInputs) -> String {
        match self {
            InputField::FilePath => inputs.file_path.display().to_string(),
            InputField::Query => inputs.query.clone(),
        }
    }
}

/// Expected shape of an agent's answer
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "items", rename_all = "snake_case")]
pub enum OutputSchema {
    /// Every heading must appear in the answer
    Sections(Vec<String>),
    /// Exactly one of the options must appear in the answer
    OneOf(Vec<String>),
}

impl OutputSchema {
    pub fn items(&self) -> &[String] {
        match self {
            OutputSchema::Sections(items) | OutputSchema::OneOf(items) => items,
        }
    }

    /// Problems with `answer`; empty when it conforms
    pub fn check(&self, answer: &str) -> Vec<String> {
        let lowered = answer.to_lowercase();

        match self {
            OutputSchema::Sections(headings) => headings
                .iter()
                .filter(|h| !lowered.contains(&h.to_lowercase()))
                .map(|h| format!("missing section: {}", h))
                .collect(),
            OutputSchema::OneOf(options) => {
                let present: Vec<&String> = options
                    .iter()
                    .filter(|o| lowered.contains(&o.to_lowercase()))
                    .collect();
                match present.len() {
                    1 => vec![],
                    0 => vec![format!("expected one of: {}", options.join(" | "))],
                    _ => vec![format!(
                        "ambiguous answer, found: {}",
                        present.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" | ")
                    )],
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskConfig {
    name: String,
    kind: TaskKind,
    agent: AgentRole,
    description: String,
    inputs: Vec<InputField>,
    output: OutputSchema,
    tools: Vec<String>,
}

impl TaskConfig {
    pub fn new(
        name: impl Into<String>,
        kind: TaskKind,
        agent: AgentRole,
        description: impl Into<String>,
        inputs: &[InputField],
        output: OutputSchema,
        tools: &[&str],
    ) -> Result<Self> {
        let config = Self {
            name: name.into(),
            kind,
            agent,
            description: description.into(),
            inputs: inputs.to_vec(),
            output,
            tools: tools.iter().map(|t| t.to_string()).collect(),
        };
        config.validate()?;
        Ok(config)
    }

    fn invalid(&self, reason: impl std::fmt::Display) -> AnalyzerError {
        AnalyzerError::InvalidTaskConfig(format!("{}: {}", self.name, reason))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AnalyzerError::InvalidTaskConfig(
                "task name must not be empty".to_string(),
            ));
        }
        if self.description.trim().is_empty() {
            return Err(self.invalid("description must not be empty"));
        }

        let declared: HashSet<InputField> = self.inputs.iter().copied().collect();
        if declared.len() != self.inputs.len() {
            return Err(self.invalid("duplicate input field"));
        }

        let mut referenced = HashSet::new();
        for captures in PLACEHOLDER.captures_iter(&self.description) {
            let name = &captures[1];
            let field = InputField::from_placeholder(name)
                .filter(|f| declared.contains(f))
                .ok_or_else(|| self.invalid(format!("undeclared placeholder {{{}}}", name)))?;
            referenced.insert(field);
        }

        if let Some(unused) = declared.difference(&referenced).next() {
            return Err(self.invalid(format!(
                "declared input {{{}}} is never referenced",
                unused.placeholder()
            )));
        }

        let items = self.output.items();
        if items.is_empty() || items.iter().any(|i| i.trim().is_empty()) {
            return Err(self.invalid("output schema needs non-empty items"));
        }
        if self.kind == TaskKind::Verification && !matches!(self.output, OutputSchema::OneOf(_)) {
            return Err(self.invalid("verification output must be one-of"));
        }
        if self.tools.iter().any(|t| t.trim().is_empty()) {
            return Err(self.invalid("invalid tool name"));
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn agent(&self) -> AgentRole {
        self.agent
    }

    pub fn output(&self) -> &OutputSchema {
        &self.output
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// Description with every placeholder substituted
    pub fn render(&self, inputs: &CrewInputs) -> String {
        PLACEHOLDER
            .replace_all(&self.description, |captures: &regex::Captures| {
                InputField::from_placeholder(&captures[1])
                    .map(|field| field.value(inputs))
                    .unwrap_or_else(|| captures[0].to_string())
            })
            .into_owned()
    }

    /// Full prompt for the owning agent
    pub fn prompt(&self, inputs: &CrewInputs, document_text: &str, context: &[TaskOutput]) -> String {
        let mut prompt = format!(
            "TASK:\n{}\n\nUSER QUERY:\n{}\n\nEXPECTED OUTPUT:\n",
            self.render(inputs),
            inputs.query
        );

        for item in self.output.items() {
            prompt.push_str(&format!("- {}\n", item));
        }

        prompt.push_str(&format!(
            "\nDOCUMENT ({}):\n{}\n",
            inputs.file_path.display(),
            document_text
        ));

        let findings: Vec<&TaskOutput> = context
            .iter()
            .filter(|o| o.status == TaskStatus::Completed && o.kind != TaskKind::Verification)
            .collect();

        if !findings.is_empty() {
            prompt.push_str("\nPREVIOUS FINDINGS:\n");
            for output in findings {
                prompt.push_str(&format!("### {} ({})\n{}\n\n", output.kind, output.agent, output.raw));
            }
        }

        prompt
    }
}

/// Tasks of the analysis crew, in run order
pub fn default_tasks() -> Result<Vec<TaskConfig>> {
    use InputField::{FilePath, Query};

    Ok(vec![
        TaskConfig::new(
            "verification",
            TaskKind::Verification,
            AgentRole::Verifier,
            "Verify whether the uploaded document at {file_path} contains financial terms such as \
Revenue, Net Income, EPS or Cash Flow. Confirm it as a financial document if it does, otherwise reject it.",
            &[FilePath],
            OutputSchema::OneOf(vec![
                DocumentVerdict::VALID.to_string(),
                DocumentVerdict::INVALID.to_string(),
            ]),
            &[READ_DOCUMENT_TOOL],
        )?,
        TaskConfig::new(
            "analyze_financial_document",
            TaskKind::DocumentAnalysis,
            AgentRole::FinancialAnalyst,
            "Analyze the uploaded financial document {file_path} and answer the user's query: {query}. \
Extract key metrics (Revenue, Net Income, EPS, Cash Flow) exactly as reported and provide insights.",
            &[FilePath, Query],
            OutputSchema::Sections(vec![
                "Key financial highlights".to_string(),
                "Growth trends".to_string(),
                "Market risks".to_string(),
                "Investment outlook".to_string(),
            ]),
            &[READ_DOCUMENT_TOOL],
        )?,
        TaskConfig::new(
            "investment_analysis",
            TaskKind::InvestmentAnalysis,
            AgentRole::InvestmentAdvisor,
            "Review the financial data in {file_path} and address the user's query: {query}. \
Relate each consideration to a specific reported metric and state the assumptions behind it.",
            &[FilePath, Query],
            OutputSchema::Sections(vec![
                "Investment considerations".to_string(),
                "Supporting metrics".to_string(),
                "Suitability and caveats".to_string(),
            ]),
            &[READ_DOCUMENT_TOOL, INVESTMENT_DATA_TOOL],
        )?,
        TaskConfig::new(
            "risk_assessment",
            TaskKind::RiskAssessment,
            AgentRole::RiskAssessor,
            "Assess the risks reflected in the financial document {file_path} with respect to the \
user's query: {query}. Cover liquidity, leverage, profitability and market exposure using the reported figures.",
            &[FilePath, Query],
            OutputSchema::Sections(vec![
                "Key risks".to_string(),
                "Risk indicators".to_string(),
                "Mitigation considerations".to_string(),
            ]),
            &[READ_DOCUMENT_TOOL, RISK_DATA_TOOL],
        )?,
    ])
}
