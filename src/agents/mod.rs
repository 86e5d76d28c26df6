//! Agent definitions
//!
//! An agent is a persona the language model adopts for a task, plus the set
//! of tools the crew may run on its behalf.

use crate::error::AnalyzerError;
use crate::models::AgentRole;
use crate::tools::{INVESTMENT_DATA_TOOL, READ_DOCUMENT_TOOL, RISK_DATA_TOOL};
use crate::Result;
use serde::Serialize;

const MAX_ITERATIONS_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    role: AgentRole,
    goal: String,
    backstory: String,
    tools: Vec<String>,
    max_iterations: u32,
}

impl AgentConfig {
    pub fn new(
        role: AgentRole,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        tools: &[&str],
        max_iterations: u32,
    ) -> Result<Self> {
        let config = Self {
            role,
            goal: goal.into(),
            backstory: backstory.into(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            max_iterations,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.goal.trim().is_empty() {
            return Err(AnalyzerError::InvalidAgentConfig(format!(
                "{}: goal must not be empty",
                self.role
            )));
        }
        if self.backstory.trim().is_empty() {
            return Err(AnalyzerError::InvalidAgentConfig(format!(
                "{}: backstory must not be empty",
                self.role
            )));
        }
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(AnalyzerError::InvalidAgentConfig(format!(
                "{}: max_iterations must be within 1..={}",
                self.role, MAX_ITERATIONS_LIMIT
            )));
        }
        if let Some(blank) = self.tools.iter().find(|t| t.trim().is_empty()) {
            return Err(AnalyzerError::InvalidAgentConfig(format!(
                "{}: invalid tool name {:?}",
                self.role, blank
            )));
        }
        Ok(())
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn permits_tool(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }

    /// System instruction sent to the model for this agent
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a {}.\n\nGoal: {}\n\nBackground: {}\n\nGround every statement in the supplied document text. \
If the document does not contain a figure, say so instead of estimating it.",
            self.role, self.goal, self.backstory
        )
    }
}

/// The four agents of the analysis crew
pub fn default_agents() -> Result<Vec<AgentConfig>> {
    Ok(vec![
        AgentConfig::new(
            AgentRole::FinancialAnalyst,
            "Answer the user's query accurately using the figures reported in the financial document",
            "You have years of experience reading earnings releases, annual reports and cash flow \
statements. You cite the numbers you rely on and distinguish reported results from your interpretation.",
            &[READ_DOCUMENT_TOOL],
            3,
        )?,
        AgentConfig::new(
            AgentRole::Verifier,
            "Confirm whether an uploaded document is a financial report before it is analyzed",
            "You review documents for a compliance team and only accept material that contains \
recognizable financial statements or metrics.",
            &[READ_DOCUMENT_TOOL],
            1,
        )?,
        AgentConfig::new(
            AgentRole::InvestmentAdvisor,
            "Give balanced investment considerations that follow from the reported financials and the user's query",
            "You are a fiduciary advisor. You explain how specific metrics affect an investment thesis, \
note what would change your view, and never recommend products the document gives no basis for.",
            &[READ_DOCUMENT_TOOL, INVESTMENT_DATA_TOOL],
            3,
        )?,
        AgentConfig::new(
            AgentRole::RiskAssessor,
            "Identify the material risks disclosed or implied by the financial document",
            "You assess liquidity, leverage, concentration and market risk from reported figures \
and keep your conclusions proportionate to the evidence.",
            &[READ_DOCUMENT_TOOL, RISK_DATA_TOOL],
            3,
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_agents_are_valid() {
        let agents = default_agents().unwrap();
        assert_eq!(agents.len(), 4);
        assert!(agents.iter().all(|a| a.permits_tool(READ_DOCUMENT_TOOL)));
        assert_eq!(agents[1].role(), AgentRole::Verifier);
    }

    #[test]
    fn test_rejects_empty_goal() {
        let err = AgentConfig::new(AgentRole::Verifier, "  ", "backstory", &[], 1).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidAgentConfig(_)));
    }

    #[test]
    fn test_rejects_iteration_bounds() {
        assert!(AgentConfig::new(AgentRole::Verifier, "goal", "backstory", &[], 0).is_err());
        assert!(AgentConfig::new(AgentRole::Verifier, "goal", "backstory", &[], 11).is_err());
        assert!(AgentConfig::new(AgentRole::Verifier, "goal", "backstory", &[], 10).is_ok());
    }

    #[test]
    fn test_rejects_blank_tool() {
        let err = AgentConfig::new(AgentRole::RiskAssessor, "goal", "backstory", &["", "x"], 1).unwrap_err();
        assert!(err.to_string().contains("invalid tool name"));
    }

    #[test]
    fn test_system_prompt_mentions_role_and_goal() {
        let agent = AgentConfig::new(AgentRole::RiskAssessor, "Find leverage risk", "Credit analyst", &[], 2).unwrap();
        let prompt = agent.system_prompt();
        assert!(prompt.starts_with("You are a Risk Assessment Specialist."));
        assert!(prompt.contains("Find leverage risk"));
    }
}
