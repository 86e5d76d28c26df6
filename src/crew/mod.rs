//! Crew - runs the configured tasks in order
//!
//! INPUT → READ → VERIFY → ANALYZE → ADVISE → ASSESS RISK → REPORT
//!
//! Agents, tasks, tools and the model are injected; nothing is shared
//! through globals.

use crate::agents::{default_agents, AgentConfig};
use crate::config::AppConfig;
use crate::document::{DocumentReader, NormalizedDocument, PdfLoader};
use crate::error::AnalyzerError;
use crate::llm::LanguageModel;
use crate::models::{
    AgentRole, AnalysisReport, CrewInputs, DocumentVerification, TaskKind, TaskOutput, TaskStatus,
    ToolInput,
};
use crate::tasks::{default_tasks, TaskConfig};
use crate::tools::{create_default_registry, ToolRegistry, READ_DOCUMENT_TOOL};
use crate::verification::{create_default_verification_engine, VerificationEngine};
use crate::Result;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Agents and tasks wired to a tool registry and a language model
pub struct Crew {
    agents: HashMap<AgentRole, AgentConfig>,
    tasks: Vec<TaskConfig>,
    registry: ToolRegistry,
    model: Arc<dyn LanguageModel>,
    verification_engine: VerificationEngine,
    default_document_path: PathBuf,
}

impl Crew {
    pub fn new(
        agents: Vec<AgentConfig>,
        tasks: Vec<TaskConfig>,
        registry: ToolRegistry,
        model: Arc<dyn LanguageModel>,
        verification_engine: VerificationEngine,
    ) -> Result<Self> {
        let mut by_role = HashMap::with_capacity(agents.len());
        for agent in agents {
            let role = agent.role();
            if by_role.insert(role, agent).is_some() {
                return Err(AnalyzerError::InvalidCrew(format!("duplicate agent: {}", role)));
            }
        }

        validate_tasks(&tasks, &by_role, &registry)?;

        Ok(Self {
            agents: by_role,
            tasks,
            registry,
            model,
            verification_engine,
            default_document_path: PathBuf::from(crate::models::DEFAULT_DOCUMENT_PATH),
        })
    }

    /// Default agents and tasks, PDF loading per `config`
    pub fn from_config(config: &AppConfig, model: Arc<dyn LanguageModel>) -> Result<Self> {
        let reader = DocumentReader::new(
            Arc::new(PdfLoader),
            config.document_load_timeout,
            config.document_load_attempts,
        );

        let crew = Self::new(
            default_agents()?,
            default_tasks()?,
            create_default_registry(reader),
            model,
            create_default_verification_engine(),
        )?;

        Ok(crew.with_default_document_path(config.default_document_path.clone()))
    }

    pub fn with_default_document_path(mut self, path: PathBuf) -> Self {
        self.default_document_path = path;
        self
    }

    pub fn default_document_path(&self) -> &Path {
        &self.default_document_path
    }

    pub fn tasks(&self) -> &[TaskConfig] {
        &self.tasks
    }

    /// Fill in the default path and query, then run
    pub async fn kickoff_with(&self, file_path: Option<PathBuf>, query: Option<String>) -> Result<AnalysisReport> {
        let inputs = CrewInputs::with_defaults(file_path, query, self.default_document_path.clone());
        self.kickoff(inputs).await
    }

    /// Run every task in order
    pub async fn kickoff(&self, inputs: CrewInputs) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();
        let mut reasoning_trace = Vec::new();
        let mut task_outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        let mut run = RunState::default();
        let mut verification: Option<DocumentVerification> = None;

        info!(
            run_id = %run_id,
            file_path = %inputs.file_path.display(),
            query = %inputs.query,
            model = %self.model.name(),
            "Crew: starting run"
        );

        reasoning_trace.push(format!("INPUT: {} ({})", inputs.file_path.display(), inputs.query));

        for task in &self.tasks {
            let agent = self.agents.get(&task.agent()).ok_or_else(|| {
                AnalyzerError::ExecutionError(format!("agent {} missing for {}", task.agent(), task.name()))
            })?;

            if let Some(rejected) = verification.as_ref().filter(|v| !v.verdict.is_valid()) {
                reasoning_trace.push(format!("SKIP: {} (document rejected)", task.name()));
                task_outputs.push(TaskOutput {
                    task: task.name().to_string(),
                    kind: task.kind(),
                    agent: agent.role(),
                    status: TaskStatus::Skipped,
                    raw: format!("Skipped: {}", rejected.verdict),
                    schema_issues: vec![],
                    execution_time_ms: 0,
                });
                continue;
            }

            let task_start = Instant::now();
            debug!(task = %task.name(), agent = %agent.role(), "Running task");

            let text = self.run_tools(task, &inputs, &mut run).await?;

            let (raw, schema_issues) = if task.kind() == TaskKind::Verification {
                let document = run.document.as_ref().ok_or_else(|| {
                    AnalyzerError::ExecutionError("verification ran without a document".to_string())
                })?;

                let result = self.verification_engine.verify(document);
                reasoning_trace.push(format!(
                    "VERIFY: {} ({} / {} rules passed)",
                    result.verdict,
                    result.checks.iter().filter(|c| c.passed).count(),
                    result.checks.len()
                ));

                let raw = result.verdict.as_str().to_string();
                verification = Some(result);
                let issues = task.output().check(&raw);
                (raw, issues)
            } else {
                let (raw, issues) = self.run_agent(agent, task, &inputs, &text, &task_outputs).await?;
                reasoning_trace.push(format!(
                    "{}: {} answered ({} chars, {} schema issue(s))",
                    task.kind().to_string().to_uppercase(),
                    agent.role(),
                    raw.len(),
                    issues.len()
                ));
                (raw, issues)
            };

            task_outputs.push(TaskOutput {
                task: task.name().to_string(),
                kind: task.kind(),
                agent: agent.role(),
                status: TaskStatus::Completed,
                raw,
                schema_issues,
                execution_time_ms: task_start.elapsed().as_millis() as u64,
            });
        }

        let verification = verification.ok_or_else(|| {
            AnalyzerError::ExecutionError("crew finished without verification".to_string())
        })?;
        let document = run.document.ok_or_else(|| {
            AnalyzerError::ExecutionError("crew finished without reading the document".to_string())
        })?;

        reasoning_trace.push("COMPLETE: Report assembled".to_string());

        info!(
            run_id = %run_id,
            verdict = %verification.verdict,
            completed = task_outputs.iter().filter(|o| o.status == TaskStatus::Completed).count(),
            "Crew: run complete"
        );

        Ok(AnalysisReport {
            run_id,
            file_path: inputs.file_path,
            query: inputs.query,
            document_hash: document.content_hash,
            page_count: document.page_count,
            verification,
            task_outputs,
            reasoning_trace,
            created_at: Utc::now(),
            execution_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Run the task's tools in order and return the text the agent works on
    async fn run_tools(&self, task: &TaskConfig, inputs: &CrewInputs, run: &mut RunState) -> Result<String> {
        let mut text = run
            .document
            .as_ref()
            .map(|d| d.text.clone())
            .unwrap_or_default();

        for tool_name in task.tools() {
            let data = match run.tool_outputs.get(tool_name) {
                Some(cached) => {
                    debug!(tool = %tool_name, "Reusing tool output");
                    cached.clone()
                }
                None => {
                    let tool = self
                        .registry
                        .get(tool_name)
                        .ok_or_else(|| AnalyzerError::ToolNotFound(tool_name.clone()))?;

                    let input = ToolInput {
                        tool_name: tool_name.clone(),
                        parameters: json!({
                            "file_path": inputs.file_path.display().to_string(),
                            "query": inputs.query,
                            "text": text,
                        }),
                    };

                    let output = tool.execute(&input).await?;
                    run.tool_outputs.insert(tool_name.clone(), output.data.clone());
                    output.data
                }
            };

            if tool_name == READ_DOCUMENT_TOOL {
                let document: NormalizedDocument = serde_json::from_value(data)?;
                text = document.text.clone();
                run.document = Some(document);
            } else if let Some(prepared) = data.get("text").and_then(Value::as_str) {
                text = prepared.to_string();
            }
        }

        Ok(text)
    }

    /// Prompt the agent, re-asking while the answer misses the output schema
    async fn run_agent(
        &self,
        agent: &AgentConfig,
        task: &TaskConfig,
        inputs: &CrewInputs,
        text: &str,
        context: &[TaskOutput],
    ) -> Result<(String, Vec<String>)> {
        let system_prompt = agent.system_prompt();
        let base_prompt = task.prompt(inputs, text, context);
        let mut prompt = base_prompt.clone();
        let mut answer = String::new();
        let mut issues = Vec::new();

        for attempt in 1..=agent.max_iterations() {
            answer = self.model.generate(&system_prompt, &prompt).await?;
            issues = task.output().check(&answer);

            if issues.is_empty() {
                break;
            }

            warn!(
                task = %task.name(),
                attempt,
                max_iterations = agent.max_iterations(),
                ?issues,
                "Answer does not match output schema"
            );

            prompt = format!(
                "{}\nYOUR PREVIOUS ANSWER WAS INCOMPLETE:\n- {}\nAnswer again and include every expected item.\n",
                base_prompt,
                issues.join("\n- ")
            );
        }

        Ok((answer, issues))
    }
}

#[derive(Default)]
struct RunState {
    document: Option<NormalizedDocument>,
    tool_outputs: HashMap<String, Value>,
}

fn validate_tasks(
    tasks: &[TaskConfig],
    agents: &HashMap<AgentRole, AgentConfig>,
    registry: &ToolRegistry,
) -> Result<()> {
    let first = tasks
        .first()
        .ok_or_else(|| AnalyzerError::InvalidCrew("crew needs at least one task".to_string()))?;

    if first.kind() != TaskKind::Verification {
        return Err(AnalyzerError::InvalidCrew(
            "the first task must be the verification task".to_string(),
        ));
    }
    if !first.tools().iter().any(|t| t == READ_DOCUMENT_TOOL) {
        return Err(AnalyzerError::InvalidCrew(format!(
            "verification task must use {}",
            READ_DOCUMENT_TOOL
        )));
    }

    let mut names = HashSet::new();
    for (index, task) in tasks.iter().enumerate() {
        if index > 0 && task.kind() == TaskKind::Verification {
            return Err(AnalyzerError::InvalidCrew(format!(
                "{}: only one verification task is allowed",
                task.name()
            )));
        }
        if !names.insert(task.name()) {
            return Err(AnalyzerError::InvalidCrew(format!("duplicate task: {}", task.name())));
        }

        let agent = agents.get(&task.agent()).ok_or_else(|| {
            AnalyzerError::InvalidCrew(format!("{}: no agent for role {}", task.name(), task.agent()))
        })?;

        for tool in task.tools() {
            if !registry.contains(tool) {
                return Err(AnalyzerError::InvalidCrew(format!(
                    "{}: tool {} is not registered",
                    task.name(),
                    tool
                )));
            }
            if !agent.permits_tool(tool) {
                return Err(AnalyzerError::InvalidCrew(format!(
                    "{}: {} may not use {}",
                    task.name(),
                    agent.role(),
                    tool
                )));
            }
        }
    }

    Ok(())
}
