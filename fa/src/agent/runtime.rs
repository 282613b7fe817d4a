//! AgentRuntime - the orchestrator
//!
//! One `execute` call walks: plan, run tools, format context, context-lock
//! gate, exemplar selection, prompt assembly, inference with fallback,
//! extraction and validation. Every path ends in exactly one `AgentResponse`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use docstore::{DocStore, DocumentIndex};
use eyre::{Context, Result};
use futures::future::join_all;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use super::context::{format_context, is_grounded};
use super::extract::validate_output;
use super::inference::{InferenceOutcome, infer};
use super::planner::{DefaultPlanner, Planner};
use crate::config::{AgentConfig, Config};
use crate::domain::{AgentResponse, EvidenceDocument, FailureKind, RefusalReason};
use crate::golden::GoldenExamples;
use crate::llm::{Backends, CompletionRequest};
use crate::prompts::{PromptLoader, SystemPromptContext, UserPromptContext};
use crate::tools::builtin::{ConstrainedSearchTool, FetchTool, RetrieverTool, SearchEngine, WebSearchEngine};
use crate::tools::{DomainAllowList, ToolError, ToolRegistry, ToolResult, ToolStatus};

/// Message returned with `DATA_NOT_AVAILABLE`
pub const NO_EVIDENCE_MESSAGE: &str =
    "No verified evidence was found for this query; refusing to answer from model knowledge.";

/// Per-query knobs
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Documents requested from retrieval
    pub top_k: usize,
    /// Output token budget per inference call
    pub max_output_tokens: u32,
    /// Sampling temperature (0 for deterministic output)
    pub temperature: f32,
    /// Upper bound for any single tool invocation
    pub tool_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

impl AgentSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            top_k: config.top_k.max(1),
            max_output_tokens: config.max_output_tokens,
            temperature: 0.0,
            tool_timeout: Duration::from_millis(config.tool_timeout_ms),
        }
    }
}

/// The orchestrator
pub struct AgentRuntime {
    registry: ToolRegistry,
    planner: Box<dyn Planner>,
    golden: Arc<GoldenExamples>,
    prompts: PromptLoader,
    backends: Backends,
    rng: Mutex<StdRng>,
    settings: AgentSettings,
}

impl AgentRuntime {
    pub fn new(registry: ToolRegistry, golden: Arc<GoldenExamples>, backends: Backends, settings: AgentSettings) -> Self {
        debug!(tools = ?registry.tool_names(), ?backends, ?settings, "AgentRuntime::new: called");
        Self {
            registry,
            planner: Box::new(DefaultPlanner),
            golden,
            prompts: PromptLoader::embedded_only(),
            backends,
            rng: Mutex::new(StdRng::from_os_rng()),
            settings,
        }
    }

    /// Wire up tools, golden examples, prompts and backends from configuration
    ///
    /// Fails only on genuine misconfiguration: an unreadable index, a malformed
    /// golden file, an unknown provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        debug!("AgentRuntime::from_config: called");
        let settings = AgentSettings::from_config(&config.agent);

        let index = DocStore::open(&config.retrieval.index_dir).context(format!(
            "Failed to open document index at {}",
            config.retrieval.index_dir.display()
        ))?;
        info!(path = %config.retrieval.index_dir.display(), documents = index.len(), "Opened document index");

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(RetrieverTool::new(Arc::new(index), settings.top_k)));

        let allowlist = DomainAllowList::new(&config.fetch.allowed_domains);
        let fetcher = Arc::new(FetchTool::new(allowlist, &config.fetch).context("Failed to build fetch tool")?);
        registry.register(fetcher.clone());

        match WebSearchEngine::from_env(Duration::from_millis(config.search.timeout_ms))
            .context("Failed to build search engine")?
        {
            Some(engine) => {
                info!(engine = engine.name(), "Web search enabled");
                registry.register(Arc::new(ConstrainedSearchTool::new(Arc::new(engine), fetcher, &config.search)));
            }
            None => info!("Web search disabled: no search API key set"),
        }

        let golden = Arc::new(GoldenExamples::load(config.golden_path())?);
        let backends = Backends::from_config(config).context("Failed to configure inference backends")?;

        Ok(Self::new(registry, golden, backends, settings).with_prompts(PromptLoader::new(config.prompts_dir.as_deref())))
    }

    pub fn with_planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = prompts;
        self
    }

    /// Fix the exemplar RNG, for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Ordered tool names for a query
    pub fn plan(&self, query: &str) -> Vec<String> {
        self.planner.plan(query, &self.registry)
    }

    /// Run every planned tool and collect usable evidence in plan order
    ///
    /// Tools run concurrently, each under the tool timeout. A tool that fails,
    /// warns or times out contributes nothing and never cancels the others.
    pub async fn gather_evidence(&self, query: &str) -> Vec<EvidenceDocument> {
        let plan = self.plan(query);
        debug!(?plan, "gather_evidence: called");

        let timeout = self.settings.tool_timeout;
        let runs = plan.iter().map(|name| async move {
            match tokio::time::timeout(timeout, self.registry.run(name, query)).await {
                Ok(result) => result,
                Err(_) => ToolResult::from(ToolError::Timeout {
                    name: name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
            }
        });
        let results = join_all(runs).await;

        let mut evidence = Vec::new();
        for (name, result) in plan.iter().zip(results) {
            match result.status {
                ToolStatus::Success => {
                    debug!(tool = %name, documents = result.documents.len(), "gather_evidence: tool succeeded");
                }
                ToolStatus::Warning => {
                    warn!(tool = %name, message = ?result.message, "Tool returned a warning; its output is not used");
                }
                ToolStatus::Error => {
                    warn!(tool = %name, message = ?result.message, "Tool failed");
                }
            }
            evidence.extend(result.into_evidence());
        }
        evidence
    }

    /// Answer a query
    pub async fn execute(&self, query: &str) -> AgentResponse {
        let query = query.trim();
        if query.is_empty() {
            info!("Refusing empty query");
            return AgentResponse::refusal(RefusalReason::EmptyQuery, "Query is empty.");
        }
        info!(%query, "Executing query");

        let evidence = self.gather_evidence(query).await;
        let context = format_context(&evidence);
        if !is_grounded(&context) {
            info!(%query, "No evidence gathered, refusing");
            return AgentResponse::refusal(RefusalReason::DataNotAvailable, NO_EVIDENCE_MESSAGE);
        }
        debug!(documents = evidence.len(), context_len = context.len(), "execute: context passed gate");

        let request = match self.build_request(query, context) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "Failed to assemble prompt");
                return AgentResponse::failure(FailureKind::InferenceFailed, format!("Prompt assembly failed: {:#}", e));
            }
        };

        let response = match infer(&self.backends, &request).await {
            InferenceOutcome::Completed { text, backend } => {
                debug!(%backend, len = text.len(), "execute: validating output");
                validate_output(&text)
            }
            InferenceOutcome::Failed { error, detail } => AgentResponse::failure(error, detail),
        };

        info!(success = response.is_success(), "Query finished");
        response
    }

    /// System prompt with a cross-domain exemplar, user prompt with the context
    fn build_request(&self, query: &str, context: String) -> Result<CompletionRequest> {
        let exemplar = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.golden.select_exemplar(query, &mut *rng)
        };
        debug!(crop = %exemplar.crop_label, "build_request: exemplar selected");

        let system = self.prompts.system_prompt(&SystemPromptContext::from_exemplar(exemplar)?)?;
        let user = self.prompts.user_prompt(&UserPromptContext {
            context,
            query: query.to_string(),
        })?;

        Ok(CompletionRequest::new(system, user, self.settings.max_output_tokens)
            .with_temperature(self.settings.temperature)
            .with_json_output(true))
    }
}
