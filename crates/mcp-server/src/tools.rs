//! MCP tools for commit hygiene
//!
//! The engine produces a structured `HygieneOutcome`; this layer picks the repository,
//! runs the check, and renders the outcome for the client.

use hygiene_engine::{
    tracker_from_config, CommitCount, GitReader, HygieneConfig, HygieneEngine, IssueTracker,
};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

mod error;
mod render;
mod report_doc;

use error::internal_error;

/// Commit hygiene MCP service
#[derive(Clone)]
pub struct HygieneService {
    /// Immutable for the lifetime of the process
    config: Arc<HygieneConfig>,
    /// Shared tracker client (or the disabled tracker)
    tracker: Arc<dyn IssueTracker>,
    /// Tool router
    tool_router: ToolRouter<Self>,
}

impl HygieneService {
    pub fn new(config: HygieneConfig) -> Self {
        let tracker = tracker_from_config(&config);
        Self {
            config: Arc::new(config),
            tracker,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_handler]
impl ServerHandler for HygieneService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Commit hygiene checks for issue-tracked work. Use 'check_commit_hygiene' to verify that the current branch and recent commits reference issue keys (e.g. ENG-123) and, when LINEAR_API_KEY is configured, that those issues exist and who they are assigned to.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Tool Input Schemas
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CheckCommitHygieneRequest {
    /// Number of recent commits to check (default: 10)
    #[schemars(description = "Number of recent commits to check (clamped to 1-100, default 10)")]
    pub num_commits: Option<i64>,

    /// Repository directory (defaults to the server working directory)
    #[schemars(description = "Repository directory path (defaults to current directory)")]
    pub path: Option<String>,
}

fn resolve_root(raw: Option<&str>) -> Result<PathBuf, String> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => Ok(PathBuf::from(path)),
        None => std::env::current_dir()
            .map_err(|err| format!("Cannot determine working directory: {err}")),
    }
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl HygieneService {
    /// Branch and commit issue-key check with optional tracker verification
    #[tool(description = "Check whether the current branch name and recent commit messages contain issue tracker keys (e.g. ENG-123). If LINEAR_API_KEY is configured, each key is verified against Linear and compared with the authenticated user's assignments.")]
    pub async fn check_commit_hygiene(
        &self,
        Parameters(request): Parameters<CheckCommitHygieneRequest>,
    ) -> Result<CallToolResult, McpError> {
        let count = request
            .num_commits
            .map(CommitCount::clamped)
            .unwrap_or_default();
        log::info!(
            "check_commit_hygiene: scanning last {} commits",
            count.get()
        );

        let root = match resolve_root(request.path.as_deref()) {
            Ok(root) => root,
            Err(message) => return Ok(internal_error(message)),
        };

        let engine = HygieneEngine::new(
            GitReader::new(root, self.config.vcs_timeout),
            Arc::clone(&self.tracker),
        );
        let outcome = engine.check_hygiene(count).await;
        Ok(render::outcome_result(&outcome))
    }
}
