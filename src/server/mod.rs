//! MCP server: exposes `locate`, `context`, `refs`, `read`, `status` as
//! `rmcp` tools over stdio (spec.md §6 "External Interfaces: MCP tools").
//!
//! The tool-registration impl block here is thin by design: each method
//! parses its `Parameters<T>` wrapper, calls into [`handlers`], and wraps
//! the result as [`CallToolResult`] JSON. The actual retrieval/evidence/graph
//! logic lives in `handlers`, independent of `rmcp`, so it can be unit-tested
//! without a transport.

pub mod args;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use rmcp::handler::server::{tool::ToolRouter, wrapper::Parameters};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, transport::stdio, ErrorData as McpError, ServiceExt};

use crate::config::Config;
use crate::domain::ports::EmbeddingProvider;
use crate::embedding;
use crate::retrieval::Retriever;
use crate::store::{self, SqliteStore};

use args::{ContextArgs, LocateArgs, ReadArgs, RefsArgs, StatusArgs};

/// Shared server state: one store/retriever per process, matching the
/// single-repository-per-invocation model of spec.md §3 "Repository"
/// (the `repo` argument on each tool overrides the path but shares the
/// same store instance, which is opened per physical database file).
#[derive(Clone)]
pub struct BcIndexServer {
    config: Arc<Config>,
    store: Arc<SqliteStore>,
    embedding: Arc<dyn EmbeddingProvider>,
    retriever: Arc<Retriever>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl BcIndexServer {
    /// Open the default repository database (the current working directory's
    /// repo, per spec.md §6) and build the retriever stack around it.
    pub fn new(config: Config, repo_root: &Path) -> crate::domain::error::Result<Self> {
        let db_path = match &config.database.path {
            Some(p) => std::path::PathBuf::from(shellexpand::tilde(p).into_owned()),
            None => store::default_db_path(repo_root)?,
        };
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Arc::new(SqliteStore::open(&db_path)?);
        let embedding = embedding::build_provider(&config.embedding)?;
        let retriever = Arc::new(Retriever::new(Arc::clone(&store), Arc::clone(&embedding)));

        Ok(Self {
            config: Arc::new(config),
            store,
            embedding,
            retriever,
            tool_router: Self::tool_router(),
        })
    }

    /// Start serving tool calls over stdio until the peer disconnects.
    pub async fn serve_stdio(self) -> crate::domain::error::Result<()> {
        let service = self
            .serve(stdio())
            .await
            .map_err(|e| crate::domain::error::Error::retrieval(format!("mcp transport: {e}")))?;
        service
            .waiting()
            .await
            .map_err(|e| crate::domain::error::Error::retrieval(format!("mcp transport: {e}")))?;
        Ok(())
    }

    #[tool(description = "Locate symbols by natural-language or keyword query, ranked by a blend of vector similarity, keyword match, and call-graph centrality.")]
    async fn locate(&self, Parameters(args): Parameters<LocateArgs>) -> Result<CallToolResult, McpError> {
        let result = handlers::locate(&self.store, &self.retriever, &self.config.search, args)
            .await
            .map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Assemble a size-budgeted evidence pack (package cards, symbol cards, source snippets) for a query.")]
    async fn context(&self, Parameters(args): Parameters<ContextArgs>) -> Result<CallToolResult, McpError> {
        let result = handlers::context(&self.store, &self.retriever, &self.config.search, &self.config.evidence, args)
            .await
            .map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "List call/implements/imports/references/embeds graph edges touching a symbol, in either direction.")]
    async fn refs(&self, Parameters(args): Parameters<RefsArgs>) -> Result<CallToolResult, McpError> {
        let result = handlers::refs(&self.store, args).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Read source lines by symbol id or an explicit file/line range, with optional surrounding context.")]
    async fn read(&self, Parameters(args): Parameters<ReadArgs>) -> Result<CallToolResult, McpError> {
        let result = handlers::read(&self.store, args).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(description = "Report whether a repository is indexed, how stale the index is, and symbol/package/edge counts.")]
    async fn status(&self, Parameters(args): Parameters<StatusArgs>) -> Result<CallToolResult, McpError> {
        let result = handlers::status(&self.store, args).map_err(to_mcp_error)?;
        json_result(&result)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for BcIndexServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Code context for coding agents, over five tools:\n\
                - locate: find symbols by query\n\
                - context: assemble a budgeted evidence pack for a query\n\
                - refs: list graph edges touching a symbol\n\
                - read: read source lines by symbol or range\n\
                - status: indexing status and staleness\n\n\
                All tools accept an optional `repo` path; it defaults to the \
                repository this server was started against."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn json_result<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn to_mcp_error(err: crate::domain::error::Error) -> McpError {
    use crate::domain::error::Error;
    match &err {
        Error::NotFound { .. } | Error::InvalidArgument { .. } => {
            McpError::invalid_params(err.to_string(), None)
        }
        _ => McpError::internal_error(err.to_string(), None),
    }
}
