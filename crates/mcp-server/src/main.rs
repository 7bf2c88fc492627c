//! Commit Hygiene MCP Server
//!
//! Checks that the current branch and recent commits reference issue tracker keys, and
//! verifies those keys against Linear when `LINEAR_API_KEY` is configured.
//!
//! ## Tools
//!
//! - `check_commit_hygiene` - Branch + last N commits, issue keys, tracker verification
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "commit-hygiene": {
//!       "command": "hygiene-mcp",
//!       "env": { "LINEAR_API_KEY": "lin_api_..." }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use hygiene_engine::HygieneConfig;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

use tools::HygieneService;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .filter_module("reqwest", log::LevelFilter::Warn)
        .init();

    let config = HygieneConfig::from_env();
    log::info!("Starting commit hygiene MCP server ({config:?})");

    let service = HygieneService::new(config);
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("Commit hygiene MCP server stopped");
    Ok(())
}
