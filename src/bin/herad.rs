use clap::Parser;
use hera_mcp::config::HeraConfig;
use hera_mcp::db::Db;
use hera_mcp::dispatch::ToolDispatcher;
use hera_mcp::mcp::McpServer;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "herad", about = "HERA MCP data-tools server", version)]
struct Args {
  #[arg(long, env = "DATABASE_URL")]
  db_url: Option<String>,
  #[arg(long, env = "HERA_ORG_ID")]
  org_id: Option<String>,
  #[arg(short, long)]
  config: Option<String>,
  /// Serve MCP over stdio (default)
  #[arg(long)]
  stdio: bool,
  /// Serve MCP over streamable HTTP instead of stdio
  #[arg(long)]
  http: bool,
  /// Bind address for --http
  #[arg(long)]
  http_addr: Option<String>,
  #[arg(long)]
  log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
  let args = Args::parse();

  // Load config: explicit path > auto-detect > defaults
  let mut config = if let Some(path) = &args.config {
    HeraConfig::from_file(path)?
  } else {
    HeraConfig::find_and_load()?.unwrap_or_default()
  };

  // CLI args override config file
  if let Some(url) = args.db_url {
    config.database.url = url;
  }
  if let Some(org) = args.org_id {
    config.organization.id = org;
  }
  if let Some(addr) = args.http_addr {
    config.mcp.http_addr = addr;
  }
  if let Some(level) = args.log_level {
    config.logging.level = level;
  }

  // stdio carries the MCP protocol itself, so logs go to stderr
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let org = config.resolve_org()?;
  let db = Db::connect(
    &config.resolve_database_url()?,
    config.database.max_connections,
  )?
  .with_statement_timeout(config.limits.statement_timeout_ms);

  tracing::info!(org = %org, "starting herad");
  let dispatcher = Arc::new(ToolDispatcher::new(db, org));

  if args.http {
    McpServer::run_http(&config.mcp.http_addr, dispatcher).await
  } else {
    McpServer::run_stdio(dispatcher).await
  }
}
