use clap::{Parser, Subcommand};
use hera_mcp::config::HeraConfig;
use hera_mcp::db::Db;
use hera_mcp::dispatch::{ToolDispatcher, TOOLS};
use hera_mcp::smartcode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hera", about = "HERA data-tools client", version)]
struct Args {
  #[arg(long, env = "DATABASE_URL")]
  db_url: Option<String>,
  #[arg(long, env = "HERA_ORG_ID")]
  org_id: Option<String>,
  #[arg(short, long)]
  config: Option<String>,
  #[arg(long, default_value = "warn")]
  log_level: String,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Invoke a tool once and print its JSON envelope
  Call {
    /// Tool name, e.g. hera.select
    tool: String,
    /// Tool parameters as a JSON object
    #[arg(long, default_value = "{}")]
    params: String,
  },
  /// List the available tools
  Tools,
  /// Validate a smart code offline (no database needed)
  Validate {
    code: String,
    /// Use the strict v2 domain dialect instead of the data dialect
    #[arg(long)]
    strict: bool,
  },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
  let args = Args::parse();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.log_level.clone().into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  match args.command {
    Command::Tools => {
      for tool in TOOLS {
        println!("{}", tool);
      }
      Ok(())
    }
    Command::Validate { code, strict } => {
      let validation = if strict {
        smartcode::validate_domain_code(&code)
      } else {
        smartcode::validate_data_code(&code)
      };
      println!("{}", serde_json::to_string_pretty(&validation)?);
      if validation.is_valid {
        Ok(())
      } else {
        std::process::exit(1)
      }
    }
    Command::Call { tool, params } => {
      let mut config = if let Some(path) = &args.config {
        HeraConfig::from_file(path)?
      } else {
        HeraConfig::find_and_load()?.unwrap_or_default()
      };
      if let Some(url) = args.db_url {
        config.database.url = url;
      }
      if let Some(org) = args.org_id {
        config.organization.id = org;
      }

      let org = config.resolve_org()?;
      let db = Db::connect(
        &config.resolve_database_url()?,
        config.database.max_connections,
      )?
      .with_statement_timeout(config.limits.statement_timeout_ms);
      let dispatcher = ToolDispatcher::new(db, org);

      let params: serde_json::Value = serde_json::from_str(&params)?;
      let envelope = dispatcher.dispatch(&tool, params).await;
      println!("{}", serde_json::to_string_pretty(&envelope)?);

      // Mirror the envelope's exit code so shell pipelines can branch on it
      let failed = envelope.get("exit_code").and_then(|v| v.as_i64()) == Some(1)
        || envelope.get("error").is_some();
      if failed {
        std::process::exit(1);
      }
      Ok(())
    }
  }
}
