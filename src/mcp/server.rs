use std::sync::Arc;

use rmcp::{
  handler::server::{tool::ToolRouter, wrapper::Parameters},
  model::*,
  schemars, tool, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::ToolDispatcher;

// Parameter structs for tool inputs. Filter/rule shapes are open JSON by
// design (the whitelist, not the schema, constrains them), so they stay
// loosely typed here and are validated by the dispatcher.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SelectToolParams {
  /// Whitelisted table name (one of the five universal tables)
  pub table: String,
  /// Columns to select; '*' or whitelisted column names
  pub columns: Option<Vec<String>>,
  /// Filter map: key -> bare value (eq) or operator object
  pub filters: Option<Value>,
  /// Order-by entries: [{column, direction}]
  pub order_by: Option<Value>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
  /// Embed flags: lines_for_transactions, entity_dynamic_data, display_labels
  pub embed: Option<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReportToolParams {
  /// Versioned report code, e.g. HERA.REPORT.SALES.DAILY.v1
  pub report_code: String,
  /// Named report parameters, matched by declared name
  pub params: Option<Value>,
  /// Output format: json (default) or csv
  pub format: Option<String>,
  pub display_labels: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LabelsToolParams {
  /// Locale to reduce labels to; falls back to "default"
  pub locale: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PreviewToolParams {
  /// Configuration key the candidate rules belong to
  pub config_key: String,
  /// Candidate rule set to test
  pub test_rules: Value,
  /// Sample contexts to resolve against
  pub test_contexts: Value,
  /// Diff against the rules currently stored for the organization
  pub compare_current: Option<bool>,
}

#[derive(Clone)]
pub struct McpServer {
  dispatcher: Arc<ToolDispatcher>,
  #[allow(dead_code)] // Used by #[tool_router] macro
  tool_router: ToolRouter<Self>,
}

fn envelope_result(envelope: Value) -> Result<CallToolResult, McpError> {
  Ok(CallToolResult::success(vec![Content::text(
    serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string()),
  )]))
}

fn to_params<T: serde::Serialize>(params: &T) -> Value {
  serde_json::to_value(params).unwrap_or_default()
}

#[tool_router]
impl McpServer {
  pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
    Self {
      dispatcher,
      tool_router: Self::tool_router(),
    }
  }

  #[tool(
    name = "hera.select",
    description = "Whitelisted, organization-scoped select over the universal tables"
  )]
  async fn select(
    &self,
    params: Parameters<SelectToolParams>,
  ) -> Result<CallToolResult, McpError> {
    let p = params.0;
    let mut obj = serde_json::Map::new();
    obj.insert("table".into(), Value::String(p.table));
    if let Some(columns) = p.columns {
      obj.insert("columns".into(), to_params(&columns));
    }
    if let Some(filters) = p.filters {
      obj.insert("filters".into(), filters);
    }
    if let Some(order_by) = p.order_by {
      obj.insert("order_by".into(), order_by);
    }
    if let Some(limit) = p.limit {
      obj.insert("limit".into(), Value::from(limit));
    }
    if let Some(offset) = p.offset {
      obj.insert("offset".into(), Value::from(offset));
    }
    if let Some(embed) = p.embed {
      obj.insert("embed".into(), embed);
    }
    envelope_result(self.dispatcher.dispatch("hera.select", Value::Object(obj)).await)
  }

  #[tool(
    name = "hera.report.run",
    description = "Run a cataloged, organization-scoped report (json or csv)"
  )]
  async fn report_run(
    &self,
    params: Parameters<ReportToolParams>,
  ) -> Result<CallToolResult, McpError> {
    let p = params.0;
    let mut obj = serde_json::Map::new();
    obj.insert("report_code".into(), Value::String(p.report_code));
    if let Some(report_params) = p.params {
      obj.insert("params".into(), report_params);
    }
    if let Some(format) = p.format {
      obj.insert("format".into(), Value::String(format));
    }
    if let Some(display_labels) = p.display_labels {
      obj.insert("display_labels".into(), Value::Bool(display_labels));
    }
    envelope_result(
      self
        .dispatcher
        .dispatch("hera.report.run", Value::Object(obj))
        .await,
    )
  }

  #[tool(
    name = "hera.labels.get",
    description = "Fetch the organization's display-label catalog"
  )]
  async fn labels_get(
    &self,
    params: Parameters<LabelsToolParams>,
  ) -> Result<CallToolResult, McpError> {
    let mut obj = serde_json::Map::new();
    if let Some(locale) = params.0.locale {
      obj.insert("locale".into(), Value::String(locale));
    }
    envelope_result(
      self
        .dispatcher
        .dispatch("hera.labels.get", Value::Object(obj))
        .await,
    )
  }

  #[tool(
    name = "hera.config.preview",
    description = "Test candidate configuration rules against sample contexts"
  )]
  async fn config_preview(
    &self,
    params: Parameters<PreviewToolParams>,
  ) -> Result<CallToolResult, McpError> {
    let p = params.0;
    let mut obj = serde_json::Map::new();
    obj.insert("config_key".into(), Value::String(p.config_key));
    obj.insert("test_rules".into(), p.test_rules);
    obj.insert("test_contexts".into(), p.test_contexts);
    if let Some(compare_current) = p.compare_current {
      obj.insert("compare_current".into(), Value::Bool(compare_current));
    }
    envelope_result(
      self
        .dispatcher
        .dispatch("hera.config.preview", Value::Object(obj))
        .await,
    )
  }
}

impl ServerHandler for McpServer {
  fn get_info(&self) -> ServerInfo {
    ServerInfo {
      protocol_version: ProtocolVersion::LATEST,
      capabilities: ServerCapabilities::builder().enable_tools().build(),
      server_info: Implementation {
        name: "hera-mcp".into(),
        title: Some("HERA Data Tools".into()),
        version: env!("CARGO_PKG_VERSION").into(),
        icons: None,
        website_url: None,
      },
      instructions: Some(
        "HERA universal-table data tools. All queries are read-only and scoped to the \
         server-configured organization. Use hera.select for whitelisted table access, \
         hera.report.run for cataloged reports, hera.labels.get for display labels, \
         hera.config.preview to test configuration rules."
          .into(),
      ),
    }
  }
}

impl McpServer {
  /// Run MCP server over stdio transport
  pub async fn run_stdio(dispatcher: Arc<ToolDispatcher>) -> Result<(), anyhow::Error> {
    let server = Self::new(dispatcher);
    let transport = rmcp::transport::stdio();
    let service = server.serve(transport).await?;
    service.waiting().await?;
    Ok(())
  }

  /// Run MCP server over streamable HTTP transport
  pub async fn run_http(addr: &str, dispatcher: Arc<ToolDispatcher>) -> Result<(), anyhow::Error> {
    use axum::Router;
    use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
    use rmcp::transport::{StreamableHttpServerConfig, StreamableHttpService};
    use std::net::SocketAddr;

    let addr: SocketAddr = addr.parse()?;

    let config = StreamableHttpServerConfig::default();
    let session_manager = Arc::new(LocalSessionManager::default());

    let service = StreamableHttpService::new(
      move || Ok(McpServer::new(dispatcher.clone())),
      session_manager,
      config,
    );

    let app = Router::new().route("/mcp", axum::routing::any_service(service));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP streamable HTTP listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
  }
}
