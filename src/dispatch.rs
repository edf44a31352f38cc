//! Thin RPC surface mapping tool names to handlers.
//!
//! The dispatcher resolves the organization context once at construction from
//! server-trusted configuration; caller params never carry an organization id.
//! Every handler failure is normalized into a uniform JSON envelope; nothing
//! throws past this layer.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::TrustedOrgId;
use crate::db::Db;
use crate::error::HeraError;
use crate::query::run_select;
use crate::report::{run_report, ReportRegistry};
use crate::rules::run_preview;
use crate::types::{ReportParams, SelectParams};
use crate::{embed, rules};

/// Tool names served by the dispatcher.
pub const TOOLS: &[&str] = &[
  "hera.select",
  "hera.report.run",
  "hera.labels.get",
  "hera.config.preview",
];

#[derive(Debug, Clone, Default, Deserialize)]
struct LabelsParams {
  #[serde(default)]
  locale: Option<String>,
}

pub struct ToolDispatcher {
  db: Db,
  org: TrustedOrgId,
  reports: ReportRegistry,
}

impl ToolDispatcher {
  pub fn new(db: Db, org: TrustedOrgId) -> Self {
    Self {
      db,
      org,
      reports: ReportRegistry::builtin(),
    }
  }

  /// Swap the report catalog; used to serve a tenant-specific catalog.
  pub fn with_reports(mut self, reports: ReportRegistry) -> Self {
    self.reports = reports;
    self
  }

  pub fn org(&self) -> &TrustedOrgId {
    &self.org
  }

  /// Dispatch one tool call, returning the uniform envelope.
  ///
  /// Success envelopes carry `exit_code: 0`; failures `exit_code: 1` and an
  /// `error` message. An unknown tool returns `{error, tools}` with no
  /// `exit_code` key, so callers check `error` first.
  pub async fn dispatch(&self, tool: &str, params: Value) -> Value {
    let result = match tool {
      "hera.select" => self.select(params).await,
      "hera.report.run" => self.report_run(params).await,
      "hera.labels.get" => self.labels_get(params).await,
      "hera.config.preview" => self.config_preview(params).await,
      _ => {
        return json!({"error": "UNKNOWN_TOOL", "tools": TOOLS});
      }
    };
    match result {
      Ok(value) => value,
      Err(e) => {
        tracing::warn!(tool, error = %e, "tool call failed");
        json!({"exit_code": 1, "error": e.to_string()})
      }
    }
  }

  fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, HeraError> {
    serde_json::from_value(params)
      .map_err(|e| HeraError::ParamBind(format!("invalid tool params: {}", e)))
  }

  async fn select(&self, params: Value) -> Result<Value, HeraError> {
    let request: SelectParams = Self::parse(params)?;
    let response = run_select(&self.db, &self.org, &request).await?;
    Ok(serde_json::to_value(response).unwrap_or_default())
  }

  async fn report_run(&self, params: Value) -> Result<Value, HeraError> {
    let request: ReportParams = Self::parse(params)?;
    let response = run_report(&self.db, &self.org, &self.reports, &request).await?;
    Ok(serde_json::to_value(response).unwrap_or_default())
  }

  async fn labels_get(&self, params: Value) -> Result<Value, HeraError> {
    let request: LabelsParams = Self::parse(params)?;
    let labels = embed::fetch_display_labels(&self.db, &self.org).await?;
    Ok(match request.locale {
      Some(locale) => json!({
        "exit_code": 0,
        "labels": embed::labels_for_locale(&labels, &locale),
        "locale": locale,
      }),
      None => json!({"exit_code": 0, "labels": labels}),
    })
  }

  async fn config_preview(&self, params: Value) -> Result<Value, HeraError> {
    let request: rules::PreviewParams = Self::parse(params)?;
    let response = run_preview(&self.db, &self.org, &request).await?;
    Ok(serde_json::to_value(response).unwrap_or_default())
  }
}
