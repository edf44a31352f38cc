use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller input for `hera.report.run`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportParams {
  pub report_code: String,
  /// Named parameters, matched to the report's declared order by name.
  #[serde(default)]
  pub params: Option<BTreeMap<String, Value>>,
  #[serde(default)]
  pub format: Option<ReportFormat>,
  #[serde(default)]
  pub display_labels: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
  #[default]
  Json,
  Csv,
}

/// Executed SQL and bound parameters, always echoed back so an agent caller
/// can see exactly what ran.
#[derive(Debug, Clone, Serialize)]
pub struct ReportExplain {
  pub sql: String,
  pub params: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
  pub rows: usize,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_labels: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
  pub exit_code: i32,
  pub format: ReportFormat,
  /// JSON rows for `json` format, a single CSV string for `csv`.
  pub data: Value,
  pub meta: ReportMeta,
  pub explain: ReportExplain,
}
