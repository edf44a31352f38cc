use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Caller input for `hera.select`. Everything here is untrusted and is
/// validated or clamped against the whitelist before any SQL is produced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectParams {
  pub table: String,
  #[serde(default)]
  pub columns: Option<Vec<String>>,
  /// Map of filter key -> bare scalar (implies eq) or operator map.
  #[serde(default)]
  pub filters: Option<BTreeMap<String, Value>>,
  #[serde(default)]
  pub order_by: Option<Vec<OrderBy>>,
  #[serde(default)]
  pub limit: Option<i64>,
  #[serde(default)]
  pub offset: Option<i64>,
  #[serde(default)]
  pub embed: Option<EmbedFlags>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderBy {
  pub column: String,
  #[serde(default)]
  pub direction: Option<String>,
}

/// Flag-gated follow-up enrichment of the primary result.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EmbedFlags {
  #[serde(default)]
  pub lines_for_transactions: bool,
  #[serde(default)]
  pub entity_dynamic_data: bool,
  #[serde(default)]
  pub display_labels: bool,
}

/// A compiled, parameterized select. Immutable once built; consumed exactly
/// once. Parameter 1 is always the trusted organization id.
#[derive(Debug, Clone)]
pub struct CompiledSelect {
  pub table: String,
  pub sql: String,
  pub params: Vec<Value>,
  pub limit: i64,
  pub offset: i64,
  pub allowed_columns: Vec<String>,
  pub allowed_filters: Vec<String>,
}

/// Response metadata echoed to the caller for observability. `allowed_columns`
/// and `allowed_filters` let callers detect silently dropped inputs.
#[derive(Debug, Clone, Serialize)]
pub struct SelectMeta {
  pub count: usize,
  pub limit: i64,
  pub offset: i64,
  pub duration_ms: u64,
  pub sql: String,
  pub allowed_columns: Vec<String>,
  pub allowed_filters: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_labels: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectResponse {
  pub exit_code: i32,
  pub rows: Vec<Value>,
  pub meta: SelectMeta,
}
