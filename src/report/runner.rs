use serde_json::Value;
use std::collections::BTreeMap;

use crate::context::TrustedOrgId;
use crate::db::Db;
use crate::embed;
use crate::error::HeraError;
use crate::types::{ReportExplain, ReportFormat, ReportMeta, ReportParams, ReportResponse};

use super::csv::to_csv;
use super::registry::{is_safe_select, ReportDef, ReportRegistry};

/// Build the positional parameter list: `[org_id, params by declared name]`.
///
/// Caller values are matched by the report's declared names, never by the key
/// order of the input object; a missing name binds NULL.
pub fn bind_report_params(
  def: &ReportDef,
  org: &TrustedOrgId,
  supplied: Option<&BTreeMap<String, Value>>,
) -> Vec<Value> {
  let mut params = Vec::with_capacity(def.params.len() + 1);
  params.push(Value::String(org.as_str().to_string()));
  for name in &def.params {
    params.push(
      supplied
        .and_then(|m| m.get(name))
        .cloned()
        .unwrap_or(Value::Null),
    );
  }
  params
}

/// Execute a report from the given registry.
///
/// The template is re-validated on every call even though the catalog is
/// static: a template failing the gate is an operator-side integrity failure
/// and must never reach the database.
pub async fn run_report(
  db: &Db,
  org: &TrustedOrgId,
  registry: &ReportRegistry,
  request: &ReportParams,
) -> Result<ReportResponse, HeraError> {
  let def = registry
    .lookup(&request.report_code)
    .ok_or_else(|| HeraError::ReportNotFound(request.report_code.clone()))?;

  if !is_safe_select(&def.sql) || !def.sql.contains("organization_id = $1") {
    return Err(HeraError::ReportUnsafeSql(def.code.clone()));
  }

  let params = bind_report_params(def, org, request.params.as_ref());
  let output = db.query_json(&def.sql, &params).await?;

  let display_labels = if request.display_labels {
    Some(embed::fetch_display_labels(db, org).await?)
  } else {
    None
  };

  let format = request.format.unwrap_or_default();
  let row_count = output.rows.len();
  let data = match format {
    ReportFormat::Json => Value::Array(output.rows),
    ReportFormat::Csv => Value::String(to_csv(&output.columns, &output.rows)),
  };

  tracing::info!(report = %def.code, rows = row_count, ?format, "report executed");

  Ok(ReportResponse {
    exit_code: 0,
    format,
    data,
    meta: ReportMeta {
      rows: row_count,
      display_labels,
    },
    explain: ReportExplain {
      sql: def.sql.clone(),
      params,
    },
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::registry::catalog;
  use serde_json::json;

  #[test]
  fn params_bound_by_declared_order_not_key_order() {
    let def = catalog().lookup("HERA.REPORT.SALES.TOP_ITEMS.v1").unwrap();
    let org = TrustedOrgId::for_tests("org-1");
    // Keys intentionally supplied out of declared order
    let supplied = BTreeMap::from([
      ("limit".to_string(), json!(10)),
      ("to".to_string(), json!("2024-01-31")),
      ("from".to_string(), json!("2024-01-01")),
    ]);
    let params = bind_report_params(def, &org, Some(&supplied));
    assert_eq!(
      params,
      vec![json!("org-1"), json!("2024-01-01"), json!("2024-01-31"), json!(10)]
    );
  }

  #[test]
  fn missing_declared_param_binds_null() {
    let def = catalog().lookup("HERA.REPORT.SALES.DAILY.v1").unwrap();
    let org = TrustedOrgId::for_tests("org-1");
    let params = bind_report_params(def, &org, None);
    assert_eq!(params, vec![json!("org-1"), Value::Null, Value::Null]);
  }
}
