use std::time::Instant;

use crate::context::TrustedOrgId;
use crate::db::Db;
use crate::embed;
use crate::error::HeraError;
use crate::types::{SelectMeta, SelectParams, SelectResponse};

use super::compiler::build_select;

/// Execute a `hera.select` call: compile, run the primary query, then apply
/// any requested embeds. Either everything succeeds or the whole call fails;
/// embeds that find zero related rows are a valid success.
pub async fn run_select(
  db: &Db,
  org: &TrustedOrgId,
  request: &SelectParams,
) -> Result<SelectResponse, HeraError> {
  let compiled = build_select(request, org)?;

  let start = Instant::now();
  let output = db.query_json(&compiled.sql, &compiled.params).await?;
  let duration_ms = start.elapsed().as_millis() as u64;

  let mut rows = output.rows;
  let flags = request.embed.unwrap_or_default();

  if flags.lines_for_transactions && !rows.is_empty() {
    embed::attach_transaction_lines(db, org, &mut rows).await?;
  }
  // Dynamic-data flattening only applies to entity rows, regardless of the flag.
  if flags.entity_dynamic_data && compiled.table == "core_entities" && !rows.is_empty() {
    embed::attach_entity_dynamic_data(db, org, &mut rows).await?;
  }
  let display_labels = if flags.display_labels {
    Some(embed::fetch_display_labels(db, org).await?)
  } else {
    None
  };

  tracing::info!(
    table = %compiled.table,
    count = rows.len(),
    duration_ms,
    "select executed"
  );

  Ok(SelectResponse {
    exit_code: 0,
    meta: SelectMeta {
      count: rows.len(),
      limit: compiled.limit,
      offset: compiled.offset,
      duration_ms,
      sql: compiled.sql,
      allowed_columns: compiled.allowed_columns,
      allowed_filters: compiled.allowed_filters,
      display_labels,
    },
    rows,
  })
}
