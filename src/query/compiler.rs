//! Whitelist-driven compilation of structured select requests into
//! parameterized SQL.
//!
//! The compiler is pure: it never touches the database. Unknown filter keys,
//! unsupported operators, and malformed order-by entries are dropped rather
//! than rejected; the whitelist echo in the response metadata is how callers
//! detect drops. Hard failures are reserved for requests that cannot produce
//! a meaningful query at all.

use serde_json::Value;

use crate::context::TrustedOrgId;
use crate::error::HeraError;
use crate::types::{CompiledSelect, SelectParams};
use crate::whitelist::{registry, FilterOp, FilterRule};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 1000;

/// Compile a select request against the whitelist registry.
///
/// Parameter 1 of the emitted query is always the trusted organization id;
/// limit/offset are interpolated as clamped integers, never as raw strings.
pub fn build_select(
  request: &SelectParams,
  org: &TrustedOrgId,
) -> Result<CompiledSelect, HeraError> {
  let wl = registry()
    .lookup(&request.table)
    .ok_or_else(|| HeraError::TableNotAllowed(request.table.clone()))?;

  let columns = match &request.columns {
    Some(requested) => {
      let kept: Vec<String> = requested
        .iter()
        .filter(|c| wl.allows_column(c))
        .cloned()
        .collect();
      if kept.is_empty() {
        return Err(HeraError::NoValidColumns(request.table.clone()));
      }
      kept
    }
    None => vec!["*".to_string()],
  };

  let mut params: Vec<Value> = vec![Value::String(org.as_str().to_string())];
  let mut where_parts: Vec<String> = vec!["organization_id = $1".to_string()];

  if let Some(filters) = &request.filters {
    for (key, value) in filters {
      let Some(rule) = wl.filter_rules.get(key.as_str()) else {
        continue; // unknown filter key: dropped, not an error
      };
      compile_filter_value(rule, value, &mut where_parts, &mut params);
    }
  }

  let mut order_parts: Vec<String> = Vec::new();
  if let Some(order_by) = &request.order_by {
    for entry in order_by {
      if entry.column == "*" || !wl.allows_column(&entry.column) {
        continue;
      }
      let dir = match &entry.direction {
        Some(d) if d.eq_ignore_ascii_case("desc") => "DESC",
        _ => "ASC",
      };
      order_parts.push(format!("{} {}", entry.column, dir));
    }
  }

  let limit = request.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
  let offset = request.offset.unwrap_or(0).max(0);

  let mut sql = format!(
    "SELECT {} FROM {} WHERE {}",
    columns.join(", "),
    wl.table,
    where_parts.join(" AND ")
  );
  if !order_parts.is_empty() {
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_parts.join(", "));
  }
  sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));

  Ok(CompiledSelect {
    table: wl.table.to_string(),
    sql,
    params,
    limit,
    offset,
    allowed_columns: wl.allowed_columns.iter().map(|c| c.to_string()).collect(),
    allowed_filters: wl.filter_keys().iter().map(|k| k.to_string()).collect(),
  })
}

/// Expand one filter value into SQL fragments. A bare scalar implies `eq`;
/// an object is an operator map where each recognized, permitted operator
/// contributes one fragment. Everything unrecognized is dropped.
fn compile_filter_value(
  rule: &FilterRule,
  value: &Value,
  where_parts: &mut Vec<String>,
  params: &mut Vec<Value>,
) {
  match value {
    Value::Object(ops) => {
      for (op_key, op_value) in ops {
        let Some(op) = FilterOp::parse(op_key) else {
          continue;
        };
        if !rule.allowed_ops.contains(&op) {
          continue;
        }
        compile_op(rule.target_column, op, op_value, where_parts, params);
      }
    }
    // Bare value: shorthand for {eq: value}
    other => {
      if rule.allowed_ops.contains(&FilterOp::Eq) {
        compile_op(rule.target_column, FilterOp::Eq, other, where_parts, params);
      }
    }
  }
}

fn compile_op(
  column: &str,
  op: FilterOp,
  value: &Value,
  where_parts: &mut Vec<String>,
  params: &mut Vec<Value>,
) {
  match op {
    FilterOp::Eq => {
      params.push(value.clone());
      where_parts.push(format!("{} = ${}", column, params.len()));
    }
    FilterOp::In => {
      let Value::Array(items) = value else {
        return; // in requires an array
      };
      if items.is_empty() {
        // Empty set matches nothing; dropping the fragment would match everything.
        where_parts.push("false".to_string());
        return;
      }
      let mut placeholders = Vec::with_capacity(items.len());
      for item in items {
        params.push(item.clone());
        placeholders.push(format!("${}", params.len()));
      }
      where_parts.push(format!("{} IN ({})", column, placeholders.join(", ")));
    }
    FilterOp::Like => {
      let Value::String(s) = value else {
        return;
      };
      params.push(Value::String(s.clone()));
      where_parts.push(format!("{} LIKE ${}", column, params.len()));
    }
    FilterOp::Gte => {
      params.push(value.clone());
      where_parts.push(format!("{} >= ${}", column, params.len()));
    }
    FilterOp::Lte => {
      params.push(value.clone());
      where_parts.push(format!("{} <= ${}", column, params.len()));
    }
    FilterOp::Between => {
      let Value::Array(pair) = value else {
        return;
      };
      if pair.len() != 2 {
        return; // between requires exactly an ordered pair
      }
      params.push(pair[0].clone());
      let low = params.len();
      params.push(pair[1].clone());
      let high = params.len();
      where_parts.push(format!("{} BETWEEN ${} AND ${}", column, low, high));
    }
    FilterOp::IsNull => {
      let Value::Bool(b) = value else {
        return;
      };
      if *b {
        where_parts.push(format!("{} IS NULL", column));
      } else {
        where_parts.push(format!("{} IS NOT NULL", column));
      }
    }
  }
}
