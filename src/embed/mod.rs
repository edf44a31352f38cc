//! Result post-processing: flag-gated follow-up queries that enrich a primary
//! result set with related rows.
//!
//! Every follow-up binds the same trusted organization parameter as the
//! primary query, so embeds cannot escape tenant isolation. Zero related rows
//! is a normal success, never an error.

mod dynamic;

pub use dynamic::DynamicValue;

use serde_json::{json, Map, Value};

use crate::context::TrustedOrgId;
use crate::db::Db;
use crate::error::HeraError;

/// Collect the `id` of every primary row, skipping rows without one.
fn row_ids(rows: &[Value]) -> Vec<Value> {
  rows
    .iter()
    .filter_map(|r| r.get("id"))
    .filter(|id| !id.is_null())
    .cloned()
    .collect()
}

/// `$start .. $start+n-1` placeholder list for an expanded IN clause.
fn placeholders(start: usize, n: usize) -> String {
  (start..start + n)
    .map(|i| format!("${}", i))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Nest `universal_transaction_lines` onto their parent transactions.
/// Rows without an id are left untouched; transactions with no lines get an
/// empty `lines` array.
pub async fn attach_transaction_lines(
  db: &Db,
  org: &TrustedOrgId,
  rows: &mut [Value],
) -> Result<(), HeraError> {
  let ids = row_ids(rows);
  if ids.is_empty() {
    return Ok(());
  }

  let sql = format!(
    "SELECT * FROM universal_transaction_lines \
     WHERE organization_id = $1 AND transaction_id IN ({}) \
     ORDER BY transaction_id, line_number",
    placeholders(2, ids.len())
  );
  let mut params = vec![Value::String(org.as_str().to_string())];
  params.extend(ids);

  let output = db.query_json(&sql, &params).await?;

  for row in rows.iter_mut() {
    let Some(id) = row.get("id").cloned() else {
      continue;
    };
    let lines: Vec<Value> = output
      .rows
      .iter()
      .filter(|line| line.get("transaction_id") == Some(&id))
      .cloned()
      .collect();
    if let Some(obj) = row.as_object_mut() {
      obj.insert("lines".to_string(), Value::Array(lines));
    }
  }
  Ok(())
}

/// Flatten `core_dynamic_data` onto entity rows as a `dynamic_data` map.
/// Entities with no dynamic rows get an empty map. Only meaningful when the
/// primary table was `core_entities`; the engine guards that.
pub async fn attach_entity_dynamic_data(
  db: &Db,
  org: &TrustedOrgId,
  rows: &mut [Value],
) -> Result<(), HeraError> {
  let ids = row_ids(rows);
  if ids.is_empty() {
    return Ok(());
  }

  let sql = format!(
    "SELECT entity_id, field_name, value_type, value_text, value_number, \
     value_boolean, value_date, value_json \
     FROM core_dynamic_data WHERE organization_id = $1 AND entity_id IN ({})",
    placeholders(2, ids.len())
  );
  let mut params = vec![Value::String(org.as_str().to_string())];
  params.extend(ids);

  let output = db.query_json(&sql, &params).await?;

  for row in rows.iter_mut() {
    let Some(id) = row.get("id").cloned() else {
      continue;
    };
    let mut flat = Map::new();
    for dyn_row in &output.rows {
      if dyn_row.get("entity_id") != Some(&id) {
        continue;
      }
      let Some(field) = dyn_row.get("field_name").and_then(Value::as_str) else {
        continue;
      };
      flat.insert(
        field.to_string(),
        DynamicValue::from_row(dyn_row)?.into_json(),
      );
    }
    if let Some(obj) = row.as_object_mut() {
      obj.insert("dynamic_data".to_string(), Value::Object(flat));
    }
  }
  Ok(())
}

/// Fetch the organization's display-label catalog:
/// `entity_type_code -> locale -> {singular, plural}`.
///
/// Organization-global, not tied to the primary row set. Labels live on
/// entities targeted by active `DISPLAY_LABEL_FOR_TYPE` relationships.
pub async fn fetch_display_labels(db: &Db, org: &TrustedOrgId) -> Result<Value, HeraError> {
  let sql = "SELECT r.relationship_data, e.entity_code, e.entity_name, e.metadata \
             FROM core_relationships r \
             JOIN core_entities e ON e.id = r.to_entity_id \
               AND e.organization_id = r.organization_id \
             WHERE r.organization_id = $1 \
               AND r.relationship_type = 'DISPLAY_LABEL_FOR_TYPE' \
               AND r.is_active = true";
  let params = vec![Value::String(org.as_str().to_string())];
  let output = db.query_json(sql, &params).await?;

  let mut labels = Map::new();
  for row in &output.rows {
    let data = row.get("relationship_data").cloned().unwrap_or(Value::Null);
    let type_code = data
      .get("entity_type")
      .and_then(Value::as_str)
      .or_else(|| row.get("entity_code").and_then(Value::as_str))
      .unwrap_or_default()
      .to_string();
    if type_code.is_empty() {
      continue;
    }
    let locale = data
      .get("locale")
      .and_then(Value::as_str)
      .unwrap_or("default")
      .to_string();

    let metadata = row.get("metadata").cloned().unwrap_or(Value::Null);
    let singular = metadata
      .get("singular")
      .and_then(Value::as_str)
      .or_else(|| row.get("entity_name").and_then(Value::as_str))
      .unwrap_or_default();
    let plural = metadata
      .get("plural")
      .and_then(Value::as_str)
      .unwrap_or(singular);

    labels
      .entry(type_code)
      .or_insert_with(|| Value::Object(Map::new()))
      .as_object_mut()
      .expect("label entry is an object")
      .insert(locale, json!({"singular": singular, "plural": plural}));
  }
  Ok(Value::Object(labels))
}

/// Reduce the full label catalog to one locale, falling back to "default".
pub fn labels_for_locale(labels: &Value, locale: &str) -> Value {
  let Some(by_type) = labels.as_object() else {
    return json!({});
  };
  let mut out = Map::new();
  for (type_code, locales) in by_type {
    let picked = locales
      .get(locale)
      .or_else(|| locales.get("default"))
      .cloned();
    if let Some(entry) = picked {
      out.insert(type_code.clone(), entry);
    }
  }
  Value::Object(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholders_are_sequential() {
    assert_eq!(placeholders(2, 3), "$2, $3, $4");
  }

  #[test]
  fn row_ids_skip_missing_and_null() {
    let rows = vec![
      json!({"id": "a"}),
      json!({"name": "no id"}),
      json!({"id": null}),
      json!({"id": "b"}),
    ];
    assert_eq!(row_ids(&rows), vec![json!("a"), json!("b")]);
  }

  #[test]
  fn locale_reduction_falls_back_to_default() {
    let labels = json!({
      "CUSTOMER": {
        "default": {"singular": "Customer", "plural": "Customers"},
        "de": {"singular": "Kunde", "plural": "Kunden"}
      },
      "APPOINTMENT": {
        "default": {"singular": "Appointment", "plural": "Appointments"}
      }
    });
    let de = labels_for_locale(&labels, "de");
    assert_eq!(de["CUSTOMER"]["singular"], "Kunde");
    assert_eq!(de["APPOINTMENT"]["singular"], "Appointment");
  }
}
