use serde_json::Value;

use crate::error::HeraError;

/// One logical value from a `core_dynamic_data` row.
///
/// The storage row spreads the value over five typed columns selected by
/// `value_type`; this closed sum makes the mapping total. A `value_type`
/// outside the set is an explicit error rather than a silent null, so
/// data-entry mistakes surface instead of disappearing.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
  Text(Option<String>),
  Number(Option<f64>),
  Bool(Option<bool>),
  Date(Option<String>),
  Json(Value),
}

impl DynamicValue {
  /// Select the typed column named by the row's `value_type`.
  pub fn from_row(row: &Value) -> Result<Self, HeraError> {
    let value_type = row
      .get("value_type")
      .and_then(Value::as_str)
      .unwrap_or_default();
    match value_type {
      "text" => Ok(Self::Text(
        row.get("value_text").and_then(Value::as_str).map(String::from),
      )),
      "number" => Ok(Self::Number(row.get("value_number").and_then(Value::as_f64))),
      "boolean" => Ok(Self::Bool(row.get("value_boolean").and_then(Value::as_bool))),
      "date" => Ok(Self::Date(
        row.get("value_date").and_then(Value::as_str).map(String::from),
      )),
      "json" => Ok(Self::Json(row.get("value_json").cloned().unwrap_or(Value::Null))),
      other => Err(HeraError::UnknownValueType {
        field: row
          .get("field_name")
          .and_then(Value::as_str)
          .unwrap_or("?")
          .to_string(),
        value_type: other.to_string(),
      }),
    }
  }

  /// Collapse to the JSON representation callers see.
  pub fn into_json(self) -> Value {
    match self {
      Self::Text(v) => v.map(Value::String).unwrap_or(Value::Null),
      // Integral values flatten as JSON integers so they round-trip into
      // integer fields (rule priorities, counts).
      Self::Number(v) => v
        .map(|n| {
          if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Value::from(n as i64)
          } else {
            serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
          }
        })
        .unwrap_or(Value::Null),
      Self::Bool(v) => v.map(Value::Bool).unwrap_or(Value::Null),
      Self::Date(v) => v.map(Value::String).unwrap_or(Value::Null),
      Self::Json(v) => v,
    }
  }
}
