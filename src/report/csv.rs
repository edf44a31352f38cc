use serde_json::Value;

/// Minimal CSV emitter over the executed result's own column list.
///
/// Cell values are JSON-escaped (strings keep their quotes, embedded quotes
/// and newlines become escape sequences), so the comma join stays unambiguous
/// without a full CSV quoting pass.
pub fn to_csv(columns: &[String], rows: &[Value]) -> String {
  let mut out = columns.join(",");
  for row in rows {
    let cells: Vec<String> = columns
      .iter()
      .map(|col| match row.get(col) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => serde_json::to_string(s).unwrap_or_default(),
        Some(other) => other.to_string(),
      })
      .collect();
    out.push('\n');
    out.push_str(&cells.join(","));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn header_follows_column_order_not_row_key_order() {
    let columns = vec!["b".to_string(), "a".to_string()];
    let rows = vec![json!({"a": 1, "b": 2})];
    assert_eq!(to_csv(&columns, &rows), "b,a\n2,1");
  }

  #[test]
  fn strings_are_json_escaped() {
    let columns = vec!["name".to_string()];
    let rows = vec![json!({"name": "say \"hi\", twice\n"})];
    assert_eq!(to_csv(&columns, &rows), "name\n\"say \\\"hi\\\", twice\\n\"");
  }

  #[test]
  fn nulls_and_missing_are_empty_cells() {
    let columns = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let rows = vec![json!({"a": null, "c": 3})];
    assert_eq!(to_csv(&columns, &rows), "a,b,c\n,,3");
  }
}
