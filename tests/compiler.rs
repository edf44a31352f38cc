use hera_mcp::context::TrustedOrgId;
use hera_mcp::query::{build_select, DEFAULT_LIMIT, MAX_LIMIT};
use hera_mcp::types::SelectParams;
use serde_json::json;

fn org() -> TrustedOrgId {
  TrustedOrgId::from_config("11111111-2222-3333-4444-555555555555").unwrap()
}

fn params(value: serde_json::Value) -> SelectParams {
  serde_json::from_value(value).unwrap()
}

#[test]
fn test_org_scope_is_always_first_param() {
  let compiled = build_select(
    &params(json!({"table": "core_entities", "filters": {"entity_type": "customer"}})),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.contains("organization_id = $1"));
  assert_eq!(
    compiled.params[0],
    json!("11111111-2222-3333-4444-555555555555")
  );
  assert_eq!(compiled.params[1], json!("customer"));
}

#[test]
fn test_unknown_table_is_rejected() {
  let err = build_select(&params(json!({"table": "pg_catalog.pg_tables"})), &org()).unwrap_err();
  assert!(err.to_string().contains("pg_catalog.pg_tables"));
}

#[test]
fn test_non_whitelisted_columns_are_dropped() {
  let compiled = build_select(
    &params(json!({
      "table": "core_entities",
      "columns": ["id", "entity_name", "password_hash"]
    })),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.starts_with("SELECT id, entity_name FROM core_entities"));
  assert!(!compiled.sql.contains("password_hash"));
}

#[test]
fn test_all_columns_dropped_is_an_error_not_select_star() {
  let result = build_select(
    &params(json!({"table": "core_entities", "columns": ["password_hash", "secret"]})),
    &org(),
  );
  assert!(result.is_err());
}

#[test]
fn test_omitted_columns_defaults_to_star() {
  let compiled = build_select(&params(json!({"table": "core_entities"})), &org()).unwrap();
  assert!(compiled.sql.starts_with("SELECT * FROM core_entities"));
}

#[test]
fn test_unknown_filter_keys_are_silently_dropped() {
  let compiled = build_select(
    &params(json!({
      "table": "core_entities",
      "filters": {"entity_type": "customer", "no_such_column": "x"}
    })),
    &org(),
  )
  .unwrap();
  assert!(!compiled.sql.contains("no_such_column"));
  assert_eq!(compiled.params.len(), 2); // org + entity_type
  // The whitelist echo tells the caller which keys were in play
  assert!(compiled.allowed_filters.contains(&"entity_type".to_string()));
}

#[test]
fn test_disallowed_operator_for_column_is_dropped() {
  // entity_type allows eq/in/like but not gte
  let compiled = build_select(
    &params(json!({
      "table": "core_entities",
      "filters": {"entity_type": {"gte": "customer"}}
    })),
    &org(),
  )
  .unwrap();
  assert_eq!(compiled.params.len(), 1);
  assert!(!compiled.sql.contains(">="));
}

#[test]
fn test_filter_key_maps_to_target_column() {
  let compiled = build_select(
    &params(json!({
      "table": "universal_transactions",
      "filters": {"currency": "AED"}
    })),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.contains("transaction_currency_code = $2"));
  assert!(!compiled.sql.contains("currency ="));
}

#[test]
fn test_in_operator_expands_placeholders() {
  let compiled = build_select(
    &params(json!({
      "table": "core_entities",
      "filters": {"entity_type": {"in": ["customer", "vendor", "staff"]}}
    })),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.contains("entity_type IN ($2, $3, $4)"));
  assert_eq!(compiled.params.len(), 4);
}

#[test]
fn test_empty_in_matches_nothing() {
  let compiled = build_select(
    &params(json!({
      "table": "core_entities",
      "filters": {"entity_type": {"in": []}}
    })),
    &org(),
  )
  .unwrap();
  // Must not degenerate into "no filter at all"
  assert!(compiled.sql.contains("false"));
  assert_eq!(compiled.params.len(), 1);
}

#[test]
fn test_between_requires_exactly_two_values() {
  let compiled = build_select(
    &params(json!({
      "table": "universal_transactions",
      "filters": {"total_amount": {"between": [100, 500]}}
    })),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.contains("total_amount BETWEEN $2 AND $3"));

  let compiled = build_select(
    &params(json!({
      "table": "universal_transactions",
      "filters": {"total_amount": {"between": [100]}}
    })),
    &org(),
  )
  .unwrap();
  assert!(!compiled.sql.contains("BETWEEN"));
}

#[test]
fn test_order_by_drops_non_whitelisted_columns() {
  let compiled = build_select(
    &params(json!({
      "table": "universal_transactions",
      "order_by": [
        {"column": "transaction_date", "direction": "desc"},
        {"column": "evil; DROP TABLE x", "direction": "asc"}
      ]
    })),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.contains("ORDER BY transaction_date DESC"));
  assert!(!compiled.sql.contains("DROP"));
}

#[test]
fn test_order_direction_defaults_to_asc() {
  let compiled = build_select(
    &params(json!({
      "table": "universal_transactions",
      "order_by": [{"column": "transaction_date", "direction": "sideways"}]
    })),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.contains("ORDER BY transaction_date ASC"));
}

#[test]
fn test_limit_and_offset_clamping() {
  let compiled = build_select(&params(json!({"table": "core_entities"})), &org()).unwrap();
  assert_eq!(compiled.limit, DEFAULT_LIMIT);
  assert_eq!(compiled.offset, 0);

  let compiled = build_select(
    &params(json!({"table": "core_entities", "limit": 999999, "offset": -5})),
    &org(),
  )
  .unwrap();
  assert_eq!(compiled.limit, MAX_LIMIT);
  assert_eq!(compiled.offset, 0);

  let compiled =
    build_select(&params(json!({"table": "core_entities", "limit": 0})), &org()).unwrap();
  assert_eq!(compiled.limit, 1);
}

#[test]
fn test_limit_offset_interpolated_not_bound() {
  let compiled = build_select(
    &params(json!({"table": "core_entities", "limit": 7, "offset": 14})),
    &org(),
  )
  .unwrap();
  assert!(compiled.sql.ends_with("LIMIT 7 OFFSET 14"));
  // Only the org param is bound
  assert_eq!(compiled.params.len(), 1);
}
