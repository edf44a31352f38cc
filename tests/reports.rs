//! Report catalog behavior that doesn't need a live database: the per-call
//! safety gate, parameter binding, and CSV emission.

use hera_mcp::context::TrustedOrgId;
use hera_mcp::db::Db;
use hera_mcp::report::{
  bind_report_params, catalog, is_safe_select, run_report, to_csv, ReportDef, ReportRegistry,
};
use hera_mcp::types::ReportParams;
use serde_json::json;
use std::collections::BTreeMap;

fn org() -> TrustedOrgId {
  TrustedOrgId::from_config("org-under-test").unwrap()
}

// Pool construction is lazy, so a client over an unreachable URL is fine for
// paths that fail before any query runs.
fn offline_db() -> Db {
  Db::connect("postgres://nobody@localhost:1/void", 2).unwrap()
}

#[test]
fn test_builtin_catalog_is_fully_org_scoped() {
  for code in catalog().codes() {
    let def = catalog().lookup(code).unwrap();
    assert!(is_safe_select(&def.sql), "{}", code);
    assert!(def.sql.contains("organization_id = $1"), "{}", code);
  }
}

#[test]
fn test_safety_gate_denylist_is_whole_word() {
  assert!(is_safe_select(
    "SELECT created_at, updated_at FROM core_entities WHERE organization_id = $1"
  ));
  assert!(!is_safe_select(
    "SELECT 1 WHERE organization_id = $1; DELETE FROM core_entities"
  ));
  assert!(!is_safe_select("UPDATE core_entities SET status = 'x'"));
  assert!(!is_safe_select(
    "WITH d AS (SELECT 1) SELECT * FROM d WHERE organization_id = $1"
  ));
}

#[test]
fn test_params_bind_by_declared_name_order() {
  let def = catalog().lookup("HERA.REPORT.SALES.TOP_ITEMS.v1").unwrap();
  let supplied = BTreeMap::from([
    // BTreeMap iterates f < l < t; declared order is from, to, limit
    ("from".to_string(), json!("2024-06-01")),
    ("limit".to_string(), json!(5)),
    ("to".to_string(), json!("2024-07-01")),
  ]);
  let params = bind_report_params(def, &org(), Some(&supplied));
  assert_eq!(
    params,
    vec![
      json!("org-under-test"),
      json!("2024-06-01"),
      json!("2024-07-01"),
      json!(5)
    ]
  );
}

#[test]
fn test_undeclared_supplied_params_are_ignored() {
  let def = catalog().lookup("HERA.REPORT.SALES.DAILY.v1").unwrap();
  let supplied = BTreeMap::from([
    ("from".to_string(), json!("2024-06-01")),
    ("to".to_string(), json!("2024-07-01")),
    ("organization_id".to_string(), json!("someone-else")), // must not bind
  ]);
  let params = bind_report_params(def, &org(), Some(&supplied));
  assert_eq!(params.len(), 3);
  assert_eq!(params[0], json!("org-under-test"));
  assert!(!params.contains(&json!("someone-else")));
}

#[tokio::test]
async fn test_unknown_report_code_fails_before_touching_the_db() {
  let db = offline_db();
  let request: ReportParams =
    serde_json::from_value(json!({"report_code": "HERA.REPORT.NO.SUCH.v1"})).unwrap();
  let err = run_report(&db, &org(), catalog(), &request).await.unwrap_err();
  assert_eq!(err.code(), "REPORT_NOT_FOUND");
}

#[tokio::test]
async fn test_tampered_template_fails_on_next_invocation() {
  // A catalog whose template was mutated after registration must be caught
  // by the per-call gate, not trusted because it was registered once.
  let tainted = ReportRegistry::new(vec![ReportDef {
    code: "HERA.REPORT.SALES.DAILY.v1".into(),
    description: "tampered".into(),
    params: vec![],
    sql: "SELECT 1; DROP TABLE universal_transactions".into(),
  }]);
  let db = offline_db();
  let request: ReportParams =
    serde_json::from_value(json!({"report_code": "HERA.REPORT.SALES.DAILY.v1"})).unwrap();
  let err = run_report(&db, &org(), &tainted, &request).await.unwrap_err();
  assert_eq!(err.code(), "REPORT_UNSAFE_SQL");
}

#[tokio::test]
async fn test_template_without_org_scope_is_rejected() {
  let unscoped = ReportRegistry::new(vec![ReportDef {
    code: "HERA.REPORT.LEAKY.ALL.v1".into(),
    description: "forgot the tenant clause".into(),
    params: vec![],
    sql: "SELECT * FROM universal_transactions".into(),
  }]);
  let db = offline_db();
  let request: ReportParams =
    serde_json::from_value(json!({"report_code": "HERA.REPORT.LEAKY.ALL.v1"})).unwrap();
  let err = run_report(&db, &org(), &unscoped, &request).await.unwrap_err();
  assert_eq!(err.code(), "REPORT_UNSAFE_SQL");
}

#[test]
fn test_csv_uses_result_columns_not_row_keys() {
  let columns = vec!["sales_date".to_string(), "gross_sales".to_string()];
  let rows = vec![
    json!({"gross_sales": 1200.5, "sales_date": "2024-06-01"}),
    json!({"gross_sales": null, "sales_date": "2024-06-02"}),
  ];
  assert_eq!(
    to_csv(&columns, &rows),
    "sales_date,gross_sales\n\"2024-06-01\",1200.5\n\"2024-06-02\","
  );
}

#[test]
fn test_csv_escapes_embedded_quotes_and_commas() {
  let columns = vec!["entity_name".to_string()];
  let rows = vec![json!({"entity_name": "Bob's \"Cuts\", LLC"})];
  let out = to_csv(&columns, &rows);
  assert_eq!(out, "entity_name\n\"Bob's \\\"Cuts\\\", LLC\"");
}

#[test]
fn test_report_codes_use_the_short_catalog_style() {
  // Catalog codes are five segments (HERA.REPORT.<AREA>.<NAME>.vN), one
  // below the loose data dialect's six-segment floor. They are catalog
  // keys, not data-layer smart codes, and must stay out of that dialect.
  for code in catalog().codes() {
    assert!(code.starts_with("HERA.REPORT."), "{}", code);
    assert_eq!(code.split('.').count(), 5, "{}", code);
    assert!(
      !hera_mcp::smartcode::validate_data_code(code).is_valid,
      "{}",
      code
    );
  }
}

#[test]
fn test_report_format_defaults_to_json() {
  let request: ReportParams =
    serde_json::from_value(json!({"report_code": "HERA.REPORT.SALES.DAILY.v1"})).unwrap();
  assert!(request.format.is_none());
  assert_eq!(
    request.format.unwrap_or_default(),
    hera_mcp::types::ReportFormat::Json
  );
}
