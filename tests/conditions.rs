//! End-to-end rule resolution: condition evaluation, priority ordering,
//! default fallback, and preview impact grading.

use hera_mcp::rules::{classify_impact, evaluate, preview, resolve, Condition, Impact, Rule};
use serde_json::{json, Map, Value};

fn ctx(v: Value) -> Map<String, Value> {
  v.as_object().unwrap().clone()
}

fn rules(v: Value) -> Vec<Rule> {
  serde_json::from_value(v).unwrap()
}

#[test]
fn test_pricing_rules_resolve_per_industry() {
  let r = rules(json!([
    {"rule_type": "default", "priority": 0, "config_value": {"slot_minutes": 30}},
    {
      "rule_type": "conditional",
      "priority": 100,
      "conditions": {"operator": "equals", "field": "industry", "value": "restaurant"},
      "config_value": {"slot_minutes": 90}
    },
    {
      "rule_type": "conditional",
      "priority": 50,
      "conditions": {"operator": "in", "field": "industry", "value": ["salon", "spa"]},
      "config_value": {"slot_minutes": 45}
    }
  ]));

  assert_eq!(
    resolve(&r, &ctx(json!({"industry": "restaurant"}))),
    Some(&json!({"slot_minutes": 90}))
  );
  assert_eq!(
    resolve(&r, &ctx(json!({"industry": "spa"}))),
    Some(&json!({"slot_minutes": 45}))
  );
  assert_eq!(
    resolve(&r, &ctx(json!({"industry": "logistics"}))),
    Some(&json!({"slot_minutes": 30}))
  );
}

#[test]
fn test_nested_and_or_conditions() {
  let c: Condition = serde_json::from_value(json!({
    "operator": "and",
    "conditions": [
      {"operator": "greater_than_or_equal", "field": "party_size", "value": 6},
      {"operator": "or", "conditions": [
        {"operator": "equals", "field": "day", "value": "saturday"},
        {"operator": "equals", "field": "day", "value": "sunday"}
      ]}
    ]
  }))
  .unwrap();

  assert!(evaluate(
    Some(&c),
    &ctx(json!({"party_size": 8, "day": "sunday"}))
  ));
  assert!(!evaluate(
    Some(&c),
    &ctx(json!({"party_size": 8, "day": "tuesday"}))
  ));
  assert!(!evaluate(
    Some(&c),
    &ctx(json!({"party_size": 2, "day": "sunday"}))
  ));
}

#[test]
fn test_numeric_coercion_follows_loose_equality() {
  let c: Condition =
    serde_json::from_value(json!({"operator": "equals", "field": "count", "value": "10"})).unwrap();
  assert!(evaluate(Some(&c), &ctx(json!({"count": 10}))));
  assert!(evaluate(Some(&c), &ctx(json!({"count": "10"}))));
  assert!(!evaluate(Some(&c), &ctx(json!({"count": 11}))));
}

#[test]
fn test_in_non_array_false_not_in_non_array_true() {
  let is_in: Condition =
    serde_json::from_value(json!({"operator": "in", "field": "x", "value": 42})).unwrap();
  let not_in: Condition =
    serde_json::from_value(json!({"operator": "not_in", "field": "x", "value": 42})).unwrap();
  let context = ctx(json!({"x": 42}));
  assert!(!evaluate(Some(&is_in), &context));
  assert!(evaluate(Some(&not_in), &context));
}

#[test]
fn test_preview_reports_matched_rule_and_impact() {
  let candidate = rules(json!([
    {"rule_type": "default", "priority": 0, "config_value": 100},
    {
      "rule_type": "override",
      "priority": 200,
      "conditions": {"operator": "equals", "field": "tier", "value": "vip"},
      "config_value": 250
    }
  ]));
  let current = rules(json!([
    {"rule_type": "default", "priority": 0, "config_value": 100}
  ]));
  let contexts = vec![ctx(json!({"tier": "vip"})), ctx(json!({"tier": "standard"}))];

  let out = preview("loyalty.points_multiplier", &candidate, &contexts, Some(&current));
  assert_eq!(out.exit_code, 0);
  assert_eq!(out.results.len(), 2);

  let vip = &out.results[0];
  assert_eq!(vip.resolved_value, json!(250));
  assert_eq!(vip.current_value, Some(json!(100)));
  assert_eq!(vip.changed_from_current, Some(true));
  assert_eq!(vip.impact, Some(Impact::High));
  assert_eq!(vip.matched_rule.as_ref().unwrap().priority, 200);

  let standard = &out.results[1];
  assert_eq!(standard.resolved_value, json!(100));
  assert_eq!(standard.changed_from_current, Some(false));
  assert_eq!(standard.impact, Some(Impact::None));
}

#[test]
fn test_impact_thresholds() {
  // > 50% relative change
  assert_eq!(classify_impact(&json!(16), &json!(10)), Impact::High);
  // > 10%
  assert_eq!(classify_impact(&json!(11.2), &json!(10)), Impact::Medium);
  // <= 10%
  assert_eq!(classify_impact(&json!(10.9), &json!(10)), Impact::Low);
  // any change away from zero
  assert_eq!(classify_impact(&json!(0.01), &json!(0)), Impact::High);
  // negative current uses magnitude
  assert_eq!(classify_impact(&json!(-20), &json!(-10)), Impact::High);
}

#[test]
fn test_preview_without_current_rules_omits_diff_fields() {
  let candidate = rules(json!([
    {"rule_type": "default", "priority": 0, "config_value": "x"}
  ]));
  let out = preview("k", &candidate, &[Map::new()], None);
  let r = &out.results[0];
  assert_eq!(r.resolved_value, json!("x"));
  assert!(r.current_value.is_none());
  assert!(r.changed_from_current.is_none());
  assert!(r.impact.is_none());
}
