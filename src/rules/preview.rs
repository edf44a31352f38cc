//! Configuration-rule preview: test candidate rule sets against sample
//! contexts before promoting them, optionally diffing against the rules
//! currently stored for the organization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::context::TrustedOrgId;
use crate::db::Db;
use crate::embed::DynamicValue;
use crate::error::HeraError;

use super::resolver::{resolve_with_rule, Rule, RuleType};

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewParams {
  pub config_key: String,
  pub test_rules: Vec<Rule>,
  pub test_contexts: Vec<Map<String, Value>>,
  /// When true, current rules are loaded from storage and diffed against.
  #[serde(default)]
  pub compare_current: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
  High,
  Medium,
  Low,
  None,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedRule {
  pub rule_type: RuleType,
  pub priority: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextResult {
  pub context: Map<String, Value>,
  pub resolved_value: Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub matched_rule: Option<MatchedRule>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub current_value: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub changed_from_current: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub impact: Option<Impact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
  pub exit_code: i32,
  pub config_key: String,
  pub results: Vec<ContextResult>,
}

/// Classify the magnitude of a configuration change.
///
/// Numeric deltas grade by relative magnitude (a change from zero is always
/// high); boolean flips are high; any other structural inequality is medium.
pub fn classify_impact(candidate: &Value, current: &Value) -> Impact {
  if let (Some(new), Some(old)) = (candidate.as_f64(), current.as_f64()) {
    let delta = (new - old).abs();
    if delta == 0.0 {
      return Impact::None;
    }
    if old == 0.0 {
      return Impact::High;
    }
    let ratio = delta / old.abs();
    return if ratio > 0.5 {
      Impact::High
    } else if ratio > 0.1 {
      Impact::Medium
    } else {
      Impact::Low
    };
  }
  if let (Value::Bool(new), Value::Bool(old)) = (candidate, current) {
    return if new != old { Impact::High } else { Impact::None };
  }
  if candidate == current {
    Impact::None
  } else {
    Impact::Medium
  }
}

/// Run every test context through the candidate rules, and through the
/// current rules when provided, producing per-context diff and impact.
pub fn preview(
  config_key: &str,
  test_rules: &[Rule],
  contexts: &[Map<String, Value>],
  current_rules: Option<&[Rule]>,
) -> PreviewResponse {
  let results = contexts
    .iter()
    .map(|context| {
      let matched = resolve_with_rule(test_rules, context);
      let resolved_value = matched.map(|(_, v)| v.clone()).unwrap_or(Value::Null);
      let matched_rule = matched.map(|(r, _)| MatchedRule {
        rule_type: r.rule_type,
        priority: r.priority,
      });

      let (current_value, changed_from_current, impact) = match current_rules {
        Some(current) => {
          let current_value = resolve_with_rule(current, context)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null);
          let impact = classify_impact(&resolved_value, &current_value);
          (
            Some(current_value),
            Some(impact != Impact::None),
            Some(impact),
          )
        }
        None => (None, None, None),
      };

      ContextResult {
        context: context.clone(),
        resolved_value,
        matched_rule,
        current_value,
        changed_from_current,
        impact,
      }
    })
    .collect();

  PreviewResponse {
    exit_code: 0,
    config_key: config_key.to_string(),
    results,
  }
}

/// Materialize rules from `core_dynamic_data` rows of config-rule entities.
///
/// Each rule entity carries its fields as typed dynamic rows (`rule_type`,
/// `priority`, `conditions`, `config_value`, `config_key`); this is the same
/// flattening step the entity embed uses.
pub fn rules_from_dynamic_rows(rows: &[Value]) -> Result<Vec<Rule>, HeraError> {
  let mut by_entity: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
  for row in rows {
    let Some(entity_id) = row.get("entity_id").and_then(Value::as_str) else {
      continue;
    };
    let Some(field) = row.get("field_name").and_then(Value::as_str) else {
      continue;
    };
    let flat = DynamicValue::from_row(row)?.into_json();
    by_entity
      .entry(entity_id.to_string())
      .or_default()
      .insert(field.to_string(), flat);
  }

  let mut rules = Vec::with_capacity(by_entity.len());
  for (_, fields) in by_entity {
    let rule: Rule = serde_json::from_value(Value::Object(fields))
      .map_err(|e| HeraError::Db(anyhow::anyhow!("malformed stored rule: {}", e)))?;
    rules.push(rule);
  }
  Ok(rules)
}

/// Load the organization's stored rules for one config key.
pub async fn fetch_current_rules(
  db: &Db,
  org: &TrustedOrgId,
  config_key: &str,
) -> Result<Vec<Rule>, HeraError> {
  let sql = "SELECT d.entity_id, d.field_name, d.value_type, d.value_text, \
             d.value_number, d.value_boolean, d.value_date, d.value_json \
             FROM core_dynamic_data d \
             JOIN core_entities e ON e.id = d.entity_id \
               AND e.organization_id = d.organization_id \
             WHERE d.organization_id = $1 \
               AND e.entity_type = 'config_rule' \
               AND e.entity_code = $2 \
               AND e.status = 'active'";
  let params = vec![
    Value::String(org.as_str().to_string()),
    Value::String(config_key.to_string()),
  ];
  let output = db.query_json(sql, &params).await?;
  rules_from_dynamic_rows(&output.rows)
}

/// Full preview flow for the tool surface: optionally fetches current rules
/// before delegating to the pure preview.
pub async fn run_preview(
  db: &Db,
  org: &TrustedOrgId,
  params: &PreviewParams,
) -> Result<PreviewResponse, HeraError> {
  let current = if params.compare_current {
    Some(fetch_current_rules(db, org, &params.config_key).await?)
  } else {
    None
  };
  Ok(preview(
    &params.config_key,
    &params.test_rules,
    &params.test_contexts,
    current.as_deref(),
  ))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn numeric_impact_grades_by_relative_delta() {
    assert_eq!(classify_impact(&json!(20), &json!(10)), Impact::High);
    assert_eq!(classify_impact(&json!(11.5), &json!(10)), Impact::Medium);
    assert_eq!(classify_impact(&json!(10.5), &json!(10)), Impact::Low);
    assert_eq!(classify_impact(&json!(10), &json!(10)), Impact::None);
    assert_eq!(classify_impact(&json!(5), &json!(0)), Impact::High);
  }

  #[test]
  fn boolean_flip_is_high() {
    assert_eq!(classify_impact(&json!(true), &json!(false)), Impact::High);
    assert_eq!(classify_impact(&json!(true), &json!(true)), Impact::None);
  }

  #[test]
  fn structural_change_is_medium() {
    assert_eq!(
      classify_impact(&json!({"a": 1}), &json!({"a": 2})),
      Impact::Medium
    );
    assert_eq!(classify_impact(&json!("x"), &json!("x")), Impact::None);
  }

  #[test]
  fn preview_diffs_against_current() {
    let test_rules: Vec<Rule> = serde_json::from_value(json!([
      {"rule_type": "default", "priority": 0, "config_value": 30}
    ]))
    .unwrap();
    let current: Vec<Rule> = serde_json::from_value(json!([
      {"rule_type": "default", "priority": 0, "config_value": 15}
    ]))
    .unwrap();
    let contexts = vec![Map::new()];

    let out = preview("booking.slot_minutes", &test_rules, &contexts, Some(&current));
    let r = &out.results[0];
    assert_eq!(r.resolved_value, json!(30));
    assert_eq!(r.current_value, Some(json!(15)));
    assert_eq!(r.changed_from_current, Some(true));
    assert_eq!(r.impact, Some(Impact::High));
  }

  #[test]
  fn materializes_rules_from_dynamic_rows() {
    let rows = vec![
      json!({"entity_id": "e1", "field_name": "rule_type", "value_type": "text", "value_text": "default"}),
      json!({"entity_id": "e1", "field_name": "priority", "value_type": "number", "value_number": 0}),
      json!({"entity_id": "e1", "field_name": "config_value", "value_type": "json", "value_json": 15}),
      json!({"entity_id": "e2", "field_name": "rule_type", "value_type": "text", "value_text": "conditional"}),
      json!({"entity_id": "e2", "field_name": "priority", "value_type": "number", "value_number": 100}),
      json!({"entity_id": "e2", "field_name": "config_value", "value_type": "json", "value_json": 45}),
      json!({"entity_id": "e2", "field_name": "conditions", "value_type": "json",
             "value_json": {"operator": "equals", "field": "industry", "value": "salon"}}),
    ];
    let rules = rules_from_dynamic_rows(&rows).unwrap();
    assert_eq!(rules.len(), 2);

    let ctx: Map<String, Value> = json!({"industry": "salon"}).as_object().unwrap().clone();
    assert_eq!(super::super::resolver::resolve(&rules, &ctx), Some(&json!(45)));
  }
}
