//! Boolean-condition DSL evaluated against a JSON context.
//!
//! Conditions are best-effort, never failure-fatal: an absent condition is an
//! unconditional match, and any malformed shape evaluates to false instead of
//! propagating an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
  Equals,
  And,
  Or,
  GreaterThan,
  LessThan,
  GreaterThanOrEqual,
  LessThanOrEqual,
  In,
  NotIn,
  Contains,
  StartsWith,
  EndsWith,
}

/// Recursive tagged condition node. `and`/`or` carry `conditions`; leaves
/// compare `context[field]` against `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
  pub operator: ConditionOp,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub conditions: Option<Vec<Condition>>,
}

/// Evaluate a condition against a context. Absent condition is always true.
pub fn evaluate(condition: Option<&Condition>, context: &Map<String, Value>) -> bool {
  let Some(cond) = condition else {
    return true;
  };
  match cond.operator {
    ConditionOp::And => match &cond.conditions {
      Some(children) => children.iter().all(|c| evaluate(Some(c), context)),
      None => false,
    },
    ConditionOp::Or => match &cond.conditions {
      Some(children) => children.iter().any(|c| evaluate(Some(c), context)),
      None => false,
    },
    leaf => evaluate_leaf(leaf, cond, context),
  }
}

fn evaluate_leaf(op: ConditionOp, cond: &Condition, context: &Map<String, Value>) -> bool {
  let Some(field) = &cond.field else {
    return false;
  };
  let actual = context.get(field);
  let expected = cond.value.as_ref();

  match op {
    ConditionOp::Equals => match (actual, expected) {
      (Some(a), Some(e)) => json_equals(a, e),
      (None, Some(Value::Null)) | (None, None) => true,
      _ => false,
    },
    ConditionOp::GreaterThan => numeric_cmp(actual, expected, |a, e| a > e),
    ConditionOp::LessThan => numeric_cmp(actual, expected, |a, e| a < e),
    ConditionOp::GreaterThanOrEqual => numeric_cmp(actual, expected, |a, e| a >= e),
    ConditionOp::LessThanOrEqual => numeric_cmp(actual, expected, |a, e| a <= e),
    // in requires an array value; a non-array set is "not a member".
    // not_in is its strict negation, so a non-array evaluates true.
    ConditionOp::In => match expected {
      Some(Value::Array(set)) => actual.is_some_and(|a| set.iter().any(|e| json_equals(a, e))),
      _ => false,
    },
    ConditionOp::NotIn => match expected {
      Some(Value::Array(set)) => !actual.is_some_and(|a| set.iter().any(|e| json_equals(a, e))),
      _ => true,
    },
    ConditionOp::Contains => string_cmp(actual, expected, |a, e| a.contains(e)),
    ConditionOp::StartsWith => string_cmp(actual, expected, |a, e| a.starts_with(e)),
    ConditionOp::EndsWith => string_cmp(actual, expected, |a, e| a.ends_with(e)),
    ConditionOp::And | ConditionOp::Or => false,
  }
}

/// Equality with numeric cross-coercion, so "10" equals 10.
fn json_equals(a: &Value, b: &Value) -> bool {
  if a == b {
    return true;
  }
  match (as_number(a), as_number(b)) {
    (Some(x), Some(y)) => x == y,
    _ => false,
  }
}

fn numeric_cmp(
  actual: Option<&Value>,
  expected: Option<&Value>,
  cmp: fn(f64, f64) -> bool,
) -> bool {
  match (actual.and_then(as_number), expected.and_then(as_number)) {
    (Some(a), Some(e)) => cmp(a, e),
    _ => false,
  }
}

fn string_cmp(
  actual: Option<&Value>,
  expected: Option<&Value>,
  cmp: fn(&str, &str) -> bool,
) -> bool {
  match (actual.map(as_string), expected.map(as_string)) {
    (Some(a), Some(e)) => cmp(&a, &e),
    _ => false,
  }
}

/// Coerce a JSON value to a number: strings parse, booleans are 0/1. This is
/// what makes "10" > "9" compare numerically, not lexicographically.
fn as_number(v: &Value) -> Option<f64> {
  match v {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
    _ => None,
  }
}

fn as_string(v: &Value) -> String {
  match v {
    Value::String(s) => s.clone(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    _ => String::new(),
  }
}
