use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::condition::{evaluate, Condition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
  Default,
  #[default]
  Conditional,
  Override,
}

/// One candidate configuration rule. Rules for the same `config_key` compete
/// by priority; the `default`-typed rule is the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
  #[serde(default)]
  pub config_key: Option<String>,
  #[serde(default)]
  pub rule_type: RuleType,
  #[serde(default)]
  pub priority: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub conditions: Option<Condition>,
  pub config_value: Value,
}

/// Resolve one configuration value from a candidate rule set.
///
/// Stable sort by priority descending (equal priorities keep input order),
/// first matching rule wins; if nothing matches, the `default` rule's value;
/// if no default exists, `None`.
pub fn resolve<'a>(rules: &'a [Rule], context: &Map<String, Value>) -> Option<&'a Value> {
  resolve_with_rule(rules, context).map(|(_, v)| v)
}

/// Like [`resolve`] but also reports which rule produced the value.
pub fn resolve_with_rule<'a>(
  rules: &'a [Rule],
  context: &Map<String, Value>,
) -> Option<(&'a Rule, &'a Value)> {
  let mut ordered: Vec<&Rule> = rules.iter().collect();
  ordered.sort_by_key(|r| std::cmp::Reverse(r.priority));

  for rule in &ordered {
    if evaluate(rule.conditions.as_ref(), context) {
      return Some((rule, &rule.config_value));
    }
  }
  rules
    .iter()
    .find(|r| r.rule_type == RuleType::Default)
    .map(|r| (r, &r.config_value))
}
