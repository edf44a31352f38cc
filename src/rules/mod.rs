mod condition;
mod preview;
mod resolver;

pub use condition::{evaluate, Condition, ConditionOp};
pub use preview::{
  classify_impact, fetch_current_rules, preview, rules_from_dynamic_rows, run_preview,
  ContextResult, Impact, PreviewParams, PreviewResponse,
};
pub use resolver::{resolve, resolve_with_rule, Rule, RuleType};
