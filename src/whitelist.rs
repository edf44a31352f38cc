//! Static per-table whitelist of selectable columns and filter operators.
//!
//! This registry is the single authorization boundary between caller-supplied
//! strings and generated SQL. Adding a table or column is an explicit edit
//! here; the underlying schema is never introspected at runtime.

use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Filter operators a whitelist rule may permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterOp {
  Eq,
  In,
  Like,
  Gte,
  Lte,
  Between,
  IsNull,
}

impl FilterOp {
  /// Parse the operator key used in caller filter objects.
  pub fn parse(key: &str) -> Option<Self> {
    match key {
      "eq" => Some(Self::Eq),
      "in" => Some(Self::In),
      "like" => Some(Self::Like),
      "gte" => Some(Self::Gte),
      "lte" => Some(Self::Lte),
      "between" => Some(Self::Between),
      "is_null" => Some(Self::IsNull),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Eq => "eq",
      Self::In => "in",
      Self::Like => "like",
      Self::Gte => "gte",
      Self::Lte => "lte",
      Self::Between => "between",
      Self::IsNull => "is_null",
    }
  }
}

/// One logical filter key: the column it targets and the operators allowed on it.
#[derive(Debug, Clone)]
pub struct FilterRule {
  pub target_column: &'static str,
  pub allowed_ops: &'static [FilterOp],
}

/// Whitelist for a single table.
#[derive(Debug, Clone)]
pub struct TableWhitelist {
  pub table: &'static str,
  pub allowed_columns: &'static [&'static str],
  pub filter_rules: BTreeMap<&'static str, FilterRule>,
}

impl TableWhitelist {
  pub fn allows_column(&self, column: &str) -> bool {
    column == "*" || self.allowed_columns.contains(&column)
  }

  /// Filter keys exposed in response metadata so callers can see what was
  /// silently dropped.
  pub fn filter_keys(&self) -> Vec<&'static str> {
    self.filter_rules.keys().copied().collect()
  }
}

/// Registry over the five universal tables.
#[derive(Debug)]
pub struct TableRegistry {
  tables: BTreeMap<&'static str, TableWhitelist>,
}

impl TableRegistry {
  pub fn lookup(&self, table: &str) -> Option<&TableWhitelist> {
    self.tables.get(table)
  }

  pub fn table_names(&self) -> Vec<&'static str> {
    self.tables.keys().copied().collect()
  }
}

use FilterOp::*;

const ID_OPS: &[FilterOp] = &[Eq, In];
const TEXT_OPS: &[FilterOp] = &[Eq, In, Like];
const RANGE_OPS: &[FilterOp] = &[Eq, Gte, Lte, Between];
const NULLABLE_ID_OPS: &[FilterOp] = &[Eq, In, IsNull];

fn rule(column: &'static str, ops: &'static [FilterOp]) -> FilterRule {
  FilterRule {
    target_column: column,
    allowed_ops: ops,
  }
}

fn build_registry() -> TableRegistry {
  let mut tables = BTreeMap::new();

  tables.insert(
    "core_entities",
    TableWhitelist {
      table: "core_entities",
      allowed_columns: &[
        "id",
        "organization_id",
        "entity_type",
        "entity_name",
        "entity_code",
        "smart_code",
        "status",
        "description",
        "parent_entity_id",
        "tags",
        "metadata",
        "business_rules",
        "created_at",
        "updated_at",
      ],
      filter_rules: BTreeMap::from([
        ("id", rule("id", ID_OPS)),
        ("entity_type", rule("entity_type", TEXT_OPS)),
        ("entity_name", rule("entity_name", TEXT_OPS)),
        ("entity_code", rule("entity_code", TEXT_OPS)),
        ("smart_code", rule("smart_code", TEXT_OPS)),
        ("status", rule("status", TEXT_OPS)),
        ("parent_entity_id", rule("parent_entity_id", NULLABLE_ID_OPS)),
        ("created_at", rule("created_at", RANGE_OPS)),
        ("updated_at", rule("updated_at", RANGE_OPS)),
      ]),
    },
  );

  tables.insert(
    "core_relationships",
    TableWhitelist {
      table: "core_relationships",
      allowed_columns: &[
        "id",
        "organization_id",
        "from_entity_id",
        "to_entity_id",
        "relationship_type",
        "smart_code",
        "relationship_data",
        "is_active",
        "created_at",
        "updated_at",
      ],
      filter_rules: BTreeMap::from([
        ("id", rule("id", ID_OPS)),
        ("from_entity_id", rule("from_entity_id", ID_OPS)),
        ("to_entity_id", rule("to_entity_id", ID_OPS)),
        ("relationship_type", rule("relationship_type", TEXT_OPS)),
        ("smart_code", rule("smart_code", TEXT_OPS)),
        ("is_active", rule("is_active", &[Eq])),
        ("created_at", rule("created_at", RANGE_OPS)),
      ]),
    },
  );

  tables.insert(
    "core_dynamic_data",
    TableWhitelist {
      table: "core_dynamic_data",
      allowed_columns: &[
        "id",
        "organization_id",
        "entity_id",
        "field_name",
        "value_type",
        "value_text",
        "value_number",
        "value_boolean",
        "value_date",
        "value_json",
        "smart_code",
        "created_at",
        "updated_at",
      ],
      filter_rules: BTreeMap::from([
        ("id", rule("id", ID_OPS)),
        ("entity_id", rule("entity_id", ID_OPS)),
        ("field_name", rule("field_name", TEXT_OPS)),
        ("value_type", rule("value_type", &[Eq, In])),
        ("smart_code", rule("smart_code", TEXT_OPS)),
        ("value_number", rule("value_number", RANGE_OPS)),
        ("created_at", rule("created_at", RANGE_OPS)),
      ]),
    },
  );

  tables.insert(
    "universal_transactions",
    TableWhitelist {
      table: "universal_transactions",
      allowed_columns: &[
        "id",
        "organization_id",
        "transaction_type",
        "transaction_code",
        "transaction_date",
        "source_entity_id",
        "target_entity_id",
        "total_amount",
        "transaction_currency_code",
        "status",
        "smart_code",
        "metadata",
        "created_at",
        "updated_at",
      ],
      filter_rules: BTreeMap::from([
        ("id", rule("id", ID_OPS)),
        ("transaction_type", rule("transaction_type", TEXT_OPS)),
        ("transaction_code", rule("transaction_code", TEXT_OPS)),
        ("transaction_date", rule("transaction_date", RANGE_OPS)),
        ("source_entity_id", rule("source_entity_id", NULLABLE_ID_OPS)),
        ("target_entity_id", rule("target_entity_id", NULLABLE_ID_OPS)),
        ("total_amount", rule("total_amount", RANGE_OPS)),
        (
          "currency",
          rule("transaction_currency_code", &[Eq, In]),
        ),
        ("status", rule("status", TEXT_OPS)),
        ("smart_code", rule("smart_code", TEXT_OPS)),
        ("created_at", rule("created_at", RANGE_OPS)),
      ]),
    },
  );

  tables.insert(
    "universal_transaction_lines",
    TableWhitelist {
      table: "universal_transaction_lines",
      allowed_columns: &[
        "id",
        "organization_id",
        "transaction_id",
        "line_number",
        "line_type",
        "entity_id",
        "description",
        "quantity",
        "unit_amount",
        "line_amount",
        "smart_code",
        "line_data",
        "created_at",
        "updated_at",
      ],
      filter_rules: BTreeMap::from([
        ("id", rule("id", ID_OPS)),
        ("transaction_id", rule("transaction_id", ID_OPS)),
        ("line_type", rule("line_type", TEXT_OPS)),
        ("entity_id", rule("entity_id", NULLABLE_ID_OPS)),
        ("smart_code", rule("smart_code", TEXT_OPS)),
        ("quantity", rule("quantity", RANGE_OPS)),
        ("line_amount", rule("line_amount", RANGE_OPS)),
        ("created_at", rule("created_at", RANGE_OPS)),
      ]),
    },
  );

  TableRegistry { tables }
}

/// Process-wide registry, built once.
pub fn registry() -> &'static TableRegistry {
  static REGISTRY: OnceLock<TableRegistry> = OnceLock::new();
  REGISTRY.get_or_init(build_registry)
}
