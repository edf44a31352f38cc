//! Fixed catalog of named, parameterized, read-only report templates.
//!
//! Every template is a single idempotent SELECT with `organization_id = $1`
//! and a declared ordered parameter contract. The safety gate runs on every
//! execution, not just at registration: a corrupted catalog entry fails its
//! next invocation.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// One catalog entry. Fields are owned strings so tests can build candidate
/// registries without static data.
#[derive(Debug, Clone)]
pub struct ReportDef {
  /// Versioned catalog key, `HERA.REPORT.<AREA>.<NAME>.vN`.
  pub code: String,
  pub description: String,
  pub sql: String,
  /// Parameter names in binding order; caller values are matched by name.
  pub params: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReportRegistry {
  reports: BTreeMap<String, ReportDef>,
}

impl ReportRegistry {
  pub fn new(defs: Vec<ReportDef>) -> Self {
    Self {
      reports: defs.into_iter().map(|d| (d.code.clone(), d)).collect(),
    }
  }

  pub fn lookup(&self, code: &str) -> Option<&ReportDef> {
    self.reports.get(code)
  }

  pub fn codes(&self) -> Vec<&str> {
    self.reports.keys().map(String::as_str).collect()
  }

  /// The five shipped reports.
  pub fn builtin() -> Self {
    Self::new(vec![
      ReportDef {
        code: "HERA.REPORT.SALES.DAILY.v1".into(),
        description: "Daily sales totals by currency".into(),
        params: vec!["from".into(), "to".into()],
        sql: "SELECT t.transaction_date::date AS sales_date, \
              t.transaction_currency_code AS currency, \
              COUNT(*) AS txn_count, \
              SUM(t.total_amount) AS gross_sales \
              FROM universal_transactions t \
              WHERE t.organization_id = $1 \
              AND t.transaction_type = 'SALE' \
              AND t.status <> 'cancelled' \
              AND t.transaction_date >= $2 AND t.transaction_date < $3 \
              GROUP BY 1, 2 ORDER BY 1, 2"
          .into(),
      },
      ReportDef {
        code: "HERA.REPORT.SALES.BY_STAFF.v1".into(),
        description: "Revenue by worker (worker_id embedded in line data)".into(),
        params: vec!["from".into(), "to".into()],
        sql: "SELECT l.line_data->>'worker_id' AS worker_id, \
              COUNT(DISTINCT t.id) AS txn_count, \
              SUM(l.line_amount) AS revenue \
              FROM universal_transaction_lines l \
              JOIN universal_transactions t ON t.id = l.transaction_id \
              AND t.organization_id = l.organization_id \
              WHERE l.organization_id = $1 \
              AND t.transaction_type = 'SALE' \
              AND t.transaction_date >= $2 AND t.transaction_date < $3 \
              AND l.line_data->>'worker_id' IS NOT NULL \
              GROUP BY 1 ORDER BY revenue DESC"
          .into(),
      },
      ReportDef {
        code: "HERA.REPORT.AR.AGING.v1".into(),
        description: "Open receivables bucketed by days past due".into(),
        params: vec!["as_of".into()],
        sql: "SELECT CASE \
              WHEN $2::date - COALESCE((t.metadata->>'due_date')::date, t.transaction_date::date) <= 0 THEN 'current' \
              WHEN $2::date - COALESCE((t.metadata->>'due_date')::date, t.transaction_date::date) <= 30 THEN '1-30' \
              WHEN $2::date - COALESCE((t.metadata->>'due_date')::date, t.transaction_date::date) <= 60 THEN '31-60' \
              WHEN $2::date - COALESCE((t.metadata->>'due_date')::date, t.transaction_date::date) <= 90 THEN '61-90' \
              ELSE '90+' END AS bucket, \
              COUNT(*) AS invoice_count, \
              SUM(t.total_amount) AS outstanding \
              FROM universal_transactions t \
              WHERE t.organization_id = $1 \
              AND t.transaction_type = 'AR_INVOICE' \
              AND t.status = 'open' \
              GROUP BY 1 ORDER BY 1"
          .into(),
      },
      ReportDef {
        code: "HERA.REPORT.INVENTORY.ON_HAND.v1".into(),
        description: "On-hand quantity per item from signed movements".into(),
        params: vec![],
        sql: "SELECT l.entity_id AS item_id, \
              SUM(CASE \
              WHEN t.transaction_type IN ('GOODS_RECEIPT', 'STOCK_ADJUST_IN') THEN l.quantity \
              WHEN t.transaction_type IN ('SALE', 'STOCK_ADJUST_OUT') THEN -l.quantity \
              ELSE 0 END) AS on_hand \
              FROM universal_transaction_lines l \
              JOIN universal_transactions t ON t.id = l.transaction_id \
              AND t.organization_id = l.organization_id \
              WHERE l.organization_id = $1 \
              AND l.entity_id IS NOT NULL \
              GROUP BY 1 ORDER BY 1"
          .into(),
      },
      ReportDef {
        code: "HERA.REPORT.SALES.TOP_ITEMS.v1".into(),
        description: "Top items by revenue".into(),
        params: vec!["from".into(), "to".into(), "limit".into()],
        sql: "SELECT l.entity_id AS item_id, \
              SUM(l.quantity) AS units, \
              SUM(l.line_amount) AS revenue \
              FROM universal_transaction_lines l \
              JOIN universal_transactions t ON t.id = l.transaction_id \
              AND t.organization_id = l.organization_id \
              WHERE l.organization_id = $1 \
              AND t.transaction_type = 'SALE' \
              AND t.transaction_date >= $2 AND t.transaction_date < $3 \
              AND l.entity_id IS NOT NULL \
              GROUP BY 1 ORDER BY revenue DESC LIMIT $4"
          .into(),
      },
    ])
  }
}

/// Process-wide builtin catalog.
pub fn catalog() -> &'static ReportRegistry {
  static CATALOG: OnceLock<ReportRegistry> = OnceLock::new();
  CATALOG.get_or_init(ReportRegistry::builtin)
}

/// SQL safety gate: must read as a single SELECT and must not contain a
/// mutating keyword as a whole word. A denylist, deliberately backed up by
/// running through a read-only database role in production.
pub fn is_safe_select(sql: &str) -> bool {
  static DENY: OnceLock<Regex> = OnceLock::new();
  let deny = DENY.get_or_init(|| {
    Regex::new(r"(?i)\b(insert|update|delete|drop|alter|create)\b").expect("static regex")
  });
  let trimmed = sql.trim();
  trimmed.to_lowercase().starts_with("select") && !deny.is_match(trimmed)
}
