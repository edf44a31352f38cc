use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use serde_json::Value;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use super::convert::{bind_param, rows_to_json, BoundParam};
use crate::error::HeraError;

/// Default statement timeout; a runaway query surfaces as an error, not a hang.
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 3000;

pub const DEFAULT_MAX_CONNECTIONS: usize = 20;

/// Result of one executed statement: rows as JSON objects plus the column
/// list in statement order (needed for CSV emission).
#[derive(Debug, Clone)]
pub struct QueryOutput {
  pub columns: Vec<String>,
  pub rows: Vec<Value>,
}

/// Pooled, read-only query surface over Postgres.
///
/// Every call acquires a scoped connection from the pool; the connection is
/// released on drop on every exit path. A per-call statement timeout bounds
/// execution.
pub struct Db {
  pool: Pool,
  statement_timeout_ms: u64,
}

impl Db {
  pub fn connect(url: &str, max_connections: usize) -> Result<Self, anyhow::Error> {
    let mut cfg = Config::new();
    cfg.url = Some(url.into());
    cfg.pool = Some(PoolConfig::new(max_connections));
    cfg.manager = Some(ManagerConfig {
      recycling_method: RecyclingMethod::Fast,
    });
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(Self {
      pool,
      statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
    })
  }

  /// Connect using the `DATABASE_URL` environment contract.
  pub fn from_env() -> Result<Self, anyhow::Error> {
    let url = std::env::var("DATABASE_URL")
      .map_err(|_| anyhow::anyhow!("DATABASE_URL is required for database tools"))?;
    Self::connect(&url, DEFAULT_MAX_CONNECTIONS)
  }

  pub fn with_statement_timeout(mut self, ms: u64) -> Self {
    self.statement_timeout_ms = ms;
    self
  }

  /// Prepare and execute one statement with JSON parameters.
  ///
  /// The statement is prepared first so parameter types are inferred by the
  /// server; each JSON param is then encoded to its inferred type. The
  /// parameter count must match the statement exactly.
  pub async fn query_json(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, HeraError> {
    let conn = self
      .pool
      .get()
      .await
      .map_err(|e| HeraError::Db(e.into()))?;

    conn
      .batch_execute(&format!("SET statement_timeout = {}", self.statement_timeout_ms))
      .await?;

    let stmt = conn.prepare(sql).await?;
    let expected = stmt.params().len();
    if expected != params.len() {
      return Err(HeraError::ParamBind(format!(
        "statement expects {} parameters, got {}",
        expected,
        params.len()
      )));
    }

    let bound: Vec<BoundParam> = params
      .iter()
      .zip(stmt.params())
      .map(|(value, ty)| bind_param(value, ty))
      .collect::<Result<_, _>>()?;
    let refs: Vec<&(dyn ToSql + Sync)> =
      bound.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect();

    let rows = conn.query(&stmt, &refs).await?;
    tracing::debug!(sql, rows = rows.len(), "query executed");

    Ok(QueryOutput {
      columns: stmt.columns().iter().map(|c| c.name().to_string()).collect(),
      rows: rows_to_json(&rows)?,
    })
  }
}
