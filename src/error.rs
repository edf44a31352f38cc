use thiserror::Error;

/// Error taxonomy for the data-tool surface.
///
/// Each variant carries a stable machine-readable code (see [`HeraError::code`])
/// that callers match on; the display message is for humans and logs.
#[derive(Debug, Error)]
pub enum HeraError {
  /// No trusted organization scope could be resolved from server configuration.
  #[error("ORG_CONTEXT_MISSING: no organization id in server configuration (set HERA_ORG_ID or DEFAULT_ORGANIZATION_ID)")]
  OrgContextMissing,

  /// Caller requested a table that is not in the whitelist registry.
  #[error("TABLE_NOT_ALLOWED: table '{0}' is not whitelisted")]
  TableNotAllowed(String),

  /// Every requested column was rejected by the whitelist.
  #[error("NO_VALID_COLUMNS: none of the requested columns are whitelisted for '{0}'")]
  NoValidColumns(String),

  /// Report code is not in the catalog.
  #[error("REPORT_NOT_FOUND: unknown report code '{0}'")]
  ReportNotFound(String),

  /// A catalog template failed the per-call safety gate.
  #[error("REPORT_UNSAFE_SQL: report '{0}' failed the SQL safety check")]
  ReportUnsafeSql(String),

  /// A dynamic-data row carried a value_type outside the closed set.
  #[error("UNKNOWN_VALUE_TYPE: dynamic field '{field}' has unrecognized value_type '{value_type}'")]
  UnknownValueType { field: String, value_type: String },

  /// A caller-supplied parameter could not be bound to the statement's type.
  #[error("PARAM_BIND: {0}")]
  ParamBind(String),

  /// Anything thrown by the underlying store (network, timeout, constraint).
  #[error("database error: {0}")]
  Db(#[from] anyhow::Error),
}

impl HeraError {
  /// Stable code for the error envelope.
  pub fn code(&self) -> &'static str {
    match self {
      Self::OrgContextMissing => "ORG_CONTEXT_MISSING",
      Self::TableNotAllowed(_) => "TABLE_NOT_ALLOWED",
      Self::NoValidColumns(_) => "NO_VALID_COLUMNS",
      Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
      Self::ReportUnsafeSql(_) => "REPORT_UNSAFE_SQL",
      Self::UnknownValueType { .. } => "UNKNOWN_VALUE_TYPE",
      Self::ParamBind(_) => "PARAM_BIND",
      Self::Db(_) => "DB_ERROR",
    }
  }
}

impl From<tokio_postgres::Error> for HeraError {
  fn from(e: tokio_postgres::Error) -> Self {
    Self::Db(e.into())
  }
}
