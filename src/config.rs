use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::context::TrustedOrgId;
use crate::db::{DEFAULT_MAX_CONNECTIONS, DEFAULT_STATEMENT_TIMEOUT_MS};
use crate::error::HeraError;

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax.
fn expand_env_vars(input: &str) -> String {
  let mut result = input.to_string();

  // Handle ${VAR_NAME} syntax first (more specific)
  while let Some(start) = result.find("${") {
    if let Some(end) = result[start..].find('}') {
      let var_name = &result[start + 2..start + end];
      let value = std::env::var(var_name).unwrap_or_default();
      result = format!(
        "{}{}{}",
        &result[..start],
        value,
        &result[start + end + 1..]
      );
    } else {
      break;
    }
  }

  // Handle $VAR_NAME syntax (word boundary: alphanumeric + underscore)
  let mut i = 0;
  while i < result.len() {
    if result[i..].starts_with('$') && !result[i..].starts_with("${") {
      let rest = &result[i + 1..];
      let var_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count();
      if var_len > 0 {
        let var_name = &rest[..var_len];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..i], value, &rest[var_len..]);
        i += value.len();
        continue;
      }
    }
    i += 1;
  }

  result
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraConfig {
  #[serde(default)]
  pub database: DatabaseSection,
  #[serde(default)]
  pub organization: OrganizationSection,
  #[serde(default)]
  pub limits: LimitsSection,
  #[serde(default)]
  pub logging: LoggingSection,
  #[serde(default)]
  pub mcp: McpSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
  /// Connection string; empty means "take DATABASE_URL from the environment".
  #[serde(default)]
  pub url: String,
  #[serde(default = "default_max_conn")]
  pub max_connections: usize,
}
fn default_max_conn() -> usize {
  DEFAULT_MAX_CONNECTIONS
}
impl Default for DatabaseSection {
  fn default() -> Self {
    Self {
      url: String::new(),
      max_connections: default_max_conn(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationSection {
  /// Organization scope; empty means "take HERA_ORG_ID / DEFAULT_ORGANIZATION_ID".
  #[serde(default)]
  pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
  /// Statement timeout in milliseconds; exceeding it fails the call.
  #[serde(default = "default_statement_timeout_ms")]
  pub statement_timeout_ms: u64,
}
fn default_statement_timeout_ms() -> u64 {
  DEFAULT_STATEMENT_TIMEOUT_MS
}
impl Default for LimitsSection {
  fn default() -> Self {
    Self {
      statement_timeout_ms: default_statement_timeout_ms(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}
fn default_level() -> String {
  "info".into()
}
impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpSection {
  /// Bind address for the streamable-HTTP transport.
  #[serde(default = "default_mcp_addr")]
  pub http_addr: String,
}
fn default_mcp_addr() -> String {
  "127.0.0.1:8790".into()
}
impl Default for McpSection {
  fn default() -> Self {
    Self {
      http_addr: default_mcp_addr(),
    }
  }
}

impl HeraConfig {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
    let content = std::fs::read_to_string(&path)?;
    let expanded = expand_env_vars(&content);
    Ok(serde_yaml::from_str(&expanded)?)
  }

  pub fn find_and_load() -> Result<Option<Self>, anyhow::Error> {
    for p in ["hera.yaml", "hera.yml"] {
      if Path::new(p).exists() {
        tracing::info!("Loading config from {}", p);
        return Ok(Some(Self::from_file(p)?));
      }
    }
    Ok(None)
  }

  /// Resolve the trusted organization scope: config value first, then the
  /// environment contract.
  pub fn resolve_org(&self) -> Result<TrustedOrgId, HeraError> {
    if !self.organization.id.trim().is_empty() {
      return TrustedOrgId::from_config(&self.organization.id);
    }
    TrustedOrgId::from_env()
  }

  /// Resolve the database URL: config value first, then `DATABASE_URL`.
  pub fn resolve_database_url(&self) -> Result<String, anyhow::Error> {
    if !self.database.url.trim().is_empty() {
      return Ok(self.database.url.clone());
    }
    std::env::var("DATABASE_URL")
      .map_err(|_| anyhow::anyhow!("DATABASE_URL is required when database.url is not configured"))
  }
}
