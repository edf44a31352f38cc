use crate::error::HeraError;

/// Organization id resolved from server-trusted configuration.
///
/// This is the tenant-isolation root of trust: every query binds it as the
/// first positional parameter. It can only be constructed from the environment
/// resolver (or an explicit config value the operator controls), never from
/// caller-supplied request params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedOrgId(String);

impl TrustedOrgId {
  /// Resolve from `HERA_ORG_ID`, falling back to `DEFAULT_ORGANIZATION_ID`.
  pub fn from_env() -> Result<Self, HeraError> {
    for var in ["HERA_ORG_ID", "DEFAULT_ORGANIZATION_ID"] {
      if let Ok(v) = std::env::var(var) {
        let v = v.trim().to_string();
        if !v.is_empty() {
          return Ok(Self(v));
        }
      }
    }
    Err(HeraError::OrgContextMissing)
  }

  /// Construct from an operator-supplied config value (config file or CLI
  /// flag). Still server-side input, never request input.
  pub fn from_config(value: &str) -> Result<Self, HeraError> {
    let v = value.trim();
    if v.is_empty() {
      return Err(HeraError::OrgContextMissing);
    }
    Ok(Self(v.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  #[cfg(test)]
  pub fn for_tests(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl std::fmt::Display for TrustedOrgId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}
