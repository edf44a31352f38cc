//! Smart codes: versioned, dot-delimited classification strings attached to
//! entities, transactions, and reports.
//!
//! Two dialects coexist and are deliberately not unified. The loose `Data`
//! dialect (any `v<digits>` version) covers data-layer codes written across
//! several versioning eras; the strict `Domain` dialect accepts only `v2` and
//! enforces per-domain structure. The split is a migration boundary, not an
//! accident.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// The two smart-code dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeFormat {
  /// Loose data-layer dialect: `HERA.<SEG>{4,9}.v<digits>`.
  Data,
  /// Strict domain dialect: v2 only, per-domain segment rules.
  Domain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeError {
  EmptyCode,
  MissingHeraPrefix,
  InvalidVersionSuffix,
  TooFewSegments,
  InvalidSegment,
  MissingConfigSegment,
  UnknownDomain,
  PatternMismatch,
}

impl CodeError {
  pub fn code(&self) -> &'static str {
    match self {
      Self::EmptyCode => "EMPTY_CODE",
      Self::MissingHeraPrefix => "MISSING_HERA_PREFIX",
      Self::InvalidVersionSuffix => "INVALID_VERSION_SUFFIX",
      Self::TooFewSegments => "TOO_FEW_SEGMENTS",
      Self::InvalidSegment => "INVALID_SEGMENT",
      Self::MissingConfigSegment => "MISSING_CONFIG_SEGMENT",
      Self::UnknownDomain => "UNKNOWN_DOMAIN",
      Self::PatternMismatch => "PATTERN_MISMATCH",
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Validation {
  pub is_valid: bool,
  pub dialect: CodeFormat,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub domain: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<CodeError>,
  pub segments: Vec<String>,
}

impl Validation {
  fn invalid(dialect: CodeFormat, error: CodeError, segments: Vec<String>) -> Self {
    Self {
      is_valid: false,
      dialect,
      domain: None,
      error: Some(error),
      segments,
    }
  }
}

fn data_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^HERA\.[A-Z0-9_]{3,30}(?:\.[A-Z0-9_]{2,40}){3,8}\.v[0-9]+$")
      .expect("static regex")
  })
}

/// Validate against the loose data-layer dialect.
pub fn validate_data_code(code: &str) -> Validation {
  let segments: Vec<String> = code.split('.').map(String::from).collect();
  if code.is_empty() {
    return Validation::invalid(CodeFormat::Data, CodeError::EmptyCode, segments);
  }
  if data_pattern().is_match(code) {
    Validation {
      is_valid: true,
      dialect: CodeFormat::Data,
      domain: segments.get(1).cloned(),
      error: None,
      segments,
    }
  } else {
    Validation::invalid(CodeFormat::Data, CodeError::PatternMismatch, segments)
  }
}

/// Segment charset for the strict dialect: uppercase alnum/underscore,
/// starting with a letter.
fn is_strict_segment(segment: &str) -> bool {
  let mut chars = segment.chars();
  match chars.next() {
    Some(c) if c.is_ascii_uppercase() => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Validate against the strict domain dialect (v2-only, PLATFORM/ACCOUNTING).
pub fn validate_domain_code(code: &str) -> Validation {
  let dialect = CodeFormat::Domain;
  if code.trim().is_empty() {
    return Validation::invalid(dialect, CodeError::EmptyCode, vec![]);
  }
  let segments: Vec<String> = code.split('.').map(String::from).collect();

  if segments.first().map(String::as_str) != Some("HERA") {
    return Validation::invalid(dialect, CodeError::MissingHeraPrefix, segments);
  }
  if segments.last().map(String::as_str) != Some("v2") {
    return Validation::invalid(dialect, CodeError::InvalidVersionSuffix, segments);
  }

  let domain = segments.get(1).cloned().unwrap_or_default();
  let (min_segments, requires_config) = match domain.as_str() {
    "PLATFORM" => (6, true),
    "ACCOUNTING" => (5, false),
    _ => {
      return Validation::invalid(dialect, CodeError::UnknownDomain, segments);
    }
  };

  if segments.len() < min_segments {
    return Validation::invalid(dialect, CodeError::TooFewSegments, segments);
  }
  if requires_config && segments.get(2).map(String::as_str) != Some("CONFIG") {
    return Validation::invalid(dialect, CodeError::MissingConfigSegment, segments);
  }
  // Middle segments (between HERA and the version) carry the strict charset.
  for segment in &segments[1..segments.len() - 1] {
    if !is_strict_segment(segment) {
      return Validation::invalid(dialect, CodeError::InvalidSegment, segments);
    }
  }

  Validation {
    is_valid: true,
    dialect,
    domain: Some(domain),
    error: None,
    segments,
  }
}

/// What a generated code is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
  Create,
  Validate,
  Load,
}

/// Intent to classify; the generator maps this deterministically to a code.
#[derive(Debug, Clone, Default)]
pub struct CodeIntent {
  pub entity_type: String,
  pub industry: Option<String>,
  pub operation: Option<OperationType>,
  pub data_type: Option<String>,
}

/// Normalize an arbitrary label to a strict code segment.
fn segmentize(label: &str) -> String {
  let mut out = String::with_capacity(label.len());
  for c in label.chars() {
    if c.is_ascii_alphanumeric() {
      out.push(c.to_ascii_uppercase());
    } else if !out.ends_with('_') && !out.is_empty() {
      out.push('_');
    }
  }
  let trimmed = out.trim_matches('_').to_string();
  if trimmed.is_empty() || !trimmed.starts_with(|c: char| c.is_ascii_uppercase()) {
    format!("X{}", trimmed)
  } else {
    trimmed
  }
}

/// Deterministically build the canonical platform-config code for an intent.
/// Every generated code validates under the strict domain dialect.
pub fn generate(intent: &CodeIntent) -> String {
  match intent.operation {
    Some(OperationType::Validate) => "HERA.PLATFORM.CONFIG.VALIDATION.SCHEMA.v2".to_string(),
    Some(OperationType::Load) => {
      let subject = intent
        .data_type
        .as_deref()
        .unwrap_or(&intent.entity_type);
      format!("HERA.PLATFORM.CONFIG.LOAD.{}.v2", segmentize(subject))
    }
    Some(OperationType::Create) => {
      format!("HERA.PLATFORM.CONFIG.ENTITY.{}.v2", segmentize(&intent.entity_type))
    }
    None => match &intent.industry {
      Some(industry) => generate_app_config_code(industry),
      None => format!("HERA.PLATFORM.CONFIG.ENTITY.{}.v2", segmentize(&intent.entity_type)),
    },
  }
}

/// Canonical code for an industry's app configuration.
pub fn generate_app_config_code(industry: &str) -> String {
  format!("HERA.PLATFORM.CONFIG.APP.{}.v2", segmentize(industry))
}
