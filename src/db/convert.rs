//! Conversion between JSON values and Postgres wire types.
//!
//! Caller parameters arrive as `serde_json::Value`. The statement is prepared
//! first so the server infers each parameter's type from its position in the
//! SQL; each JSON value is then encoded to that inferred type. This keeps the
//! compiled SQL free of casts while still using the binary protocol.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::HeraError;

pub type BoundParam = Box<dyn ToSql + Sync + Send>;

fn bind_err(value: &Value, ty: &Type) -> HeraError {
  HeraError::ParamBind(format!("cannot bind {} as {}", value, ty))
}

/// Encode one JSON parameter to the Postgres type the prepared statement expects.
pub fn bind_param(value: &Value, ty: &Type) -> Result<BoundParam, HeraError> {
  match *ty {
    Type::BOOL => match value {
      Value::Null => Ok(Box::new(None::<bool>)),
      Value::Bool(b) => Ok(Box::new(*b)),
      _ => Err(bind_err(value, ty)),
    },
    Type::INT2 => int_param(value, ty).map(|n| Box::new(n.map(|v| v as i16)) as BoundParam),
    Type::INT4 => int_param(value, ty).map(|n| Box::new(n.map(|v| v as i32)) as BoundParam),
    Type::INT8 => int_param(value, ty).map(|n| Box::new(n) as BoundParam),
    Type::FLOAT4 => float_param(value, ty).map(|n| Box::new(n.map(|v| v as f32)) as BoundParam),
    Type::FLOAT8 => float_param(value, ty).map(|n| Box::new(n) as BoundParam),
    Type::NUMERIC => match value {
      Value::Null => Ok(Box::new(None::<Decimal>)),
      Value::Number(n) => Decimal::from_str(&n.to_string())
        .map(|d| Box::new(d) as BoundParam)
        .map_err(|_| bind_err(value, ty)),
      Value::String(s) => Decimal::from_str(s)
        .map(|d| Box::new(d) as BoundParam)
        .map_err(|_| bind_err(value, ty)),
      _ => Err(bind_err(value, ty)),
    },
    Type::UUID => match value {
      Value::Null => Ok(Box::new(None::<Uuid>)),
      Value::String(s) => Uuid::parse_str(s)
        .map(|u| Box::new(u) as BoundParam)
        .map_err(|_| bind_err(value, ty)),
      _ => Err(bind_err(value, ty)),
    },
    Type::DATE => match value {
      Value::Null => Ok(Box::new(None::<NaiveDate>)),
      Value::String(s) => parse_date(s)
        .map(|d| Box::new(d) as BoundParam)
        .ok_or_else(|| bind_err(value, ty)),
      _ => Err(bind_err(value, ty)),
    },
    Type::TIMESTAMP => match value {
      Value::Null => Ok(Box::new(None::<NaiveDateTime>)),
      Value::String(s) => parse_timestamp(s)
        .map(|t| Box::new(t.naive_utc()) as BoundParam)
        .ok_or_else(|| bind_err(value, ty)),
      _ => Err(bind_err(value, ty)),
    },
    Type::TIMESTAMPTZ => match value {
      Value::Null => Ok(Box::new(None::<DateTime<Utc>>)),
      Value::String(s) => parse_timestamp(s)
        .map(|t| Box::new(t) as BoundParam)
        .ok_or_else(|| bind_err(value, ty)),
      _ => Err(bind_err(value, ty)),
    },
    Type::JSON | Type::JSONB => Ok(Box::new(value.clone())),
    // TEXT, VARCHAR, BPCHAR, NAME and anything else textual: stringify scalars
    _ => match value {
      Value::Null => Ok(Box::new(None::<String>)),
      Value::String(s) => Ok(Box::new(s.clone())),
      Value::Number(n) => Ok(Box::new(n.to_string())),
      Value::Bool(b) => Ok(Box::new(b.to_string())),
      _ => Err(bind_err(value, ty)),
    },
  }
}

fn int_param(value: &Value, ty: &Type) -> Result<Option<i64>, HeraError> {
  match value {
    Value::Null => Ok(None),
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .map(Some)
      .ok_or_else(|| bind_err(value, ty)),
    Value::String(s) => s.parse::<i64>().map(Some).map_err(|_| bind_err(value, ty)),
    _ => Err(bind_err(value, ty)),
  }
}

fn float_param(value: &Value, ty: &Type) -> Result<Option<f64>, HeraError> {
  match value {
    Value::Null => Ok(None),
    Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| bind_err(value, ty)),
    Value::String(s) => s.parse::<f64>().map(Some).map_err(|_| bind_err(value, ty)),
    _ => Err(bind_err(value, ty)),
  }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
    return Some(dt.and_utc());
  }
  parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc())
}

/// Decode one row column to JSON, by the column's declared type.
fn column_to_json(row: &Row, idx: usize, ty: &Type) -> Result<Value, HeraError> {
  let value = match *ty {
    Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
    Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::from(v as i64)),
    Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::from(v as i64)),
    Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::from),
    Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(|v| Value::from(v as f64)),
    Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::from),
    Type::NUMERIC => row.try_get::<_, Option<Decimal>>(idx)?.map(|d| {
      // Render as a JSON number when it fits, else as a string (no precision loss)
      d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
    }),
    Type::UUID => row
      .try_get::<_, Option<Uuid>>(idx)?
      .map(|u| Value::String(u.to_string())),
    Type::DATE => row
      .try_get::<_, Option<NaiveDate>>(idx)?
      .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
    Type::TIMESTAMP => row
      .try_get::<_, Option<NaiveDateTime>>(idx)?
      .map(|t| Value::String(t.and_utc().to_rfc3339())),
    Type::TIMESTAMPTZ => row
      .try_get::<_, Option<DateTime<Utc>>>(idx)?
      .map(|t| Value::String(t.to_rfc3339())),
    Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx)?,
    Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => row
      .try_get::<_, Option<Vec<String>>>(idx)?
      .map(|v| Value::Array(v.into_iter().map(Value::String).collect())),
    _ => row.try_get::<_, Option<String>>(idx)?.map(Value::String),
  };
  Ok(value.unwrap_or(Value::Null))
}

/// Convert result rows to JSON objects, preserving the statement's column order.
pub fn rows_to_json(rows: &[Row]) -> Result<Vec<Value>, HeraError> {
  let mut out = Vec::with_capacity(rows.len());
  for row in rows {
    let mut obj = serde_json::Map::with_capacity(row.columns().len());
    for (idx, col) in row.columns().iter().enumerate() {
      obj.insert(col.name().to_string(), column_to_json(row, idx, col.type_())?);
    }
    out.push(Value::Object(obj));
  }
  Ok(out)
}
